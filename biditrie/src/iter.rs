//! Depth-first iteration over one trie's stored right sides.
//!
//! The walk accumulates segment bytes in a scratch buffer, pushing a
//! `(cell, scratch length)` resume point whenever a cell has an OR
//! sibling, and emits the accumulated bytes each time it crosses a
//! boundary cell. Left tries are not descended; each distinct stored
//! right side comes out exactly once.

use crate::container::{
    BidiTrieContainer, BCELL_EXTRA_MAX, BCELL_NEXT_AND, CELL_AND, CELL_OR, SEGMENT_INFO,
};

/// Iterator over the decoded right sides stored in one trie.
pub struct PatternIter<'a> {
    ctr: &'a BidiTrieContainer,
    icell: u32,
    forks: Vec<(u32, usize)>,
    scratch: Vec<u8>,
}

impl<'a> PatternIter<'a> {
    pub(crate) fn new(ctr: &'a BidiTrieContainer, iroot: u32) -> Self {
        // A root whose segment word is still zero holds nothing.
        let icell = if ctr.word(iroot + SEGMENT_INFO) == 0 {
            0
        } else {
            iroot
        };
        Self {
            ctr,
            icell,
            forks: Vec::new(),
            scratch: Vec::with_capacity(256),
        }
    }
}

impl Iterator for PatternIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if self.icell == 0 {
                let (icell, mark) = self.forks.pop()?;
                self.scratch.truncate(mark);
                self.icell = icell;
            }
            let v = self.ctr.word(self.icell + SEGMENT_INFO);
            if v <= BCELL_EXTRA_MAX {
                // Boundary: one complete right side is in the scratch.
                self.icell = self.ctr.word(self.icell + BCELL_NEXT_AND);
                return Some(String::from_utf8_lossy(&self.scratch).into_owned());
            }
            let ior = self.ctr.word(self.icell + CELL_OR);
            if ior != 0 {
                self.forks.push((ior, self.scratch.len()));
            }
            let at = self.ctr.char0() + (v & 0x00FF_FFFF) as usize;
            let len = (v >> 24) as usize;
            self.scratch.extend_from_slice(&self.ctr.buf[at..at + len]);
            self.icell = self.ctr.word(self.icell + CELL_AND);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::BidiTrieOptions;

    fn build(patterns: &[&[u8]]) -> (BidiTrieContainer, u32) {
        let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
        let iroot = ctr.create_trie();
        for p in patterns {
            let offset = ctr.store_string(p);
            let b = ctr.add(iroot, offset, p.len() as u32, 0);
            ctr.set_extra(b, 1);
        }
        (ctr, iroot)
    }

    fn collect_sorted(ctr: &BidiTrieContainer, iroot: u32) -> Vec<String> {
        let mut out: Vec<String> = PatternIter::new(ctr, iroot).collect();
        out.sort();
        out
    }

    #[test]
    fn test_empty_trie_yields_nothing() {
        let (ctr, iroot) = build(&[]);
        assert_eq!(PatternIter::new(&ctr, iroot).count(), 0);
    }

    #[test]
    fn test_roundtrip_with_splits_and_forks() {
        let (ctr, iroot) = build(&[b"ab", b"abcd", b"abxy", b"abc"]);
        assert_eq!(
            collect_sorted(&ctr, iroot),
            vec!["ab", "abc", "abcd", "abxy"]
        );
    }

    #[test]
    fn test_distinct_heads() {
        let (ctr, iroot) = build(&[b"alpha", b"beta", b"gamma"]);
        assert_eq!(collect_sorted(&ctr, iroot), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_duplicate_insert_yields_once() {
        let (ctr, iroot) = build(&[b"dup", b"dup"]);
        assert_eq!(collect_sorted(&ctr, iroot), vec!["dup"]);
    }

    #[test]
    fn test_left_parts_do_not_leak_into_iteration() {
        let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
        let iroot = ctr.create_trie();
        let offset = ctr.store_string(b"prefix_tail");
        let b = ctr.add(iroot, offset, 11, 7);
        ctr.set_extra(b, 1);
        assert_eq!(collect_sorted(&ctr, iroot), vec!["tail"]);
    }
}
