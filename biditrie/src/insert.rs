//! Pattern insertion: split-on-mismatch radix descent in both directions.
//!
//! A pattern is a byte range `[offset, offset + len)` in the character
//! region together with a pivot splitting it into a right part (walked
//! forward through the right trie) and a left part (walked backward through
//! the left trie hanging off the right part's boundary cell). Insertion
//! shares existing segments as long as bytes agree, splits a segment at the
//! first disagreement, and ends by splicing in a boundary cell that the
//! caller annotates through `set_extra`.

use crate::container::{
    BidiTrieContainer, BCELL_ALT_AND, BCELL_EXTRA, BCELL_EXTRA_MAX, BCELL_NEXT_AND, CELL_AND,
    CELL_OR, MIN_FREE_CELL_BYTE_LENGTH, SEGMENT_INFO,
};

impl BidiTrieContainer {
    /// Insert the pattern stored at `[offset, offset + len)` (offsets
    /// relative to the character region) into the trie rooted at `iroot`,
    /// splitting it at `pivot`. Returns the boundary cell to annotate, or 0
    /// when the pattern has no right part.
    pub fn add(&mut self, iroot: u32, offset: u32, len: u32, pivot: u32) -> u32 {
        debug_assert!(pivot <= len);
        if pivot >= len {
            // Matching always consumes at least one right-side byte, so a
            // pattern with an empty right part could never match.
            return 0;
        }
        if self.char0() - self.trie1() < MIN_FREE_CELL_BYTE_LENGTH {
            self.grow_buf(MIN_FREE_CELL_BYTE_LENGTH, 0);
        }
        let char0 = self.char0() as u32;
        let ar = len;
        let mut al = pivot;
        let mut icell = iroot;
        // Empty root: the whole right part becomes the root's segment.
        if self.word(iroot + SEGMENT_INFO) == 0 {
            self.set_word(iroot + SEGMENT_INFO, (ar - al) << 24 | (offset + al));
            return self.add_left(iroot, offset, pivot);
        }
        loop {
            let v = self.word(icell + SEGMENT_INFO);
            if v <= BCELL_EXTRA_MAX {
                // Boundary cell on the way down: pass through its
                // continuation, appending one if the chain ends here.
                let inext = self.word(icell + BCELL_NEXT_AND);
                if inext == 0 {
                    let inew = self.alloc_cell(0, 0, (ar - al) << 24 | (offset + al));
                    self.set_word(icell + BCELL_NEXT_AND, inew);
                    return self.add_left(inew, offset, pivot);
                }
                icell = inext;
                continue;
            }
            let boff = v & 0x00FF_FFFF;
            let blen = v >> 24;
            if self.buf[(char0 + boff) as usize] != self.buf[(char0 + offset + al) as usize] {
                // Head byte disagrees: try the next alternative, or start
                // a new branch with the whole remainder.
                let inext = self.word(icell + CELL_OR);
                if inext == 0 {
                    let inew = self.alloc_cell(0, 0, (ar - al) << 24 | (offset + al));
                    self.set_word(icell + CELL_OR, inew);
                    return self.add_left(inew, offset, pivot);
                }
                icell = inext;
                continue;
            }
            // Head byte agrees: walk both cursors to the first disagreement,
            // the end of the segment, or the end of the pattern.
            let mut bi = 1u32;
            al += 1;
            while bi < blen {
                if al == ar {
                    break;
                }
                if self.buf[(char0 + boff + bi) as usize]
                    != self.buf[(char0 + offset + al) as usize]
                {
                    break;
                }
                bi += 1;
                al += 1;
            }
            if bi == blen {
                if al == ar {
                    return self.add_left(icell, offset, pivot);
                }
                // Segment consumed, pattern not: descend.
                icell = self.word(icell + CELL_AND);
                debug_assert!(icell != 0);
                continue;
            }
            // Partial segment match: split. The matched head stays in this
            // cell; the tail moves below it and keeps the old descendants.
            let itail =
                self.alloc_cell(self.word(icell + CELL_AND), 0, (blen - bi) << 24 | (boff + bi));
            self.set_word(icell + CELL_AND, itail);
            self.set_word(icell + SEGMENT_INFO, bi << 24 | boff);
            if al == ar {
                return self.add_left(icell, offset, pivot);
            }
            let irem = self.alloc_cell(0, 0, (ar - al) << 24 | (offset + al));
            self.set_word(itail + CELL_OR, irem);
            return self.add_left(irem, offset, pivot);
        }
    }

    /// Terminate a right-side walk at `icell`: splice in the boundary cell,
    /// then insert the left part `[0, pivot)` in reverse into the trie
    /// hanging off that boundary. Returns the cell the caller annotates.
    fn add_left(&mut self, icell: u32, offset: u32, pivot: u32) -> u32 {
        let iboundary = self.ensure_boundary(icell);
        if pivot == 0 {
            return iboundary;
        }
        // An unconditional accept at the pivot dominates any prefix-
        // qualified pattern below it.
        if self.word(iboundary + BCELL_EXTRA) == 1 {
            return iboundary;
        }
        let char0 = self.char0() as u32;
        let mut ar = pivot;
        let mut icell = self.word(iboundary + BCELL_ALT_AND);
        if icell == 0 {
            let inew = self.alloc_cell(0, 0, pivot << 24 | offset);
            self.set_word(iboundary + BCELL_ALT_AND, inew);
            return self.ensure_boundary(inew);
        }
        loop {
            let v = self.word(icell + SEGMENT_INFO);
            if v <= BCELL_EXTRA_MAX {
                if v == 1 {
                    return icell;
                }
                let inext = self.word(icell + BCELL_NEXT_AND);
                if inext == 0 {
                    let inew = self.alloc_cell(0, 0, ar << 24 | offset);
                    self.set_word(icell + BCELL_NEXT_AND, inew);
                    return self.ensure_boundary(inew);
                }
                icell = inext;
                continue;
            }
            let boff = v & 0x00FF_FFFF;
            let blen = v >> 24;
            // Compare tail-first: the walk consumes the pattern from the
            // pivot leftward.
            if self.buf[(char0 + boff + blen - 1) as usize]
                != self.buf[(char0 + offset + ar - 1) as usize]
            {
                let inext = self.word(icell + CELL_OR);
                if inext == 0 {
                    let inew = self.alloc_cell(0, 0, ar << 24 | offset);
                    self.set_word(icell + CELL_OR, inew);
                    return self.ensure_boundary(inew);
                }
                icell = inext;
                continue;
            }
            let mut bi = 1u32;
            ar -= 1;
            while bi < blen {
                if ar == 0 {
                    break;
                }
                if self.buf[(char0 + boff + blen - 1 - bi) as usize]
                    != self.buf[(char0 + offset + ar - 1) as usize]
                {
                    break;
                }
                bi += 1;
                ar -= 1;
            }
            if bi == blen {
                if ar == 0 {
                    return self.ensure_boundary(icell);
                }
                icell = self.word(icell + CELL_AND);
                debug_assert!(icell != 0);
                continue;
            }
            // Split, mirrored: the matched tail stays in this cell; the
            // head moves below it and keeps the old descendants.
            let head_len = blen - bi;
            let ihead = self.alloc_cell(self.word(icell + CELL_AND), 0, head_len << 24 | boff);
            self.set_word(icell + CELL_AND, ihead);
            self.set_word(icell + SEGMENT_INFO, bi << 24 | (boff + head_len));
            if ar == 0 {
                return self.ensure_boundary(icell);
            }
            let irem = self.alloc_cell(0, 0, ar << 24 | offset);
            self.set_word(ihead + CELL_OR, irem);
            return self.ensure_boundary(irem);
        }
    }

    /// Make sure a boundary cell sits directly on `icell`'s descendant
    /// link, splicing a fresh one in front of any segment cell already
    /// there, and return it.
    fn ensure_boundary(&mut self, icell: u32) -> u32 {
        let inext = self.word(icell + CELL_AND);
        if inext != 0 && self.word(inext + SEGMENT_INFO) <= BCELL_EXTRA_MAX {
            return inext;
        }
        let iboundary = self.alloc_cell(0, 0, 0);
        self.set_word(iboundary + BCELL_NEXT_AND, inext);
        self.set_word(icell + CELL_AND, iboundary);
        iboundary
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use crate::container::{BidiTrieContainer, BidiTrieOptions};

    fn fresh() -> (BidiTrieContainer, u32) {
        let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
        let iroot = ctr.create_trie();
        (ctr, iroot)
    }

    fn add_pattern(ctr: &mut BidiTrieContainer, iroot: u32, pattern: &[u8], pivot: u32) -> u32 {
        let offset = ctr.store_string(pattern);
        ctr.add(iroot, offset, pattern.len() as u32, pivot)
    }

    #[test]
    fn test_first_insert_uses_root() {
        let (mut ctr, iroot) = fresh();
        let iboundary = add_pattern(&mut ctr, iroot, b"ab", 0);
        assert_ne!(iboundary, 0);
        // root + its boundary
        assert_eq!(ctr.cell_count(), 2);
        assert_eq!(ctr.get_extra(iboundary), 0);
    }

    #[test]
    fn test_duplicate_insert_reuses_boundary() {
        let (mut ctr, iroot) = fresh();
        let a = add_pattern(&mut ctr, iroot, b"ab", 0);
        let cells = ctr.cell_count();
        let b = add_pattern(&mut ctr, iroot, b"ab", 0);
        assert_eq!(a, b);
        assert_eq!(ctr.cell_count(), cells);
    }

    #[test]
    fn test_extension_appends_through_boundary() {
        let (mut ctr, iroot) = fresh();
        let a = add_pattern(&mut ctr, iroot, b"ab", 0);
        let b = add_pattern(&mut ctr, iroot, b"abcd", 0);
        assert_ne!(a, b);
        // "ab"'s boundary gained a continuation holding "cd" plus its own
        // boundary: 2 + 2 cells on top of the first insert's 2.
        assert_eq!(ctr.cell_count(), 4);
    }

    #[test]
    fn test_split_on_partial_segment_match() {
        let (mut ctr, iroot) = fresh();
        add_pattern(&mut ctr, iroot, b"ab", 0);
        add_pattern(&mut ctr, iroot, b"abcd", 0);
        let c = add_pattern(&mut ctr, iroot, b"abc", 0);
        assert_ne!(c, 0);
        // split of "cd" into "c" + "d": tail cell + new boundary
        assert_eq!(ctr.cell_count(), 6);
    }

    #[test]
    fn test_sibling_branch_on_head_mismatch() {
        let (mut ctr, iroot) = fresh();
        let a = add_pattern(&mut ctr, iroot, b"abc", 0);
        let b = add_pattern(&mut ctr, iroot, b"xyz", 0);
        assert_ne!(a, b);
        // two segment cells, two boundaries, shared root
        assert_eq!(ctr.cell_count(), 4);
    }

    #[test]
    fn test_empty_right_part_is_rejected() {
        let (mut ctr, iroot) = fresh();
        let offset = ctr.store_string(b"left");
        assert_eq!(ctr.add(iroot, offset, 4, 4), 0);
        assert_eq!(ctr.cell_count(), 1);
    }

    #[test]
    fn test_left_parts_share_right_boundary() {
        let (mut ctr, iroot) = fresh();
        let a = add_pattern(&mut ctr, iroot, b"/google_ad.", 8);
        let b = add_pattern(&mut ctr, iroot, b"/images_ad.", 8);
        // Distinct boundaries inside the left trie, same right side.
        assert_ne!(a, b);
        ctr.set_extra(a, 7);
        ctr.set_extra(b, 9);
        assert_eq!(ctr.get_extra(a), 7);
        assert_eq!(ctr.get_extra(b), 9);
    }

    #[test]
    fn test_match_all_boundary_dominates_left_insert() {
        let (mut ctr, iroot) = fresh();
        let plain = add_pattern(&mut ctr, iroot, b"ad", 0);
        ctr.set_extra(plain, 1);
        let cells = ctr.cell_count();
        // A prefix-qualified pattern with the same right side lands on the
        // dominating boundary and inserts nothing new.
        let qualified = add_pattern(&mut ctr, iroot, b"left_ad", 5);
        assert_eq!(qualified, plain);
        assert_eq!(ctr.cell_count(), cells);
    }
}
