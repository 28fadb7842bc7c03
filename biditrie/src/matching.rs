//! Match walks: does some stored pattern's pivot align at haystack
//! position `i`?
//!
//! The right walk consumes haystack bytes forward from `i`, following OR
//! chains in insertion order and descending through AND links. Every
//! boundary cell reached is a candidate: a right-only terminal is tested
//! first, then the left trie hanging off the boundary, then the walk
//! continues through the boundary's continuation. The first accepted
//! boundary wins; there is no longest-match rule.

use crate::container::{
    BidiTrieContainer, BCELL_ALT_AND, BCELL_EXTRA, BCELL_NEXT_AND, CELL_AND, CELL_OR,
    BCELL_EXTRA_MAX, SEGMENT_INFO,
};

/// A successful match at one pivot position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrieMatch {
    /// Leftmost matched haystack index.
    pub left: u32,
    /// One past the rightmost matched haystack index.
    pub right: u32,
    /// Value returned by the extra handler, or -1 for an unconditional
    /// accept.
    pub handle: i32,
}

impl BidiTrieContainer {
    /// Test the trie rooted at `iroot` against the haystack with the pivot
    /// aligned at position `i`.
    pub fn matches(&self, iroot: u32, i: u32) -> Option<TrieMatch> {
        let char0 = self.char0();
        let ar = self.haystack_len();
        let mut al = i as usize;
        if al >= ar {
            return None;
        }
        let mut icell = iroot;
        loop {
            let c = self.buf[al];
            al += 1;
            // Scan the OR chain for a segment whose head byte is `c`.
            loop {
                let v = self.word(icell + SEGMENT_INFO);
                if v > BCELL_EXTRA_MAX {
                    let mut bi = char0 + (v & 0x00FF_FFFF) as usize;
                    if self.buf[bi] == c {
                        // The rest of the segment must match too.
                        let n = (v >> 24) as usize - 1;
                        if n != 0 {
                            let x = al + n;
                            if x > ar {
                                return None;
                            }
                            loop {
                                bi += 1;
                                if self.buf[bi] != self.buf[al] {
                                    return None;
                                }
                                al += 1;
                                if al == x {
                                    break;
                                }
                            }
                        }
                        break;
                    }
                }
                icell = self.word(icell + CELL_OR);
                if icell == 0 {
                    return None;
                }
            }
            icell = self.word(icell + CELL_AND);
            if icell == 0 {
                return None;
            }
            let v = self.word(icell + BCELL_EXTRA);
            if v <= BCELL_EXTRA_MAX {
                // Boundary cell: right-only terminal first, then the left
                // trie, then carry on down the continuation.
                if v != 0 {
                    if let Some(m) = self.matches_extra(i as usize, al, v) {
                        return Some(m);
                    }
                }
                let ialt = self.word(icell + BCELL_ALT_AND);
                if ialt != 0 {
                    if let Some(m) = self.matches_left(ialt, i as usize, al) {
                        return Some(m);
                    }
                }
                icell = self.word(icell + BCELL_NEXT_AND);
                if icell == 0 {
                    return None;
                }
            }
            if al == ar {
                return None;
            }
        }
    }

    /// Walk a left trie backward from the pivot at `pivot`, reporting
    /// `right` as the right bound of the whole match.
    fn matches_left(&self, mut icell: u32, pivot: usize, right: usize) -> Option<TrieMatch> {
        let char0 = self.char0();
        let mut al = pivot;
        loop {
            if al == 0 {
                return None;
            }
            al -= 1;
            let c = self.buf[al];
            // Scan the OR chain for a segment whose tail byte is `c`.
            loop {
                let v = self.word(icell + SEGMENT_INFO);
                if v > BCELL_EXTRA_MAX {
                    let n = (v >> 24) as usize;
                    let mut bi = char0 + (v & 0x00FF_FFFF) as usize + n - 1;
                    if self.buf[bi] == c {
                        let n = n - 1;
                        if n != 0 {
                            if al < n {
                                return None;
                            }
                            let x = al - n;
                            loop {
                                al -= 1;
                                bi -= 1;
                                if self.buf[bi] != self.buf[al] {
                                    return None;
                                }
                                if al == x {
                                    break;
                                }
                            }
                        }
                        break;
                    }
                }
                icell = self.word(icell + CELL_OR);
                if icell == 0 {
                    return None;
                }
            }
            icell = self.word(icell + CELL_AND);
            if icell == 0 {
                return None;
            }
            let v = self.word(icell + BCELL_EXTRA);
            if v <= BCELL_EXTRA_MAX {
                if v != 0 {
                    if let Some(m) = self.matches_extra(al, right, v) {
                        return Some(m);
                    }
                }
                icell = self.word(icell + BCELL_NEXT_AND);
                if icell == 0 {
                    return None;
                }
            }
        }
    }

    /// Decide acceptance at a terminal boundary spanning `[l, r)`.
    fn matches_extra(&self, l: usize, r: usize, extra: u32) -> Option<TrieMatch> {
        let handle = if extra == 1 {
            -1
        } else {
            let h = match &self.extra_handler {
                Some(handler) => handler(l as u32, r as u32, extra),
                None => 0,
            };
            if h == 0 {
                return None;
            }
            h as i32
        };
        Some(TrieMatch {
            left: l as u32,
            right: r as u32,
            handle,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
