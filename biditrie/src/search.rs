//! Byte-exact substring primitives over the backing buffer.
//!
//! All three operations take absolute haystack bounds `[haystack_left,
//! haystack_right)` and a needle described by `(needle_left, needle_len)`
//! with `needle_left` relative to the character region base. They are used
//! internally and exposed to callers that keep their own needles interned
//! in the same container.
//!
//! Two strategies exist: a portable byte-at-a-time reference and an
//! accelerated one backed by `memchr::memmem`. They are observably
//! identical; the strategy is picked once per container at construction.

use memchr::memmem;

use crate::container::BidiTrieContainer;

/// Implementation selector for the substring primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Plain byte loops. Reads one byte at a time, so it is endian-clean.
    Portable,
    /// `memchr::memmem`-backed scanning.
    Accelerated,
}

impl SearchStrategy {
    /// Pick the strategy for a new container. The accelerated path is only
    /// enabled on little-endian hosts, matching the serialized image's
    /// byte order.
    pub(crate) fn select() -> Self {
        if cfg!(target_endian = "little") {
            SearchStrategy::Accelerated
        } else {
            SearchStrategy::Portable
        }
    }
}

impl BidiTrieContainer {
    /// The strategy this container was built with.
    pub fn search_strategy(&self) -> SearchStrategy {
        self.search
    }

    /// Whether the haystack bytes starting at `haystack_left` equal the
    /// needle, without overrunning `haystack_right`.
    pub fn starts_with(
        &self,
        haystack_left: u32,
        haystack_right: u32,
        needle_left: u32,
        needle_len: u32,
    ) -> bool {
        let hl = haystack_left as usize;
        let nlen = needle_len as usize;
        if hl + nlen > haystack_right as usize {
            return false;
        }
        let nl = self.char0() + needle_left as usize;
        match self.search {
            SearchStrategy::Accelerated => self.buf[hl..hl + nlen] == self.buf[nl..nl + nlen],
            SearchStrategy::Portable => {
                for i in 0..nlen {
                    if self.buf[hl + i] != self.buf[nl + i] {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Leftmost position of the needle within `[haystack_left,
    /// haystack_right)`, as an absolute buffer offset.
    pub fn index_of(
        &self,
        haystack_left: u32,
        haystack_right: u32,
        needle_left: u32,
        needle_len: u32,
    ) -> Option<u32> {
        let hl = haystack_left as usize;
        let hr = haystack_right as usize;
        let nlen = needle_len as usize;
        if nlen == 0 {
            return Some(haystack_left);
        }
        if hl + nlen > hr {
            return None;
        }
        let nl = self.char0() + needle_left as usize;
        match self.search {
            SearchStrategy::Accelerated => {
                memmem::find(&self.buf[hl..hr], &self.buf[nl..nl + nlen])
                    .map(|pos| (hl + pos) as u32)
            }
            SearchStrategy::Portable => {
                for at in hl..=hr - nlen {
                    let mut i = 0;
                    while i < nlen && self.buf[at + i] == self.buf[nl + i] {
                        i += 1;
                    }
                    if i == nlen {
                        return Some(at as u32);
                    }
                }
                None
            }
        }
    }

    /// Rightmost position of the needle within `[haystack_left,
    /// haystack_right)`, as an absolute buffer offset.
    pub fn last_index_of(
        &self,
        haystack_left: u32,
        haystack_right: u32,
        needle_left: u32,
        needle_len: u32,
    ) -> Option<u32> {
        let hl = haystack_left as usize;
        let hr = haystack_right as usize;
        let nlen = needle_len as usize;
        if nlen == 0 {
            return Some(haystack_right);
        }
        if hl + nlen > hr {
            return None;
        }
        let nl = self.char0() + needle_left as usize;
        match self.search {
            SearchStrategy::Accelerated => {
                memmem::rfind(&self.buf[hl..hr], &self.buf[nl..nl + nlen])
                    .map(|pos| (hl + pos) as u32)
            }
            SearchStrategy::Portable => {
                let mut at = hr - nlen;
                loop {
                    let mut i = 0;
                    while i < nlen && self.buf[at + i] == self.buf[nl + i] {
                        i += 1;
                    }
                    if i == nlen {
                        return Some(at as u32);
                    }
                    if at == hl {
                        return None;
                    }
                    at -= 1;
                }
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
