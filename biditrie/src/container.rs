//! Backing buffer, cell allocator, and character interner.
//!
//! One contiguous byte buffer holds everything the trie needs: the haystack
//! window callers match against, the fixed header slots, the trie cells, and
//! the raw character segments. Serializing the container is therefore a
//! single memcpy of the used prefix.
//!
//! ## Buffer layout
//!
//! ```text
//! byte offset
//! 0     ........ 2048   haystack window (shared with callers)
//! 2048  ........ 2068   five u32 LE header slots:
//!                         2048 haystack_len   valid haystack bytes
//!                         2052 trie0          first trie cell (fixed)
//!                         2056 trie1          one past last allocated cell
//!                         2060 char0          first character byte
//!                         2064 char1          one past last character byte
//! trie0 ........ trie1  trie cells, 12 bytes each, bump-allocated
//! trie1 ........ char0  free gap
//! char0 ........ char1  character segments, append-only
//! ```
//!
//! Invariant: `trie0 <= trie1 <= char0 <= char1 <= buf.len()`. The free gap
//! is kept at least [`MIN_FREE_CELL_BYTE_LENGTH`] ahead of a batch of cell
//! allocations; when it runs out the buffer grows by whole pages and the
//! character region slides to a higher offset.
//!
//! Cells are identified by their u32 word index (byte offset / 4); index 0
//! means "none". A cell whose third word is at most [`BCELL_EXTRA_MAX`] is a
//! boundary cell; otherwise the third word packs `(length << 24) | offset`
//! of a character segment, with `offset` relative to `char0`.

use crate::search::SearchStrategy;

/// Buffer length granularity. The buffer is always a whole number of pages.
pub(crate) const PAGE_SIZE: usize = 128 * 1024;

/// Size of the shared haystack window at the start of the buffer.
pub(crate) const HAYSTACK_SIZE: usize = 2048;

const HAYSTACK_LEN_SLOT: u32 = (HAYSTACK_SIZE >> 2) as u32;
const TRIE0_SLOT: u32 = HAYSTACK_LEN_SLOT + 1;
const TRIE1_SLOT: u32 = HAYSTACK_LEN_SLOT + 2;
const CHAR0_SLOT: u32 = HAYSTACK_LEN_SLOT + 3;
const CHAR1_SLOT: u32 = HAYSTACK_LEN_SLOT + 4;

/// Byte offset of the first trie cell, just past the header slots.
const TRIE0_START: usize = (CHAR1_SLOT as usize + 1) * 4;

/// One trie cell: three u32 words.
pub(crate) const CELL_BYTE_LENGTH: usize = 12;

/// Headroom required before a batch of cell allocations. Eight cells is an
/// upper bound on what a single `add` can allocate.
pub(crate) const MIN_FREE_CELL_BYTE_LENGTH: usize = CELL_BYTE_LENGTH * 8;

// Word offsets within a normal cell.
pub(crate) const CELL_AND: u32 = 0;
pub(crate) const CELL_OR: u32 = 1;
pub(crate) const SEGMENT_INFO: u32 = 2;

// Word offsets within a boundary cell (same 12 bytes, different roles).
pub(crate) const BCELL_NEXT_AND: u32 = 0;
pub(crate) const BCELL_ALT_AND: u32 = 1;
pub(crate) const BCELL_EXTRA: u32 = 2;

/// Largest value storable in a boundary cell's extra word. Segment words are
/// always larger (their packed length is at least 1), which is what tells the
/// two cell kinds apart.
pub const BCELL_EXTRA_MAX: u32 = 0x00FF_FFFF;

/// Predicate deciding whether a boundary cell with `extra > 1` accepts a
/// match spanning `[l, r)`. Returns a caller-defined non-zero handle to
/// accept, 0 to reject.
pub type ExtraHandler = Box<dyn Fn(u32, u32, u32) -> u32>;

#[inline]
fn round_to_page(n: usize) -> usize {
    (n + PAGE_SIZE - 1) & !(PAGE_SIZE - 1)
}

/// Construction options for [`BidiTrieContainer`].
#[derive(Clone, Debug, Default)]
pub struct BidiTrieOptions {
    /// Advisory initial capacity in bytes. Rounded up to a whole page and
    /// floored at four pages.
    pub byte_length: usize,
    /// Advisory initial offset of the character region. Defaults to the
    /// middle of the buffer.
    pub char0: Option<usize>,
}

/// Owner of the backing buffer. One container can host any number of
/// independent tries (see [`crate::TrieRef`]); they all share the haystack
/// window, the cell region, and the character region.
///
/// Single-writer, multiple-reader: no `add`, `reset`, grow, or
/// `deserialize` may run concurrently with any match or iteration. Match
/// operations take `&self` and mutate nothing.
pub struct BidiTrieContainer {
    pub(crate) buf: Vec<u8>,
    pub(crate) extra_handler: Option<ExtraHandler>,
    pub(crate) search: SearchStrategy,
}

impl BidiTrieContainer {
    /// Create a container with no extra handler. Patterns stored with an
    /// extra greater than 1 will never be accepted by such a container.
    pub fn new(options: BidiTrieOptions) -> Self {
        Self::build(options, None)
    }

    /// Create a container whose boundary extras are resolved by `handler`.
    pub fn with_extra_handler(options: BidiTrieOptions, handler: ExtraHandler) -> Self {
        Self::build(options, Some(handler))
    }

    fn build(options: BidiTrieOptions, extra_handler: Option<ExtraHandler>) -> Self {
        let len = round_to_page(options.byte_length).max(PAGE_SIZE * 4);
        let mut ctr = Self {
            buf: vec![0u8; len],
            extra_handler,
            search: SearchStrategy::select(),
        };
        let char0 = options.char0.unwrap_or(len / 2).clamp(TRIE0_START, len) & !3;
        ctr.set_word(TRIE0_SLOT, TRIE0_START as u32);
        ctr.set_word(TRIE1_SLOT, TRIE0_START as u32);
        ctr.set_word(CHAR0_SLOT, char0 as u32);
        ctr.set_word(CHAR1_SLOT, char0 as u32);
        ctr
    }

    // ------------------------------------------------------------------
    // Word and region accessors
    // ------------------------------------------------------------------

    /// Read the u32 at word index `wi`.
    #[inline]
    pub(crate) fn word(&self, wi: u32) -> u32 {
        let at = wi as usize * 4;
        u32::from_le_bytes([
            self.buf[at],
            self.buf[at + 1],
            self.buf[at + 2],
            self.buf[at + 3],
        ])
    }

    /// Write the u32 at word index `wi`.
    #[inline]
    pub(crate) fn set_word(&mut self, wi: u32, v: u32) {
        let at = wi as usize * 4;
        self.buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub(crate) fn trie0(&self) -> usize {
        self.word(TRIE0_SLOT) as usize
    }

    #[inline]
    pub(crate) fn trie1(&self) -> usize {
        self.word(TRIE1_SLOT) as usize
    }

    #[inline]
    pub(crate) fn char0(&self) -> usize {
        self.word(CHAR0_SLOT) as usize
    }

    #[inline]
    pub(crate) fn char1(&self) -> usize {
        self.word(CHAR1_SLOT) as usize
    }

    /// Bytes of the buffer currently in use (everything up to the end of the
    /// character region).
    pub fn used_bytes(&self) -> usize {
        self.char1()
    }

    /// Current capacity of the backing buffer.
    pub fn buffer_len(&self) -> usize {
        self.buf.len()
    }

    /// Number of trie cells allocated so far, across all tries.
    pub fn cell_count(&self) -> usize {
        (self.trie1() - self.trie0()) / CELL_BYTE_LENGTH
    }

    // ------------------------------------------------------------------
    // Haystack window
    // ------------------------------------------------------------------

    /// Bytes of valid haystack content.
    #[inline]
    pub fn haystack_len(&self) -> usize {
        self.word(HAYSTACK_LEN_SLOT) as usize
    }

    /// Declare how many bytes of the haystack window are valid.
    pub fn set_haystack_len(&mut self, len: usize) {
        debug_assert!(len <= HAYSTACK_SIZE);
        self.set_word(HAYSTACK_LEN_SLOT, len as u32);
    }

    /// The valid haystack bytes.
    pub fn haystack(&self) -> &[u8] {
        &self.buf[..self.haystack_len()]
    }

    /// The whole haystack window, for callers that write into it directly.
    /// Pair with [`Self::set_haystack_len`].
    pub fn haystack_mut(&mut self) -> &mut [u8] {
        &mut self.buf[..HAYSTACK_SIZE]
    }

    /// Copy `data` into the haystack window (truncated to the window size)
    /// and set the haystack length accordingly.
    pub fn set_haystack(&mut self, data: &[u8]) {
        let n = data.len().min(HAYSTACK_SIZE);
        self.buf[..n].copy_from_slice(&data[..n]);
        self.set_haystack_len(n);
    }

    // ------------------------------------------------------------------
    // Cell allocation
    // ------------------------------------------------------------------

    /// Allocate the root cell of a new trie and return its index.
    pub fn create_trie(&mut self) -> u32 {
        if self.char0() - self.trie1() < CELL_BYTE_LENGTH {
            self.grow_buf(CELL_BYTE_LENGTH, 0);
        }
        let iroot = self.alloc_cell(0, 0, 0);
        tracing::trace!(iroot, "created trie root");
        iroot
    }

    /// Bump-allocate one cell with the given three words. Callers must have
    /// secured free space beforehand (`grow_buf`); allocation never grows.
    pub(crate) fn alloc_cell(&mut self, iand: u32, ior: u32, v: u32) -> u32 {
        let trie1 = self.trie1();
        debug_assert!(self.char0() - trie1 >= CELL_BYTE_LENGTH);
        self.set_word(TRIE1_SLOT, (trie1 + CELL_BYTE_LENGTH) as u32);
        let icell = (trie1 >> 2) as u32;
        self.set_word(icell + CELL_AND, iand);
        self.set_word(icell + CELL_OR, ior);
        self.set_word(icell + SEGMENT_INFO, v);
        icell
    }

    // ------------------------------------------------------------------
    // Growth and shrinkage
    // ------------------------------------------------------------------

    /// Make room for `trie_grow` more cell bytes and `char_grow` more
    /// character bytes, growing the buffer and/or sliding the character
    /// region upward as needed.
    pub(crate) fn grow_buf(&mut self, trie_grow: usize, char_grow: usize) {
        let char0 = round_to_page(self.trie1() + trie_grow).max(self.char0());
        let char1 = char0 + self.char1() - self.char0();
        let buf_len = round_to_page(char1 + char_grow).max(self.buf.len());
        self.resize_buf(buf_len, char0);
    }

    /// Pack the character region right after the cell region (plus standard
    /// headroom) and trim the buffer to fit.
    pub fn optimize(&mut self) {
        let char0 = self.trie1() + MIN_FREE_CELL_BYTE_LENGTH;
        let char1 = char0 + self.char1() - self.char0();
        self.resize_buf(char1 + 256, char0);
    }

    /// Retarget the buffer to `buf_len` (page-rounded) with the character
    /// region starting at `char0`. Preserves the trie region in place and
    /// relocates the character bytes; cell indices and char0-relative
    /// offsets survive unchanged.
    fn resize_buf(&mut self, buf_len: usize, char0: usize) {
        let buf_len = round_to_page(buf_len);
        if buf_len == self.buf.len() && char0 == self.char0() {
            return;
        }
        debug_assert!(char0 >= self.trie1());
        let char_data_len = self.char1() - self.char0();
        debug_assert!(char0 + char_data_len <= buf_len);
        if buf_len != self.buf.len() {
            tracing::debug!(
                old_len = self.buf.len(),
                new_len = buf_len,
                char0,
                "reallocating container buffer"
            );
            let mut new_buf = vec![0u8; buf_len];
            new_buf[..self.trie1()].copy_from_slice(&self.buf[..self.trie1()]);
            new_buf[char0..char0 + char_data_len]
                .copy_from_slice(&self.buf[self.char0()..self.char1()]);
            self.buf = new_buf;
        } else {
            tracing::debug!(
                from = self.char0(),
                to = char0,
                len = char_data_len,
                "sliding character region"
            );
            let (src_start, src_end) = (self.char0(), self.char1());
            self.buf.copy_within(src_start..src_end, char0);
        }
        self.set_word(CHAR0_SLOT, char0 as u32);
        self.set_word(CHAR1_SLOT, (char0 + char_data_len) as u32);
    }

    /// Discard all tries and all stored characters at once. Outstanding cell
    /// indices and interning offsets become invalid.
    pub fn reset(&mut self) {
        let trie0 = self.word(TRIE0_SLOT);
        self.set_word(TRIE1_SLOT, trie0);
        let char0 = self.word(CHAR0_SLOT);
        self.set_word(CHAR1_SLOT, char0);
    }

    // ------------------------------------------------------------------
    // Character interner
    // ------------------------------------------------------------------

    /// Append `s` to the character region and return its offset relative to
    /// `char0`. Stored segments must fit the packed 8-bit length field.
    pub fn store_string(&mut self, s: &[u8]) -> u32 {
        debug_assert!(s.len() <= 255, "stored string must fit an 8-bit length");
        if self.buf.len() - self.char1() < s.len() {
            self.grow_buf(0, s.len());
        }
        let char1 = self.char1();
        self.buf[char1..char1 + s.len()].copy_from_slice(s);
        self.set_word(CHAR1_SLOT, (char1 + s.len()) as u32);
        (char1 - self.char0()) as u32
    }

    /// Decode `len` character bytes at `offset` (relative to `char0`) for
    /// presentation. Not used on the match path.
    pub fn extract_string(&self, offset: u32, len: u32) -> String {
        let at = self.char0() + offset as usize;
        String::from_utf8_lossy(&self.buf[at..at + len as usize]).into_owned()
    }

    // ------------------------------------------------------------------
    // Boundary annotation
    // ------------------------------------------------------------------

    /// Read the extra word of a boundary cell returned by `add`.
    pub fn get_extra(&self, iboundary: u32) -> u32 {
        self.word(iboundary + BCELL_EXTRA)
    }

    /// Annotate a boundary cell. `1` accepts unconditionally; any other
    /// value up to [`BCELL_EXTRA_MAX`] is handed to the extra handler at
    /// match time; `0` marks the boundary as not terminal.
    pub fn set_extra(&mut self, iboundary: u32, extra: u32) {
        debug_assert!(extra <= BCELL_EXTRA_MAX);
        self.set_word(iboundary + BCELL_EXTRA, extra);
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// The live buffer truncated to its used length, rounded up to a whole
    /// word. The header slots embedded in the image carry everything needed
    /// to restore it.
    pub fn serialize(&self) -> &[u8] {
        let end = (self.char1() + 3) & !3;
        &self.buf[..end]
    }

    /// Restore a container from a byte image produced by [`Self::serialize`].
    /// Returns false on empty input. Outstanding cell indices from before
    /// the call are invalid afterwards; root indices saved alongside the
    /// image remain meaningful.
    pub fn deserialize(&mut self, image: &[u8]) -> bool {
        if image.is_empty() {
            return false;
        }
        let need = round_to_page(image.len());
        if self.buf.len() < need {
            self.buf = vec![0u8; need];
        }
        self.buf[..image.len()].copy_from_slice(image);
        tracing::debug!(bytes = image.len(), "restored container image");
        true
    }
}

// ===========================================================================
// Tests
// ===========================================================================
