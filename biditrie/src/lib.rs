//! # biditrie
//!
//! Bidirectional segment trie over a single backing byte buffer.
//!
//! Stores tokenized patterns, each a `(left, right)` pair of byte strings
//! meeting at a *pivot*, and answers "does some stored pattern match the
//! haystack with its pivot aligned at position `i`?" in time proportional
//! to the matched length and the fan-out at each branch.
//!
//! This crate provides:
//! - A single growable buffer holding haystack window, trie cells, and
//!   character segments, with no per-node allocations
//! - Split-on-mismatch radix insertion walking right and left from the
//!   pivot
//! - Boundary cells carrying caller-defined payload, gated by a predicate
//! - Byte-exact substring primitives with a portable and an accelerated
//!   implementation
//! - Serialization as a raw byte image (plus a wrapped base64 "selfie"
//!   form) that restores instantly
//!
//! ## Design principles
//!
//! 1. **One buffer**: cells are u32 word indices, segments are
//!    `(offset, length)` into the character region; the serialized form is
//!    the buffer itself.
//! 2. **Single-writer, multiple-reader**: matching takes `&self` and
//!    reports results by value; no internal locks.
//! 3. **First accepted boundary wins**: the OR chain is walked in
//!    insertion order and there is no longest-match rule.
//!
//! ## Example
//!
//! ```
//! use biditrie::{BidiTrieContainer, BidiTrieOptions, TrieRef};
//!
//! let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
//! let mut trie = TrieRef::new(ctr.create_trie());
//!
//! // "-images/ad-" anchored at "ad-": left part "-images/", right part "ad-".
//! let boundary = trie.add_pattern(&mut ctr, b"-images/ad-", 8);
//! ctr.set_extra(boundary, 1); // accept unconditionally
//!
//! ctr.set_haystack(b"http://x/-images/ad-banner");
//! let hit = trie.matches(&ctr, 17).expect("pivot aligned at the 'a' of 'ad-'");
//! assert_eq!((hit.left, hit.right), (9, 20));
//! assert!(trie.matches(&ctr, 12).is_none());
//! ```

pub mod container;
pub mod error;
pub mod handle;
mod insert;
pub mod iter;
pub mod matching;
pub mod search;
pub mod selfie;

// Re-export main types
pub use container::{BidiTrieContainer, BidiTrieOptions, ExtraHandler, BCELL_EXTRA_MAX};
pub use error::SelfieError;
pub use handle::TrieRef;
pub use iter::PatternIter;
pub use matching::TrieMatch;
pub use search::SearchStrategy;
pub use selfie::{from_selfie, to_selfie};
