//! Wrapped text form of a container image, for cache storage that wants a
//! string rather than raw bytes.
//!
//! ## Wire format (inside the base64 body)
//!
//! ```text
//! Header (12 bytes):
//!   magic:    [u8; 4]  = "BTS1"
//!   version:  u8       = 1
//!   pad:      [u8; 3]  = 0
//!   byte_len: u32 LE     (length of the raw image that follows)
//! Payload:
//!   the raw byte image from BidiTrieContainer::serialize
//! ```
//!
//! The raw image is already self-describing; the header only guards against
//! feeding a foreign or truncated cache entry into `deserialize`, which by
//! contract does not validate its input.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::container::BidiTrieContainer;
use crate::error::SelfieError;

/// Magic bytes of the wrapped form.
const SELFIE_MAGIC: [u8; 4] = *b"BTS1";

/// Wire format version.
const SELFIE_VERSION: u8 = 1;

/// Header size: magic(4) + version(1) + pad(3) + byte_len(4).
const SELFIE_HEADER_LEN: usize = 12;

/// Encode the container's live image as a base64 selfie string.
pub fn to_selfie(ctr: &BidiTrieContainer) -> String {
    let image = ctr.serialize();
    let mut raw = Vec::with_capacity(SELFIE_HEADER_LEN + image.len());
    raw.extend_from_slice(&SELFIE_MAGIC);
    raw.push(SELFIE_VERSION);
    raw.extend_from_slice(&[0u8; 3]);
    raw.extend_from_slice(&(image.len() as u32).to_le_bytes());
    raw.extend_from_slice(image);
    STANDARD.encode(raw)
}

/// Validate a selfie string and restore the container from it.
pub fn from_selfie(ctr: &mut BidiTrieContainer, selfie: &str) -> Result<(), SelfieError> {
    let raw = STANDARD.decode(selfie)?;
    if raw.len() < SELFIE_HEADER_LEN {
        return Err(SelfieError::Truncated {
            need: SELFIE_HEADER_LEN,
            have: raw.len(),
        });
    }
    if raw[0..4] != SELFIE_MAGIC {
        return Err(SelfieError::InvalidMagic);
    }
    if raw[4] != SELFIE_VERSION {
        return Err(SelfieError::UnsupportedVersion(raw[4]));
    }
    let byte_len = u32::from_le_bytes(raw[8..12].try_into().unwrap()) as usize;
    let image = &raw[SELFIE_HEADER_LEN..];
    if image.len() != byte_len {
        return Err(SelfieError::LengthMismatch {
            expected: byte_len,
            actual: image.len(),
        });
    }
    if !ctr.deserialize(image) {
        return Err(SelfieError::Empty);
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::BidiTrieOptions;
    use crate::handle::TrieRef;

    #[test]
    fn test_selfie_roundtrip() {
        let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
        let mut trie = TrieRef::new(ctr.create_trie());
        let b = trie.add_pattern(&mut ctr, b"-images/ad-", 8);
        ctr.set_extra(b, 1);

        let selfie = to_selfie(&ctr);

        let mut restored = BidiTrieContainer::new(BidiTrieOptions::default());
        from_selfie(&mut restored, &selfie).unwrap();
        restored.set_haystack(b"http://x/-images/ad-banner");
        let m = restored.matches(trie.root(), 17).unwrap();
        assert_eq!((m.left, m.right), (9, 20));
    }

    #[test]
    fn test_selfie_rejects_bad_magic() {
        let mut raw = vec![0u8; 16];
        raw[0..4].copy_from_slice(b"NOPE");
        raw[4] = SELFIE_VERSION;
        let selfie = STANDARD.encode(raw);
        let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
        assert!(matches!(
            from_selfie(&mut ctr, &selfie),
            Err(SelfieError::InvalidMagic)
        ));
    }

    #[test]
    fn test_selfie_rejects_bad_version() {
        let mut raw = vec![0u8; 16];
        raw[0..4].copy_from_slice(&SELFIE_MAGIC);
        raw[4] = 99;
        let selfie = STANDARD.encode(raw);
        let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
        assert!(matches!(
            from_selfie(&mut ctr, &selfie),
            Err(SelfieError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_selfie_rejects_truncated_header() {
        let selfie = STANDARD.encode([0u8; 5]);
        let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
        assert!(matches!(
            from_selfie(&mut ctr, &selfie),
            Err(SelfieError::Truncated { .. })
        ));
    }

    #[test]
    fn test_selfie_rejects_length_mismatch() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&SELFIE_MAGIC);
        raw.push(SELFIE_VERSION);
        raw.extend_from_slice(&[0u8; 3]);
        raw.extend_from_slice(&100u32.to_le_bytes());
        raw.extend_from_slice(&[0u8; 40]);
        let selfie = STANDARD.encode(raw);
        let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
        assert!(matches!(
            from_selfie(&mut ctr, &selfie),
            Err(SelfieError::LengthMismatch {
                expected: 100,
                actual: 40
            })
        ));
    }

    #[test]
    fn test_selfie_rejects_garbage_base64() {
        let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
        assert!(matches!(
            from_selfie(&mut ctr, "!!not base64!!"),
            Err(SelfieError::Base64(_))
        ));
    }
}
