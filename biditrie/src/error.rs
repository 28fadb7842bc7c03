//! Error types for the selfie codec.

use thiserror::Error;

/// Failure while decoding a wrapped container image.
#[derive(Error, Debug)]
pub enum SelfieError {
    #[error("invalid magic bytes")]
    InvalidMagic,

    #[error("unsupported selfie version {0}")]
    UnsupportedVersion(u8),

    #[error("selfie truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("selfie length mismatch: header says {expected}, payload has {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("selfie payload is empty")]
    Empty,

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}
