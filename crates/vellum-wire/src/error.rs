//! Errors for the binary value codec.

use thiserror::Error;

/// Errors raised while encoding host values to or decoding them from the
/// PostgreSQL binary format.
///
/// Both directions are strict. An encoder never emits bytes for a value it
/// cannot represent exactly, and a decoder never invents a value from bytes
/// that do not match the declared column type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A host value does not fit the column type it is being encoded for.
    #[error("cannot encode {found} value for {expected} column")]
    Encode {
        /// Type name of the column the value was destined for.
        expected: &'static str,
        /// Kind of the host value that was supplied.
        found: &'static str,
    },

    /// A wire field does not contain a valid value of the declared type.
    #[error("cannot decode {ty} field: {detail}")]
    Decode {
        /// Type name of the column being decoded.
        ty: &'static str,
        /// What was wrong with the bytes.
        detail: String,
    },
}

impl WireError {
    pub(crate) fn decode(ty: &'static str, detail: impl Into<String>) -> Self {
        Self::Decode {
            ty,
            detail: detail.into(),
        }
    }
}

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, WireError>;
