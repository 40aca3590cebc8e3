//! Error types for decoding.

use std::fmt;

/// Kind of geometry record rejected by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Vertex,
    Face,
    Uv,
    Normal,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vertex => "vertex",
            Self::Face => "face",
            Self::Uv => "uv",
            Self::Normal => "normal",
        };
        f.write_str(name)
    }
}

/// Errors produced while decoding archive layouts and meshes.
///
/// Only [`DecodeError::UnrecognizedFormat`] and [`DecodeError::Truncated`]
/// describe a whole buffer. The other variants describe a single record and
/// are dropped by the loop that produced them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The leading signature matched no known layout.
    #[error("unrecognized format (signature {})", signature_display(.signature))]
    UnrecognizedFormat { signature: [u8; 4] },

    /// The buffer ended before a fixed-size header.
    #[error("truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// An offset/size pair points outside its container.
    #[error("malformed entry {name:?}: offset {offset} + size {size} exceeds {available} bytes")]
    MalformedEntry {
        name: String,
        offset: u32,
        size: u32,
        available: usize,
    },

    /// A geometry record failed validation.
    #[error("invalid {record} record at index {index}")]
    InvalidGeometry { record: RecordKind, index: usize },
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Render a signature as ASCII where printable, hex escapes elsewhere.
pub(crate) fn signature_display(signature: &[u8; 4]) -> String {
    signature.escape_ascii().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_escaped() {
        let err = DecodeError::UnrecognizedFormat {
            signature: *b"PKB\0",
        };
        assert_eq!(err.to_string(), "unrecognized format (signature PKB\\x00)");
    }

    #[test]
    fn geometry_error_names_record() {
        let err = DecodeError::InvalidGeometry {
            record: RecordKind::Normal,
            index: 7,
        };
        assert_eq!(err.to_string(), "invalid normal record at index 7");
    }
}
