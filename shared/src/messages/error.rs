use thiserror::Error;

use crate::SerdeErr;

/// Errors that can occur while decoding delta-update messages
///
/// SECURITY: messages are untrusted. Every variant means "not decodable" and
/// the original bytes are forwarded unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A read ran past the end of the message
    #[error("Message truncated: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// Group count cannot possibly fit in the remaining bytes
    #[error("Message declares {count} field groups but only {remaining} bytes follow")]
    ImplausibleGroupCount {
        count: u32,
        remaining: usize,
    },

    /// A group's change mask is wider than the decoder accepts
    #[error("Field group declares {count} mask blocks (max {max})")]
    TooManyMaskBlocks {
        count: usize,
        max: usize,
    },

    /// Bytes left over after the declared groups of a single message
    #[error("{count} trailing bytes after message end")]
    TrailingBytes {
        count: usize,
    },

    /// A concatenated payload held no message at all
    #[error("Payload contains no messages")]
    EmptyPayload,

    /// Envelope shorter than its size header
    #[error("Compressed envelope of {len} bytes is missing its size header")]
    EnvelopeTooShort {
        len: usize,
    },

    /// Declared decompressed size is larger than the scratch bound
    #[error("Compressed envelope declares {declared} bytes, bound is {max}")]
    EnvelopeTooLarge {
        declared: usize,
        max: usize,
    },

    /// Failed to create decompressor
    #[error("Failed to create decompressor")]
    DecompressorCreationFailed,

    /// Decompression operation failed (SECURITY: potentially malicious payload)
    #[error("Failed to decompress payload of {payload_size} bytes (possible malformed or malicious data)")]
    DecompressionFailed {
        payload_size: usize,
    },

    /// Decompressed output disagrees with the declared size
    #[error("Envelope declared {declared} bytes but decompressed to {actual}")]
    DecompressedSizeMismatch {
        declared: usize,
        actual: usize,
    },
}

impl From<SerdeErr> for DecodeError {
    fn from(err: SerdeErr) -> Self {
        match err {
            SerdeErr::Truncated {
                offset,
                needed,
                remaining,
            } => DecodeError::Truncated {
                offset,
                needed,
                remaining,
            },
        }
    }
}

/// Errors that can occur while encoding delta-update messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Field index beyond the widest mask the decoder accepts
    #[error("Field index {index} exceeds the encodable maximum {max}")]
    FieldIndexOutOfRange {
        index: u16,
        max: usize,
    },

    /// The same field appears twice in one group
    #[error("Field index {index} appears more than once in a group")]
    DuplicateField {
        index: u16,
    },

    /// Failed to create compressor with the specified configuration
    #[error("Failed to create compressor with compression level {level}")]
    CompressorCreationFailed {
        level: i32,
    },

    /// Compression operation failed
    #[error("Failed to compress payload of {payload_size} bytes")]
    CompressionFailed {
        payload_size: usize,
    },

    /// Payload does not fit the envelope's size header
    #[error("Payload of {payload_size} bytes is too large for an envelope")]
    PayloadTooLarge {
        payload_size: usize,
    },
}
