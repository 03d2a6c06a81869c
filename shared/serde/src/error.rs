use thiserror::Error;

/// Errors raised while reading raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// A read needed more bytes than the buffer has left
    #[error("Read of {needed} bytes at offset {offset} exceeds buffer ({remaining} bytes remaining)")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
}
