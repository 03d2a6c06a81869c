use log::debug;
use zstd::bulk::{Compressor, Decompressor};

use crate::{DecodeError, EncodeError};

/// Size of the declared-length header in front of the zstd frame
pub const ENVELOPE_HEADER_BYTES: usize = 4;

/// Opens compressed envelopes: a little-endian `u32` decompressed size
/// followed by one zstd frame holding concatenated update messages.
///
/// Decompression goes into a scratch buffer allocated once at construction,
/// so a hostile declared size can never grow memory past the bound.
pub struct EnvelopeDecoder {
    scratch: Vec<u8>,
    max_decompressed_bytes: usize,
    decompressor: Decompressor<'static>,
}

impl EnvelopeDecoder {
    /// Try to create a new EnvelopeDecoder bounded to `max_decompressed_bytes`
    pub fn try_new(max_decompressed_bytes: usize) -> Result<Self, DecodeError> {
        let decompressor =
            Decompressor::new().map_err(|_| DecodeError::DecompressorCreationFailed)?;
        Ok(Self {
            scratch: Vec::with_capacity(max_decompressed_bytes),
            max_decompressed_bytes,
            decompressor,
        })
    }

    pub fn max_decompressed_bytes(&self) -> usize {
        self.max_decompressed_bytes
    }

    /// Try to open an envelope, returning the decompressed messages
    ///
    /// SECURITY: This method processes untrusted data. Oversized or malformed
    /// envelopes return an error instead of allocating or panicking.
    pub fn try_open(&mut self, envelope: &[u8]) -> Result<&[u8], DecodeError> {
        if envelope.len() < ENVELOPE_HEADER_BYTES {
            return Err(DecodeError::EnvelopeTooShort {
                len: envelope.len(),
            });
        }
        let declared =
            u32::from_le_bytes([envelope[0], envelope[1], envelope[2], envelope[3]]) as usize;
        if declared > self.max_decompressed_bytes {
            debug!(
                "EnvelopeDecoder: refusing envelope declaring {} bytes (max {})",
                declared, self.max_decompressed_bytes
            );
            return Err(DecodeError::EnvelopeTooLarge {
                declared,
                max: self.max_decompressed_bytes,
            });
        }

        let frame = &envelope[ENVELOPE_HEADER_BYTES..];
        self.scratch.clear();
        let actual = self
            .decompressor
            .decompress_to_buffer(frame, &mut self.scratch)
            .map_err(|_| DecodeError::DecompressionFailed {
                payload_size: frame.len(),
            })?;
        if actual != declared {
            return Err(DecodeError::DecompressedSizeMismatch { declared, actual });
        }
        Ok(&self.scratch)
    }
}

/// Seals update messages into a compressed envelope
pub struct EnvelopeEncoder {
    compressor: Compressor<'static>,
}

impl EnvelopeEncoder {
    /// Try to create a new EnvelopeEncoder with the given zstd compression level
    pub fn try_new(level: i32) -> Result<Self, EncodeError> {
        let compressor =
            Compressor::new(level).map_err(|_| EncodeError::CompressorCreationFailed { level })?;
        Ok(Self { compressor })
    }

    pub fn try_seal(&mut self, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let declared = u32::try_from(payload.len()).map_err(|_| EncodeError::PayloadTooLarge {
            payload_size: payload.len(),
        })?;
        let frame = self
            .compressor
            .compress(payload)
            .map_err(|_| EncodeError::CompressionFailed {
                payload_size: payload.len(),
            })?;

        let mut envelope = Vec::with_capacity(ENVELOPE_HEADER_BYTES + frame.len());
        envelope.extend_from_slice(&declared.to_le_bytes());
        envelope.extend_from_slice(&frame);
        Ok(envelope)
    }
}
