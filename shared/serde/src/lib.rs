//! # Coalesce Serde
//! Byte-level primitives for reading and writing sparse delta-update messages.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod byte_reader;
mod byte_writer;
mod error;
mod packed_id;
mod stream_writer;

pub use byte_reader::ByteReader;
pub use byte_writer::ByteWrite;
pub use error::SerdeErr;
pub use packed_id::{packed_id_len, read_packed_id, write_packed_id, PACKED_ID_MAX_BYTES};
pub use stream_writer::StreamWriter;
