/// Equipment-like slots per entity
pub const SLOT_COUNT: usize = 19;

/// Remote pending table size: prime, about twice the expected peak of ~500 entries
pub const REMOTE_TABLE_CAPACITY: usize = 1031;
pub const REMOTE_PROBE_LIMIT: usize = 32;

pub const VISUAL_CACHE_CAPACITY: usize = 64;

pub const DEFAULT_TIMEOUT_MS: u32 = 100;
pub const DEFAULT_MAX_DECOMPRESSED_BYTES: usize = 64 * 1024;

/// Largest mask accepted per field group: 64 blocks of 32 bits = 2048 fields
pub const MAX_MASK_BLOCKS: usize = 64;

/// Captured payload value meaning the occupant is broken; a restore carrying it
/// must stay visible
pub const PAYLOAD_TERMINAL_SENTINEL: u32 = 0;

pub(crate) const INSTANCE_TOKEN_PREFIX: &str = "Local\\SlotCoalesce_";

/// zstd level used when re-sealing a rewritten compressed envelope
pub(crate) const ENVELOPE_COMPRESSION_LEVEL: i32 = 3;
