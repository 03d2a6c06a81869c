//! # Coalesce Shared
//! Detects the transient "clear presence, capture payload, restore presence"
//! write pattern on entity slots and collapses it into one direct payload
//! application, without losing any real state change.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

pub use coalesce_serde::{
    packed_id_len, read_packed_id, write_packed_id, ByteReader, ByteWrite, SerdeErr,
    StreamWriter, PACKED_ID_MAX_BYTES,
};

mod coalesce;
mod config;
mod constants;
mod host;
mod messages;
mod pending;
mod types;
mod world;

pub use coalesce::{
    classifier::Classifier,
    decision::{Decision, Notification, PassReason, Replay, Suppression, SuppressedWrite},
    engine::{CoalesceEngine, InstanceRole, MessageKind, MessageVerdict, RewrittenMessage},
    field_event::FieldEvent,
    refresh_gate::{RefreshGate, RefreshVerdict},
    sweeper::{SweepReport, TimeoutSweeper},
    visual_cache::{ObservedClear, SnapshotDiff, VisualSnapshot, VisualSnapshotCache},
};
pub use config::{CoalesceConfig, ConfigError};
pub use constants::{
    DEFAULT_MAX_DECOMPRESSED_BYTES, DEFAULT_TIMEOUT_MS, MAX_MASK_BLOCKS, PAYLOAD_TERMINAL_SENTINEL,
    REMOTE_PROBE_LIMIT, REMOTE_TABLE_CAPACITY, SLOT_COUNT, VISUAL_CACHE_CAPACITY,
};
pub use host::{
    clock::{Clock, SystemClock},
    host_context::HostContext,
    instance_guard::{instance_token_name, ProcessInstanceGuard, SingleInstanceGuard},
    notification::{NotificationSink, VisualRefresher},
    replayer::{Replayer, StoreReplayer},
};
pub use messages::{
    error::{DecodeError, EncodeError},
    field_change::FieldChange,
    update_decoder::UpdateDecoder,
    update_encoder::{UpdateEncoder, UpdateGroup},
};
pub use pending::{
    error::PendingError,
    local_pending::{LocalPending, LocalPendingStore},
    local_snapshot::LocalSnapshot,
    pending_state::PendingState,
    remote_pending::{RemotePending, RemotePendingTable},
    unapplied::UnappliedPresence,
};
pub use types::{elapsed_since, Millis, Slot};
pub use world::{
    entity_id::{EntityId, EntityKind},
    entity_store::{EntityHandle, EntityStore},
    error::{EntityStoreError, LayoutError},
    field::{Field, FieldLayout, FieldRef, OccupantWord},
};

cfg_if! {
    if #[cfg(feature = "zstd_support")] {
        pub use messages::envelope::{EnvelopeDecoder, EnvelopeEncoder};
    }
}
