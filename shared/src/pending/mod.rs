pub mod error;
pub mod local_pending;
pub mod local_snapshot;
pub mod pending_state;
pub mod remote_pending;
pub mod unapplied;
