use crate::{EntityHandle, Notification};

/// Fire-and-forget consumer of "state changed" signals, typically a UI layer
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

/// The two appearance refresh paths of the host
pub trait VisualRefresher {
    /// Cheap cache refresh that assumes the visible occupants did not change
    fn refresh_cheap(&mut self, handle: EntityHandle);

    /// Full per-entity recompute
    fn recompute(&mut self, handle: EntityHandle);
}
