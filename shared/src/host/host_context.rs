use crate::{Clock, EntityStore, NotificationSink, Replayer, VisualRefresher};

/// The collaborators an engine entry point talks to, borrowed for one call
pub struct HostContext<'h> {
    pub store: &'h mut dyn EntityStore,
    pub clock: &'h dyn Clock,
    pub replayer: &'h mut dyn Replayer,
    pub sink: &'h mut dyn NotificationSink,
    pub refresher: &'h mut dyn VisualRefresher,
}

impl<'h> HostContext<'h> {
    pub fn new(
        store: &'h mut dyn EntityStore,
        clock: &'h dyn Clock,
        replayer: &'h mut dyn Replayer,
        sink: &'h mut dyn NotificationSink,
        refresher: &'h mut dyn VisualRefresher,
    ) -> Self {
        Self {
            store,
            clock,
            replayer,
            sink,
            refresher,
        }
    }
}
