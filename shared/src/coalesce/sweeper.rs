use log::{debug, warn};

use crate::{
    EntityHandle, EntityId, HostContext, LocalPending, Millis, PendingState, RemotePending,
    SuppressedWrite, VisualSnapshotCache,
};

/// What one sweep did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired local records whose clear (and payload) were replayed
    pub local_replayed: usize,
    pub remote_replayed: usize,
    /// Expired records whose entity was gone, released without a write
    pub dropped: usize,
    /// Expensive recomputes requested, at most one per remote entity
    pub recomputes: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Resolves pending records that outlived the coalescing window by applying
/// the clears that were held back.
///
/// Buffers are kept between sweeps so a sweep does not allocate once they
/// have grown to the working set.
#[derive(Default)]
pub struct TimeoutSweeper {
    expired_local: Vec<LocalPending>,
    expired_remote: Vec<RemotePending>,
    touched: Vec<(EntityId, EntityHandle)>,
}

impl TimeoutSweeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sweep(
        &mut self,
        state: &mut PendingState,
        visuals: &mut VisualSnapshotCache,
        host: &mut HostContext,
        now: Millis,
        timeout: Millis,
    ) -> SweepReport {
        let mut report = SweepReport::default();
        if state.is_idle() {
            return report;
        }

        self.expired_local.clear();
        self.expired_remote.clear();
        self.touched.clear();

        let expired_local = &mut self.expired_local;
        state
            .local
            .drain_expired(now, timeout, |record| expired_local.push(record));
        let expired_remote = &mut self.expired_remote;
        state
            .remote
            .drain_expired(now, timeout, |record| expired_remote.push(record));

        if !self.expired_local.is_empty() {
            self.replay_local(state, host, &mut report);
        }

        for record in &self.expired_remote {
            let current = host.store.resolve(record.entity);
            if current != Ok(record.handle) {
                debug!(
                    "TimeoutSweeper: {} gone, dropping pending clear of slot {:?}",
                    record.entity, record.slot
                );
                report.dropped += 1;
                continue;
            }
            let clear = SuppressedWrite::clear(record.entity, record.slot);
            match host.replayer.replay(&mut *host.store, record.handle, &clear) {
                Ok(()) => report.remote_replayed += 1,
                Err(err) => {
                    warn!("TimeoutSweeper: replay failed: {}", err);
                    report.dropped += 1;
                    continue;
                }
            }
            if !self.touched.iter().any(|(entity, _)| *entity == record.entity) {
                self.touched.push((record.entity, record.handle));
            }
        }

        for (entity, handle) in &self.touched {
            visuals.invalidate(*entity);
            host.refresher.recompute(*handle);
            report.recomputes += 1;
        }

        if !report.is_empty() {
            debug!("TimeoutSweeper: {:?}", report);
        }
        report
    }

    fn replay_local(
        &self,
        state: &mut PendingState,
        host: &mut HostContext,
        report: &mut SweepReport,
    ) {
        let resolved = state.snapshot.entity().and_then(|entity| {
            let handle = host.store.resolve(entity).ok()?;
            (state.snapshot.handle() == Some(handle)).then_some((entity, handle))
        });
        let Some((entity, handle)) = resolved else {
            report.dropped += self.expired_local.len();
            state.snapshot.invalidate();
            return;
        };

        for record in &self.expired_local {
            let clear = SuppressedWrite::clear(entity, record.slot);
            if let Err(err) = host.replayer.replay(&mut *host.store, handle, &clear) {
                warn!("TimeoutSweeper: replay failed: {}", err);
                report.dropped += 1;
                continue;
            }
            state.snapshot.set_presence(record.slot, 0);
            report.local_replayed += 1;

            if !record.has_payload {
                continue;
            }
            let item = state.snapshot.occupant(record.slot);
            let payload = SuppressedWrite::payload(item, record.captured_payload);
            let applied = host
                .store
                .resolve(item)
                .and_then(|item_handle| host.replayer.replay(&mut *host.store, item_handle, &payload));
            if let Err(err) = applied {
                debug!("TimeoutSweeper: captured payload for {} not applied: {}", item, err);
            }
        }
    }
}
