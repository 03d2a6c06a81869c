use log::{debug, info, warn};

use crate::{
    constants::SLOT_COUNT, Classifier, CoalesceConfig, ConfigError, Decision, EntityHandle,
    EntityId, EntityStore, Field, FieldChange, FieldEvent, FieldLayout, FieldRef, HostContext,
    Millis, Notification, PassReason, PendingState, RefreshGate, RefreshVerdict,
    SingleInstanceGuard, Slot, SuppressedWrite, Suppression, SweepReport, TimeoutSweeper,
    UpdateDecoder, UpdateEncoder, VisualSnapshotCache,
};

cfg_if! {
    if #[cfg(feature = "zstd_support")] {
        use crate::{constants::ENVELOPE_COMPRESSION_LEVEL, EnvelopeDecoder, EnvelopeEncoder};
    }
}

/// Whether this engine won the process-wide instance token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceRole {
    /// Intercepts and coalesces
    Owner,
    /// Another engine owns the token; everything passes through
    Observer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Plain,
    Compressed,
}

/// A message with the suppressed field values removed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewrittenMessage {
    pub kind: MessageKind,
    pub bytes: Vec<u8>,
}

/// What to hand on in place of an incoming update message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageVerdict {
    /// Forward the original bytes unmodified
    Forward,
    Rewritten(RewrittenMessage),
    /// Every value in the message was suppressed
    Drop,
}

/// The coalescing engine: owns all pending state and exposes one entry point
/// per event source. Collaborators are borrowed per call through a
/// [`HostContext`].
///
/// Every entry point first resolves expired pending clears, then classifies,
/// then executes the decision. Field writes the engine does not suppress are
/// the caller's to apply.
pub struct CoalesceEngine {
    config: CoalesceConfig,
    role: InstanceRole,
    guard: Box<dyn SingleInstanceGuard>,
    classifier: Classifier,
    state: PendingState,
    sweeper: TimeoutSweeper,
    visuals: VisualSnapshotCache,
    gate: RefreshGate,
    decoder: UpdateDecoder,
    encoder: UpdateEncoder,
    changes: Vec<FieldChange>,
    removals: Vec<FieldChange>,
    #[cfg(feature = "zstd_support")]
    envelope_decoder: Option<EnvelopeDecoder>,
    #[cfg(feature = "zstd_support")]
    envelope_encoder: Option<EnvelopeEncoder>,
}

impl CoalesceEngine {
    pub fn new(
        config: CoalesceConfig,
        guard: Box<dyn SingleInstanceGuard>,
    ) -> Result<Self, ConfigError> {
        Self::with_layout(config, FieldLayout::default(), guard)
    }

    pub fn with_layout(
        config: CoalesceConfig,
        layout: FieldLayout,
        mut guard: Box<dyn SingleInstanceGuard>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let role = if guard.try_acquire() {
            InstanceRole::Owner
        } else {
            InstanceRole::Observer
        };
        info!(
            "CoalesceEngine: {:?}, enabled: {}, timeout: {} ms",
            role, config.enabled, config.timeout_ms
        );

        Ok(Self {
            classifier: Classifier::new(config.timeout_ms),
            role,
            guard,
            state: PendingState::new(),
            sweeper: TimeoutSweeper::new(),
            visuals: VisualSnapshotCache::new(),
            gate: RefreshGate::new(),
            decoder: UpdateDecoder::new(layout),
            encoder: UpdateEncoder::new(),
            changes: Vec::new(),
            removals: Vec::new(),
            #[cfg(feature = "zstd_support")]
            envelope_decoder: EnvelopeDecoder::try_new(config.max_decompressed_bytes)
                .map_err(|err| warn!("CoalesceEngine: compressed messages disabled: {}", err))
                .ok(),
            #[cfg(feature = "zstd_support")]
            envelope_encoder: EnvelopeEncoder::try_new(ENVELOPE_COMPRESSION_LEVEL)
                .map_err(|err| warn!("CoalesceEngine: rewritten envelopes stay plain: {}", err))
                .ok(),
            config,
        })
    }

    pub fn config(&self) -> &CoalesceConfig {
        &self.config
    }

    pub fn layout(&self) -> &FieldLayout {
        self.decoder.layout()
    }

    pub fn role(&self) -> InstanceRole {
        self.role
    }

    pub fn is_owner(&self) -> bool {
        self.role == InstanceRole::Owner
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// True iff events are being classified at all
    pub fn is_active(&self) -> bool {
        self.is_owner() && self.config.enabled
    }

    pub fn state(&self) -> &PendingState {
        &self.state
    }

    pub fn pending_local(&self) -> usize {
        self.state.local.active_count()
    }

    pub fn pending_remote(&self) -> usize {
        self.state.remote.active_count()
    }

    pub fn visuals(&self) -> &VisualSnapshotCache {
        &self.visuals
    }

    /// Switching in either direction abandons all pending state without replaying it
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.config.enabled == enabled {
            return;
        }
        info!(
            "CoalesceEngine: {} ({} pending clears abandoned)",
            if enabled { "enabled" } else { "disabled" },
            self.state.active_count()
        );
        self.config.enabled = enabled;
        self.reset();
    }

    /// Forgets all pending and cached state
    pub fn reset(&mut self) {
        self.state.clear_all();
        self.visuals.clear();
    }

    /// Resets and gives up the instance token. The engine passes everything
    /// through from then on.
    pub fn shutdown(&mut self) {
        self.reset();
        if self.is_owner() {
            self.guard.release();
            self.role = InstanceRole::Observer;
            info!("CoalesceEngine: shut down");
        }
    }

    /// Opportunistic timeout resolution without an incoming event
    pub fn tick(&mut self, host: &mut HostContext) -> SweepReport {
        if !self.is_active() {
            return SweepReport::default();
        }
        let now = host.clock.now_ms();
        self.sweep(host, now)
    }

    /// Classifies a direct field write. The write must be applied by the
    /// caller iff the returned decision passes it through.
    pub fn on_field_write(
        &mut self,
        host: &mut HostContext,
        entity: EntityId,
        field_index: u16,
        value: u32,
    ) -> Decision {
        if !self.is_active() {
            return Decision::PassThrough(PassReason::Disabled);
        }
        let now = host.clock.now_ms();
        self.sweep(host, now);
        self.track_local_entity(&*host.store);
        self.handle_event(host, entity, field_index, value, now)
    }

    /// Classifies every tracked value of one plain update message
    pub fn on_update_message(&mut self, host: &mut HostContext, message: &[u8]) -> MessageVerdict {
        if !self.is_active() {
            return MessageVerdict::Forward;
        }
        let now = host.clock.now_ms();
        self.sweep(host, now);
        self.track_local_entity(&*host.store);

        self.changes.clear();
        if let Err(err) = self.decoder.decode_message(message, &mut self.changes) {
            debug!("CoalesceEngine: forwarding undecodable message: {}", err);
            return MessageVerdict::Forward;
        }
        self.handle_changes(host, now);
        if self.removals.is_empty() {
            return MessageVerdict::Forward;
        }

        match self.rewrite(message) {
            Some(Some(bytes)) => MessageVerdict::Rewritten(RewrittenMessage {
                kind: MessageKind::Plain,
                bytes,
            }),
            Some(None) => MessageVerdict::Drop,
            None => MessageVerdict::Forward,
        }
    }

    /// Refresh request for an entity's appearance. Performs the chosen
    /// refresh through the host's [`VisualRefresher`](crate::VisualRefresher).
    pub fn on_refresh_request(&mut self, host: &mut HostContext, entity: EntityId) -> RefreshVerdict {
        let Ok(handle) = host.store.resolve(entity) else {
            return RefreshVerdict::FullRecompute;
        };
        if !self.is_active() || !entity.is_actor() {
            host.refresher.recompute(handle);
            return RefreshVerdict::FullRecompute;
        }
        let now = host.clock.now_ms();
        self.sweep(host, now);
        self.track_local_entity(&*host.store);

        let Some(presence) = read_presence(&*host.store, handle) else {
            host.refresher.recompute(handle);
            return RefreshVerdict::FullRecompute;
        };
        let diff = self
            .visuals
            .observe(entity, &presence, now, self.classifier.timeout());
        let verdict = self.gate.classify(&diff);
        if self.config.debug_log {
            debug!("CoalesceEngine: refresh {} {:?} -> {:?}", entity, diff, verdict);
        }

        match verdict {
            RefreshVerdict::CheapRefresh => {
                host.refresher.refresh_cheap(handle);
                if self.state.snapshot.is_local(entity) {
                    host.sink.notify(Notification::AppearanceRestored { entity });
                }
            }
            RefreshVerdict::FullRecompute => host.refresher.recompute(handle),
        }
        verdict
    }

    fn sweep(&mut self, host: &mut HostContext, now: Millis) -> SweepReport {
        self.sweeper.sweep(
            &mut self.state,
            &mut self.visuals,
            host,
            now,
            self.classifier.timeout(),
        )
    }

    /// Keeps the local snapshot attached to the store's current local entity
    fn track_local_entity(&mut self, store: &dyn EntityStore) {
        let snapshot = &self.state.snapshot;
        if snapshot.is_valid() && snapshot.entity() != store.local_entity() {
            info!(
                "CoalesceEngine: local entity changed, abandoning {} local pending clears",
                self.state.local.active_count()
            );
            self.state.local.clear_all();
            self.state.snapshot.invalidate();
        }
        self.state.snapshot.ensure_primed(store);
    }

    fn handle_event(
        &mut self,
        host: &mut HostContext,
        entity: EntityId,
        field_index: u16,
        value: u32,
        now: Millis,
    ) -> Decision {
        let field = self.decoder.layout().classify(field_index);
        if let FieldRef::Other(_) = field {
            return Decision::PassThrough(PassReason::Unrelated);
        }
        let event = FieldEvent::new(entity, field, value, self.state.snapshot.is_local(entity));
        let decision = self
            .classifier
            .classify(&mut self.state, &*host.store, event, now);
        if self.config.debug_log {
            debug!("CoalesceEngine: {:?} -> {:?}", event, decision);
        }
        execute(host, &decision);
        decision
    }

    fn handle_changes(&mut self, host: &mut HostContext, now: Millis) {
        self.removals.clear();
        self.state.unapplied.clear();
        let changes = std::mem::take(&mut self.changes);
        for change in &changes {
            let decision =
                self.handle_event(host, change.entity, change.field_index, change.value, now);
            if decision.is_suppressed() {
                self.removals.push(*change);
            } else {
                self.note_unapplied(&*host.store, change);
            }
        }
        self.changes = changes;
        self.state.unapplied.clear();
    }

    /// Remembers a presence value handed on in the current message, which
    /// the store will only hold once the host applies the message
    fn note_unapplied(&mut self, store: &dyn EntityStore, change: &FieldChange) {
        let FieldRef::Presence(slot) = self.decoder.layout().classify(change.field_index) else {
            return;
        };
        if let Ok(handle) = store.resolve(change.entity) {
            self.state.unapplied.record(handle, slot, change.value);
        }
    }

    /// `None` if the message could not be rewritten, in which case the clears
    /// removed from it are abandoned and the original must be forwarded
    fn rewrite(&mut self, payload: &[u8]) -> Option<Option<Vec<u8>>> {
        match self.encoder.rewrite(payload, &self.removals) {
            Ok(rewritten) => Some(rewritten),
            Err(err) => {
                warn!("CoalesceEngine: rewrite failed, forwarding original: {}", err);
                self.abandon_removed_clears();
                None
            }
        }
    }

    fn abandon_removed_clears(&mut self) {
        for removal in &self.removals {
            if removal.value != 0 {
                continue;
            }
            let FieldRef::Presence(slot) = self.decoder.layout().classify(removal.field_index)
            else {
                continue;
            };
            if self.state.snapshot.is_local(removal.entity) {
                self.state.local.release(slot);
                self.state.snapshot.set_presence(slot, 0);
            } else {
                self.state.remote.release(removal.entity, slot);
            }
        }
    }
}

cfg_if! {
    if #[cfg(feature = "zstd_support")] {
        impl CoalesceEngine {
            /// Classifies every tracked value of a compressed envelope. A
            /// rewritten envelope is re-sealed, or handed on plain if that fails.
            pub fn on_compressed_message(
                &mut self,
                host: &mut HostContext,
                envelope: &[u8],
            ) -> MessageVerdict {
                if !self.is_active() {
                    return MessageVerdict::Forward;
                }
                let Some(mut decoder) = self.envelope_decoder.take() else {
                    return MessageVerdict::Forward;
                };
                let verdict = self.handle_envelope(host, &mut decoder, envelope);
                self.envelope_decoder = Some(decoder);
                verdict
            }

            fn handle_envelope(
                &mut self,
                host: &mut HostContext,
                decoder: &mut EnvelopeDecoder,
                envelope: &[u8],
            ) -> MessageVerdict {
                let payload = match decoder.try_open(envelope) {
                    Ok(payload) => payload,
                    Err(err) => {
                        debug!("CoalesceEngine: forwarding unopenable envelope: {}", err);
                        return MessageVerdict::Forward;
                    }
                };
                let now = host.clock.now_ms();
                self.sweep(host, now);
                self.track_local_entity(&*host.store);

                self.changes.clear();
                if let Err(err) = self.decoder.decode_concatenated(payload, &mut self.changes) {
                    debug!("CoalesceEngine: forwarding undecodable envelope: {}", err);
                    return MessageVerdict::Forward;
                }
                self.handle_changes(host, now);
                if self.removals.is_empty() {
                    return MessageVerdict::Forward;
                }

                let bytes = match self.rewrite(payload) {
                    Some(Some(bytes)) => bytes,
                    Some(None) => return MessageVerdict::Drop,
                    None => return MessageVerdict::Forward,
                };
                let sealed = self
                    .envelope_encoder
                    .as_mut()
                    .map(|encoder| encoder.try_seal(&bytes));
                match sealed {
                    Some(Ok(sealed)) => MessageVerdict::Rewritten(RewrittenMessage {
                        kind: MessageKind::Compressed,
                        bytes: sealed,
                    }),
                    Some(Err(err)) => {
                        warn!("CoalesceEngine: re-sealing failed, handing on plain: {}", err);
                        MessageVerdict::Rewritten(RewrittenMessage {
                            kind: MessageKind::Plain,
                            bytes,
                        })
                    }
                    None => MessageVerdict::Rewritten(RewrittenMessage {
                        kind: MessageKind::Plain,
                        bytes,
                    }),
                }
            }
        }
    }
}

/// The single place decisions turn into writes and notifications
fn execute(host: &mut HostContext, decision: &Decision) {
    match decision {
        Decision::PassThrough(_) => {}
        Decision::Suppress(Suppression::Restore { payload, notify }) => {
            if let Some(write) = payload {
                replay(host, write);
            }
            if let Some(notification) = notify {
                host.sink.notify(*notification);
            }
        }
        Decision::Suppress(_) => {}
        Decision::ForceReplay(writes) => {
            for write in writes.writes() {
                replay(host, write);
            }
        }
    }
}

fn replay(host: &mut HostContext, write: &SuppressedWrite) {
    let handle = match host.store.resolve(write.entity) {
        Ok(handle) => handle,
        Err(err) => {
            debug!("CoalesceEngine: {:?} not replayed: {}", write, err);
            return;
        }
    };
    if let Err(err) = host.replayer.replay(&mut *host.store, handle, write) {
        warn!("CoalesceEngine: replay of {:?} failed: {}", write, err);
    }
}

fn read_presence(store: &dyn EntityStore, handle: EntityHandle) -> Option<[u32; SLOT_COUNT]> {
    let mut presence = [0; SLOT_COUNT];
    for slot in Slot::all() {
        presence[slot.index()] = store.read_field(handle, Field::Presence(slot)).ok()?;
    }
    Some(presence)
}
