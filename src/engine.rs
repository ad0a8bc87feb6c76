// engine.rs
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::commands::CommandDispatcher;
use crate::devices::Device;
use crate::error::SyncError;
use crate::metrics::SyncObserver;
use crate::models::{DeviceSnapshot, Intent};
use crate::registry::Registry;
use crate::remote::RemoteSource;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub poll_interval: Duration,
    /// Drop a fetch that completes after a newer one was already applied.
    /// Off by default: overlapping fetches race and the last to finish wins.
    pub discard_stale_cycles: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            discard_stale_cycles: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub seq: u64,
    pub fetched: usize,
    /// Adapters that found their device in the snapshot.
    pub merged: usize,
    pub discarded: bool,
}

struct Poller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the adapter registry, the polling schedule and command dispatch.
pub struct SyncEngine {
    registry: Arc<Registry>,
    remote: Arc<dyn RemoteSource>,
    dispatcher: CommandDispatcher,
    observer: Arc<dyn SyncObserver>,
    config: EngineConfig,
    next_seq: AtomicU64,
    last_applied: AtomicU64,
    /// Held across check-and-fan-out while stale cycles are discarded.
    fanout: Mutex<()>,
    poller: Mutex<Option<Poller>>,
}

impl SyncEngine {
    pub fn new(
        remote: Arc<dyn RemoteSource>,
        observer: Arc<dyn SyncObserver>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            dispatcher: CommandDispatcher::new(Arc::clone(&remote), Arc::clone(&observer)),
            remote,
            observer,
            config,
            next_seq: AtomicU64::new(0),
            last_applied: AtomicU64::new(0),
            fanout: Mutex::new(()),
            poller: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub async fn register(&self, adapter: Arc<dyn Device>) {
        self.registry.register(adapter).await;
    }

    /// Sequence number of the newest fetch that completed successfully.
    pub fn last_applied_cycle(&self) -> u64 {
        self.last_applied.load(Ordering::SeqCst)
    }

    pub async fn is_running(&self) -> bool {
        self.poller.lock().await.is_some()
    }

    /// Starts polling. The first cycle runs one period from now. Calling
    /// `start` on a running engine does nothing.
    pub async fn start(self: &Arc<Self>) {
        let mut poller = self.poller.lock().await;
        if poller.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_task(Arc::clone(self), cancel.clone()));
        *poller = Some(Poller { cancel, handle });
        info!(period_ms = self.config.poll_interval.as_millis() as u64, "polling started");
    }

    /// Stops scheduling new cycles. Cycles and commands already in flight
    /// run to completion.
    pub async fn stop(&self) {
        if let Some(poller) = self.poller.lock().await.take() {
            poller.cancel.cancel();
            let _ = poller.handle.await;
            info!("polling stopped");
        }
    }

    /// Runs one fetch-and-fan-out cycle.
    pub async fn tick(&self) -> CycleReport {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self.remote.fetch_devices().await;
        self.apply_cycle(seq, fetched).await
    }

    pub(crate) async fn apply_cycle(
        &self,
        seq: u64,
        fetched: Result<Vec<DeviceSnapshot>, SyncError>,
    ) -> CycleReport {
        let _fanout = if self.config.discard_stale_cycles && fetched.is_ok() {
            Some(self.fanout.lock().await)
        } else {
            None
        };
        let snapshots = match fetched {
            Ok(snapshots) => {
                let newest = self.last_applied.fetch_max(seq, Ordering::SeqCst);
                if self.config.discard_stale_cycles && newest > seq {
                    self.observer.stale_cycle_discarded(seq, newest);
                    return CycleReport {
                        seq,
                        fetched: snapshots.len(),
                        merged: 0,
                        discarded: true,
                    };
                }
                self.observer.cycle_applied(seq, snapshots.len());
                snapshots
            }
            Err(e) => {
                self.observer.fetch_failed(&e);
                Vec::new()
            }
        };

        let mut merged = 0;
        for adapter in self.registry.all().await {
            let slice = snapshots
                .iter()
                .find(|s| s.device_id == adapter.device_id());
            if slice.is_some() {
                merged += 1;
            }
            adapter.merge_from_remote(slice).await;
        }
        debug!(seq, fetched = snapshots.len(), merged, "cycle complete");

        CycleReport {
            seq,
            fetched: snapshots.len(),
            merged,
            discarded: false,
        }
    }

    /// Applies a user intent to every adapter registered under `device_id`
    /// and dispatches what they produce. Returns how many commands were sent.
    pub async fn handle_intent(&self, device_id: &str, intent: Intent) -> Result<usize, SyncError> {
        let adapters = self.registry.find(device_id).await;
        if adapters.is_empty() {
            return Err(SyncError::DeviceNotFound(device_id.to_string()));
        }
        let mut sent = 0;
        for adapter in adapters {
            if let Some(command) = adapter.apply_optimistic(intent.clone()).await? {
                self.dispatcher.send(command);
                sent += 1;
            }
        }
        Ok(sent)
    }
}

/// Fires a cycle every period without waiting for the previous one: a slow
/// fetch overlaps the next tick.
async fn poll_task(engine: Arc<SyncEngine>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(engine.config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    engine.tick().await;
                });
            }
        }
    }
}
