// ── Layer availability tracker ──
//
// A `PollingSession` owns one background task that probes every layer's
// feature count on a fixed interval and writes the results into the
// `LayerTable`. Ticks never overlap: the loop awaits a whole round before
// waiting for the next interval. Shutting down (or dropping) the session
// cancels in-flight probes and discards their results.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::model::LayerDescriptor;
use crate::probe::{FeatureCountResult, Probe};
use crate::store::LayerTable;

/// A running availability poll.
pub struct PollingSession {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
    interval: Duration,
}

impl PollingSession {
    /// Spawn the poll loop. The first round runs immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<P: Probe>(config: &DashboardConfig, probe: Arc<P>, table: Arc<LayerTable>) -> Self {
        let cancel = CancellationToken::new();
        let ticks = Arc::new(AtomicU64::new(0));
        let interval = config.poll_interval;

        let poller = Poller {
            probe,
            table,
            interval,
            request_timeout: config.request_timeout,
            last_probed: HashMap::new(),
        };

        info!(
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            layers = poller.table.len(),
            "layer polling started"
        );
        let handle = tokio::spawn(poll_task(poller, cancel.clone(), Arc::clone(&ticks)));

        Self {
            cancel,
            handle: Some(handle),
            ticks,
            interval,
        }
    }

    /// Completed rounds. A cancelled round is not counted.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the loop and wait for it to exit.
    ///
    /// Probes still in flight are aborted; the table keeps whatever the
    /// last completed round wrote.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "polling task ended abnormally");
            }
        }
        info!(ticks = self.tick_count(), "layer polling stopped");
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Poll loop ────────────────────────────────────────────────────────

async fn poll_task<P: Probe>(mut poller: Poller<P>, cancel: CancellationToken, ticks: Arc<AtomicU64>) {
    let mut interval = tokio::time::interval(poller.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            scheduled = interval.tick() => {
                let due = poller.due_layers(scheduled);
                if due.is_empty() {
                    continue;
                }
                if probe_round(&poller.probe, &poller.table, &due, poller.request_timeout, &cancel)
                    .await
                    .is_none()
                {
                    break;
                }
                ticks.fetch_add(1, Ordering::AcqRel);
            }
        }
    }
}

struct Poller<P> {
    probe: Arc<P>,
    table: Arc<LayerTable>,
    interval: Duration,
    request_timeout: Duration,
    /// Scheduled instant of each layer's last probe.
    last_probed: HashMap<String, Instant>,
}

impl<P: Probe> Poller<P> {
    /// Layers whose own interval has elapsed at `now`, recorded as probed.
    fn due_layers(&mut self, now: Instant) -> Vec<Arc<LayerDescriptor>> {
        let mut due = Vec::new();
        for descriptor in self.table.descriptors() {
            let every = descriptor.poll_interval.unwrap_or(self.interval);
            let is_due = self
                .last_probed
                .get(&descriptor.key)
                .is_none_or(|last| now.duration_since(*last) >= every);
            if is_due {
                self.last_probed.insert(descriptor.key.clone(), now);
                due.push(Arc::clone(descriptor));
            }
        }
        due
    }
}

/// Probe `layers` concurrently and write the results as one batch.
///
/// Waits for any other round on the same table to finish first.
/// Returns the number of layers updated, or `None` if `cancel` fired
/// first; a cancelled round leaves the table's probe fields untouched.
pub(crate) async fn probe_round<P: Probe>(
    probe: &Arc<P>,
    table: &LayerTable,
    layers: &[Arc<LayerDescriptor>],
    request_timeout: Duration,
    cancel: &CancellationToken,
) -> Option<usize> {
    let _round = tokio::select! {
        biased;
        () = cancel.cancelled() => return None,
        guard = table.lock_round() => guard,
    };
    table.mark_checking(layers.iter().map(|d| d.key.as_str()));

    // Auto counting may fall back to a second request after the first
    // one times out; each attempt gets a full request timeout.
    let budget = request_timeout.saturating_mul(probe.count_attempts().max(1));
    let probes = layers.iter().cloned().map(|d| {
        let probe = Arc::clone(probe);
        async move {
            let count = probe.feature_count(&d.qualified_name);
            let result = match tokio::time::timeout(budget, count).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(layer = %d.key, "feature count probe timed out");
                    FeatureCountResult::failed(format!("timed out after {}ms", budget.as_millis()))
                }
            };
            (d, result)
        }
    });

    let results = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!("probe round cancelled");
            return None;
        }
        results = join_all(probes) => results,
    };

    table.apply_probes(
        results.iter().map(|(d, r)| (d.key.as_str(), r)),
        Utc::now(),
    );
    debug!(
        layers = results.len(),
        available = results.iter().filter(|(_, r)| r.ok).count(),
        "probe round complete"
    );
    Some(results.len())
}
