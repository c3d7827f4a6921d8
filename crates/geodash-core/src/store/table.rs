// ── Layer state table ──
//
// One `LayerState` per descriptor, keyed by layer key. Probe results are
// written under the entry's shard lock so `available`, `feature_count`,
// `last_checked_at` and `status` always change together. Every mutation
// republishes the full table in descriptor order. Probe rounds hold the
// round lock, so a manual refresh and a polling tick never interleave.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;

use super::stream::LayerStream;
use crate::error::CoreError;
use crate::model::{LayerDescriptor, LayerState, LayerStatus, LayerView};
use crate::probe::FeatureCountResult;

pub struct LayerTable {
    descriptors: Vec<Arc<LayerDescriptor>>,
    states: DashMap<String, LayerState>,
    snapshot: watch::Sender<Arc<Vec<LayerView>>>,
    round: tokio::sync::Mutex<()>,
}

impl LayerTable {
    /// Build the table with every layer in its initial state.
    ///
    /// Keys must be unique; an empty catalog is allowed.
    pub fn new(descriptors: Vec<LayerDescriptor>) -> Result<Self, CoreError> {
        let mut seen = HashSet::new();
        for d in &descriptors {
            if !seen.insert(d.key.as_str()) {
                return Err(CoreError::Validation {
                    message: format!("duplicate layer key '{}'", d.key),
                });
            }
        }

        let states = descriptors
            .iter()
            .map(|d| (d.key.clone(), LayerState::initial(d)))
            .collect();
        let descriptors: Vec<_> = descriptors.into_iter().map(Arc::new).collect();
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        let table = Self {
            descriptors,
            states,
            snapshot,
            round: tokio::sync::Mutex::new(()),
        };
        table.publish();
        Ok(table)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Descriptors in catalog order.
    pub fn descriptors(&self) -> &[Arc<LayerDescriptor>] {
        &self.descriptors
    }

    pub fn descriptor(&self, key: &str) -> Option<Arc<LayerDescriptor>> {
        self.descriptors.iter().find(|d| d.key == key).cloned()
    }

    pub fn get(&self, key: &str) -> Option<LayerView> {
        let descriptor = self.descriptor(key)?;
        let state = self.states.get(key)?.clone();
        Some(LayerView { descriptor, state })
    }

    /// The last published snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<LayerView>> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> LayerStream {
        LayerStream::new(self.snapshot.subscribe())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    // ── Tracker writes ───────────────────────────────────────────────

    /// Exclusive right to run a probe round. Waiters are served in order.
    pub async fn lock_round(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.round.lock().await
    }

    /// Flag layers as being probed. Other fields are left alone.
    pub fn mark_checking<'a>(&self, keys: impl IntoIterator<Item = &'a str>) {
        for key in keys {
            if let Some(mut state) = self.states.get_mut(key) {
                state.status = LayerStatus::Checking;
            }
        }
        self.publish();
    }

    /// Apply one tick's probe results, each as a single unit per layer.
    ///
    /// Unknown keys are ignored. Publishes once for the whole batch.
    pub fn apply_probes<'a>(
        &self,
        results: impl IntoIterator<Item = (&'a str, &'a FeatureCountResult)>,
        checked_at: DateTime<Utc>,
    ) {
        for (key, result) in results {
            if let Some(mut state) = self.states.get_mut(key) {
                state.available = result.ok;
                state.feature_count = if result.ok { result.count } else { 0 };
                state.last_checked_at = Some(checked_at);
                state.status = if result.ok {
                    LayerStatus::Available
                } else {
                    LayerStatus::Unavailable
                };
                state.last_error.clone_from(&result.error);
            }
        }
        self.publish();
    }

    // ── User writes ──────────────────────────────────────────────────

    /// Show or hide a layer. Unavailable layers cannot be toggled.
    pub fn set_visible(&self, key: &str, visible: bool) -> Result<LayerState, CoreError> {
        let updated = {
            let mut state = self
                .states
                .get_mut(key)
                .ok_or_else(|| CoreError::LayerNotFound { key: key.into() })?;
            if !state.can_toggle() {
                return Err(CoreError::LayerUnavailable { key: key.into() });
            }
            state.visible = visible;
            state.clone()
        };
        self.publish();
        Ok(updated)
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Rebuild the ordered snapshot. Runs inside `send_modify` so
    /// concurrent publishers cannot interleave a stale rebuild.
    fn publish(&self) {
        self.snapshot.send_modify(|snap| {
            let views = self
                .descriptors
                .iter()
                .filter_map(|d| {
                    let state = self.states.get(&d.key)?.clone();
                    Some(LayerView {
                        descriptor: Arc::clone(d),
                        state,
                    })
                })
                .collect();
            *snap = Arc::new(views);
        });
    }
}
