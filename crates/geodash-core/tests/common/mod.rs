// Shared test doubles for geodash-core integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use geodash_core::{
    CapabilitiesResult, DashboardConfig, Feature, FeatureCountResult, FeatureInfoQuery,
    FeatureInfoResponse, FeatureSampleResult, Probe,
};
use serde_json::json;
use tokio::time::Instant;

/// Scripted [`Probe`] that records when each call started and ended.
///
/// Clones share state, so a test can keep a handle after moving one into
/// a dashboard.
#[derive(Clone, Default)]
pub struct MockProbe {
    inner: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    counts: Mutex<HashMap<String, FeatureCountResult>>,
    count_delays: Mutex<HashMap<String, Duration>>,
    info: Mutex<HashMap<String, (Duration, FeatureInfoResponse)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    count_calls: Mutex<Vec<(String, Instant, Instant)>>,
    info_calls: Mutex<Vec<String>>,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every layer in `layers` answers with `count`.
    pub fn with_counts(self, layers: &[&str], count: u64) -> Self {
        for layer in layers {
            self.set_count(layer, FeatureCountResult::counted(count));
        }
        self
    }

    pub fn set_count(&self, layer: &str, result: FeatureCountResult) {
        self.inner.counts.lock().unwrap().insert(qualified(layer), result);
    }

    pub fn with_count_delay(self, layer: &str, delay: Duration) -> Self {
        self.inner.count_delays.lock().unwrap().insert(qualified(layer), delay);
        self
    }

    pub fn with_info(self, layer: &str, delay: Duration, response: FeatureInfoResponse) -> Self {
        self.inner
            .info
            .lock()
            .unwrap()
            .insert(qualified(layer), (delay, response));
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    /// `(layer, started, finished)` for every completed count call.
    pub fn count_calls(&self) -> Vec<(String, Instant, Instant)> {
        self.inner.count_calls.lock().unwrap().clone()
    }

    pub fn count_calls_for(&self, layer: &str) -> usize {
        let layer = qualified(layer);
        self.count_calls()
            .iter()
            .filter(|(l, _, _)| *l == layer)
            .count()
    }

    pub fn info_calls(&self) -> Vec<String> {
        self.inner.info_calls.lock().unwrap().clone()
    }
}

impl Probe for MockProbe {
    async fn capabilities(&self) -> CapabilitiesResult {
        CapabilitiesResult {
            ok: true,
            layer_names: self.inner.counts.lock().unwrap().keys().cloned().collect(),
            error: None,
        }
    }

    async fn feature_types(&self) -> CapabilitiesResult {
        self.capabilities().await
    }

    async fn feature_count(&self, layer: &str) -> FeatureCountResult {
        let started = Instant::now();
        let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.inner.count_delays.lock().unwrap().get(layer).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.count_calls
            .lock()
            .unwrap()
            .push((layer.to_owned(), started, Instant::now()));

        self.inner.counts
            .lock()
            .unwrap()
            .get(layer)
            .cloned()
            .unwrap_or_else(|| FeatureCountResult::failed("HTTP 404"))
    }

    async fn feature_sample(&self, layer: &str) -> FeatureSampleResult {
        let count = self.feature_count(layer).await;
        FeatureSampleResult {
            ok: count.ok,
            features: Vec::new(),
            total: count.ok.then_some(count.count),
            error: count.error,
        }
    }

    async fn feature_info(&self, layer: &str, _query: FeatureInfoQuery) -> FeatureInfoResponse {
        self.inner.info_calls.lock().unwrap().push(layer.to_owned());
        let scripted = self.inner.info.lock().unwrap().get(layer).cloned();
        match scripted {
            Some((delay, response)) => {
                tokio::time::sleep(delay).await;
                response
            }
            None => FeatureInfoResponse::found(Vec::new()),
        }
    }
}

pub fn qualified(layer: &str) -> String {
    format!("sp_dashboard:{layer}")
}

pub fn feature(id: &str, geometry: &str, nome: &str) -> Feature {
    serde_json::from_value(json!({
        "type": "Feature",
        "id": id,
        "geometry": { "type": geometry, "coordinates": [] },
        "properties": { "nome": nome }
    }))
    .unwrap()
}

pub fn config() -> DashboardConfig {
    DashboardConfig::default()
}
