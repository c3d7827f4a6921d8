// Integration tests for the availability tracker, driven by a scripted
// probe under paused tokio time.
#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockProbe, config};
use geodash_core::{
    CoreError, Dashboard, DashboardConfig, FeatureCountResult, GeometryKind, LayerDescriptor,
    LayerStatus, LayerTable, PollingSession,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn single_layer_config(poll: u64, timeout: u64) -> DashboardConfig {
    DashboardConfig {
        poll_interval: Duration::from_secs(poll),
        request_timeout: Duration::from_secs(timeout),
        layers: vec![LayerDescriptor::new(
            "sp_dashboard",
            "ubs",
            "Unidades Básicas de Saúde",
            GeometryKind::Point,
        )],
        ..config()
    }
}

fn start(config: &DashboardConfig, probe: &Arc<MockProbe>) -> (PollingSession, Arc<LayerTable>) {
    let table = Arc::new(LayerTable::new(config.layers.clone()).unwrap());
    let session = PollingSession::start(config, Arc::clone(probe), Arc::clone(&table));
    (session, table)
}

// ── Scheduling ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn first_round_runs_immediately() {
    let config = single_layer_config(30, 10);
    let probe = Arc::new(MockProbe::new().with_counts(&["ubs"], 139));
    let (session, table) = start(&config, &probe);

    tokio::time::sleep(Duration::from_millis(1)).await;

    let ubs = table.get("ubs").unwrap();
    assert!(ubs.state.available);
    assert_eq!(ubs.state.feature_count, 139);
    assert_eq!(ubs.state.status, LayerStatus::Available);
    assert!(ubs.state.last_checked_at.is_some());
    assert_eq!(session.tick_count(), 1);
    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn slow_rounds_never_overlap() {
    let config = single_layer_config(30, 60);
    let probe = Arc::new(
        MockProbe::new()
            .with_counts(&["ubs"], 10)
            .with_count_delay("ubs", Duration::from_secs(45)),
    );
    let (session, _table) = start(&config, &probe);

    tokio::time::sleep(Duration::from_secs(200)).await;
    session.shutdown().await;

    let calls = probe.count_calls();
    assert!(calls.len() >= 3, "expected several rounds, got {}", calls.len());
    assert_eq!(probe.max_in_flight(), 1);
    for pair in calls.windows(2) {
        let (_, _, prev_end) = pair[0];
        let (_, next_start, _) = pair[1];
        assert!(next_start >= prev_end, "round started before the previous one finished");
    }
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_waits_for_polling_round() {
    let config = single_layer_config(30, 60);
    let probe = MockProbe::new()
        .with_counts(&["ubs"], 139)
        .with_count_delay("ubs", Duration::from_secs(20));
    let calls = probe.clone();
    let dashboard = Dashboard::with_probe(config, probe).unwrap();

    dashboard.start().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(dashboard.refresh_now().await, 1);
    dashboard.shutdown().await;

    assert_eq!(calls.max_in_flight(), 1);
    let calls = calls.count_calls();
    assert_eq!(calls.len(), 2);
    let (_, _, polled_end) = calls[0];
    let (_, refresh_start, _) = calls[1];
    assert!(refresh_start >= polled_end, "refresh overlapped a polling round");
    assert_eq!(dashboard.layer("ubs").unwrap().state.feature_count, 139);
}

#[tokio::test(start_paused = true)]
async fn layers_in_a_round_are_probed_concurrently() {
    let config = DashboardConfig {
        poll_interval: Duration::from_secs(30),
        request_timeout: Duration::from_secs(10),
        ..config()
    };
    let probe = Arc::new(
        MockProbe::new()
            .with_counts(&["municipios_sp", "ubs", "escolas"], 1)
            .with_count_delay("municipios_sp", Duration::from_secs(2))
            .with_count_delay("ubs", Duration::from_secs(2))
            .with_count_delay("escolas", Duration::from_secs(2)),
    );
    let (session, _table) = start(&config, &probe);

    tokio::time::sleep(Duration::from_secs(5)).await;
    session.shutdown().await;

    assert_eq!(probe.max_in_flight(), 3);
    assert_eq!(probe.count_calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn layer_interval_overrides_session_interval() {
    let config = DashboardConfig {
        poll_interval: Duration::from_secs(30),
        request_timeout: Duration::from_secs(10),
        layers: vec![
            LayerDescriptor::new("sp_dashboard", "ubs", "UBS", GeometryKind::Point),
            LayerDescriptor::new("sp_dashboard", "escolas", "Escolas", GeometryKind::Point)
                .with_poll_interval(Duration::from_secs(90)),
        ],
        ..config()
    };
    let probe = Arc::new(MockProbe::new().with_counts(&["ubs", "escolas"], 3));
    let (session, _table) = start(&config, &probe);

    // Ticks at 0, 30, ..., 180.
    tokio::time::sleep(Duration::from_secs(185)).await;
    session.shutdown().await;

    assert_eq!(probe.count_calls_for("ubs"), 7);
    assert_eq!(probe.count_calls_for("escolas"), 3);
}

// ── Probe outcomes ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn failed_probe_marks_layer_unavailable_and_locks_toggle() {
    // municipios_sp starts assumed available; escolas has no scripted count.
    let probe = MockProbe::new().with_counts(&["ubs"], 0);
    probe.set_count("municipios_sp", FeatureCountResult::failed("HTTP 500"));
    let dashboard = Dashboard::with_probe(config(), probe).unwrap();

    assert!(dashboard.layer("municipios_sp").unwrap().state.available);
    assert!(!dashboard.layer("ubs").unwrap().state.available);

    assert_eq!(dashboard.refresh_now().await, 3);

    let municipios = dashboard.layer("municipios_sp").unwrap();
    assert!(!municipios.state.available);
    assert_eq!(municipios.state.feature_count, 0);
    assert_eq!(municipios.state.status, LayerStatus::Unavailable);
    assert_eq!(municipios.state.last_error.as_deref(), Some("HTTP 500"));

    let escolas = dashboard.layer("escolas").unwrap();
    assert!(!escolas.state.available);
    assert!(matches!(
        dashboard.set_visible("escolas", false),
        Err(CoreError::LayerUnavailable { .. })
    ));
    // The rejected toggle left visibility alone.
    assert!(dashboard.layer("escolas").unwrap().state.visible);
}

#[tokio::test(start_paused = true)]
async fn zero_features_is_still_available() {
    let probe = MockProbe::new().with_counts(&["municipios_sp", "ubs", "escolas"], 0);
    let dashboard = Dashboard::with_probe(config(), probe).unwrap();
    dashboard.refresh_now().await;

    let ubs = dashboard.layer("ubs").unwrap();
    assert!(ubs.state.available);
    assert_eq!(ubs.state.feature_count, 0);

    let state = dashboard.toggle("ubs").unwrap();
    assert!(!state.visible);
    let state = dashboard.toggle("ubs").unwrap();
    assert!(state.visible);
    assert!(state.available);
}

#[tokio::test(start_paused = true)]
async fn hung_probe_times_out() {
    let config = single_layer_config(30, 10);
    let probe = MockProbe::new()
        .with_counts(&["ubs"], 42)
        .with_count_delay("ubs", Duration::from_secs(20));
    let dashboard = Dashboard::with_probe(config, probe).unwrap();

    dashboard.refresh_now().await;

    let ubs = dashboard.layer("ubs").unwrap();
    assert!(!ubs.state.available);
    assert_eq!(ubs.state.feature_count, 0);
    assert!(ubs.state.last_error.unwrap().contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn unknown_layer_is_reported() {
    let dashboard = Dashboard::with_probe(config(), MockProbe::new()).unwrap();
    assert!(matches!(
        dashboard.set_visible("hospitais", true),
        Err(CoreError::LayerNotFound { .. })
    ));
    assert!(matches!(
        dashboard.feature_count("hospitais").await,
        Err(CoreError::LayerNotFound { .. })
    ));
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn shutdown_discards_in_flight_round() {
    let config = single_layer_config(30, 120);
    let probe = Arc::new(
        MockProbe::new()
            .with_counts(&["ubs"], 139)
            .with_count_delay("ubs", Duration::from_secs(100)),
    );
    let (session, table) = start(&config, &probe);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(table.get("ubs").unwrap().state.status, LayerStatus::Checking);
    assert_eq!(session.tick_count(), 0);
    session.shutdown().await;

    tokio::time::sleep(Duration::from_secs(200)).await;
    let ubs = table.get("ubs").unwrap();
    assert!(!ubs.state.available);
    assert!(ubs.state.last_checked_at.is_none());
    assert!(probe.count_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_session_stops_polling() {
    let config = single_layer_config(30, 10);
    let probe = Arc::new(MockProbe::new().with_counts(&["ubs"], 1));
    let (session, _table) = start(&config, &probe);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(session.is_running());
    drop(session);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(probe.count_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dashboard_start_is_idempotent() {
    let probe = MockProbe::new().with_counts(&["municipios_sp", "ubs", "escolas"], 2);
    let dashboard = Dashboard::with_probe(config(), probe).unwrap();

    dashboard.start().await;
    dashboard.start().await;
    assert!(dashboard.is_polling().await);

    tokio::time::sleep(Duration::from_secs(65)).await;
    // Rounds at 0, 30 and 60 from a single session.
    assert_eq!(dashboard.tick_count().await, Some(3));

    dashboard.shutdown().await;
    assert!(!dashboard.is_polling().await);
    assert_eq!(dashboard.tick_count().await, None);
}
