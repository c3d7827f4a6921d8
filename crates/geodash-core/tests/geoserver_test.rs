#![allow(clippy::unwrap_used)]
// End-to-end tests for the dashboard against a mocked GeoServer.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use geodash_core::{
    CountMode, Dashboard, DashboardConfig, FeatureCountResult, LayerStatus, ReportFormat,
    ReportKind,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(count_mode: CountMode) -> (MockServer, Dashboard) {
    let server = MockServer::start().await;
    let config = DashboardConfig {
        base_url: url::Url::parse(&format!("{}/geoserver", server.uri())).unwrap(),
        count_mode,
        ..DashboardConfig::default()
    };
    let dashboard = Dashboard::new(config).unwrap();
    (server, dashboard)
}

fn hits_body(n: u64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs" numberOfFeatures="{n}" timeStamp="2025-08-17T12:00:00.000Z"/>"#
    )
}

async fn mount_hits(server: &MockServer, layer: &str, n: u64) {
    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .and(query_param("typeName", format!("sp_dashboard:{layer}")))
        .and(query_param("resultType", "hits"))
        .respond_with(ResponseTemplate::new(200).set_body_string(hits_body(n)))
        .mount(server)
        .await;
}

// ── Feature counts ──────────────────────────────────────────────────

#[tokio::test]
async fn test_hits_count_makes_layer_available() {
    let (server, dashboard) = setup(CountMode::Auto).await;
    // No JSON GetFeature is mounted, so Auto falls back to hits.
    mount_hits(&server, "ubs", 139).await;

    assert_eq!(
        dashboard.feature_count("ubs").await.unwrap(),
        FeatureCountResult::counted(139)
    );

    dashboard.refresh_now().await;
    let ubs = dashboard.layer("ubs").unwrap();
    assert!(ubs.state.available);
    assert_eq!(ubs.state.feature_count, 139);
    assert_eq!(ubs.state.status, LayerStatus::Available);

    // Nothing answers for the other layers.
    let escolas = dashboard.layer("escolas").unwrap();
    assert!(!escolas.state.available);
}

#[tokio::test]
async fn test_hung_json_count_still_falls_back_to_hits() {
    let server = MockServer::start().await;
    let config = DashboardConfig {
        base_url: url::Url::parse(&format!("{}/geoserver", server.uri())).unwrap(),
        count_mode: CountMode::Auto,
        request_timeout: std::time::Duration::from_millis(500),
        ..DashboardConfig::default()
    };
    let dashboard = Dashboard::new(config).unwrap();

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .and(query_param("typeName", "sp_dashboard:ubs"))
        .and(query_param("outputFormat", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "type": "FeatureCollection", "totalFeatures": 1, "features": [] }))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_hits(&server, "ubs", 139).await;

    dashboard.refresh_now().await;
    let ubs = dashboard.layer("ubs").unwrap();
    assert!(ubs.state.available, "{:?}", ubs.state.last_error);
    assert_eq!(ubs.state.feature_count, 139);
}

#[tokio::test]
async fn test_total_features_count() {
    let (server, dashboard) = setup(CountMode::TotalFeatures).await;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .and(query_param("typeName", "sp_dashboard:escolas"))
        .and(query_param("outputFormat", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FeatureCollection",
            "totalFeatures": 645,
            "features": [{
                "type": "Feature",
                "id": "escolas.1",
                "geometry": { "type": "Point", "coordinates": [-46.63, -23.55] },
                "properties": { "nome": "EE Prudente de Moraes" }
            }]
        })))
        .mount(&server)
        .await;

    assert_eq!(
        dashboard.feature_count("escolas").await.unwrap(),
        FeatureCountResult::counted(645)
    );

    let sample = dashboard.feature_sample("escolas").await.unwrap();
    assert!(sample.ok);
    assert_eq!(sample.total, Some(645));
    assert_eq!(sample.features.len(), 1);
}

#[tokio::test]
async fn test_server_error_marks_every_layer_unavailable() {
    let (server, dashboard) = setup(CountMode::Auto).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("java.lang.NullPointerException"))
        .mount(&server)
        .await;

    let result = dashboard.feature_count("ubs").await.unwrap();
    assert!(!result.ok);
    assert_eq!(result.count, 0);

    dashboard.refresh_now().await;
    for view in dashboard.layers().iter() {
        assert!(!view.state.available, "{} should be unavailable", view.key());
        assert_eq!(view.state.feature_count, 0);
        assert!(view.state.last_error.is_some());
    }
    assert_eq!(dashboard.render_plan().overlays().count(), 0);
}

#[tokio::test]
async fn test_capabilities_probe() {
    let (server, dashboard) = setup(CountMode::Auto).await;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wms"))
        .and(query_param("request", "GetCapabilities"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<WMT_MS_Capabilities><Capability><Layer>\
             <Layer><Name>sp_dashboard:ubs</Name></Layer>\
             </Layer></Capability></WMT_MS_Capabilities>",
        ))
        .mount(&server)
        .await;

    let caps = dashboard.capabilities().await;
    assert!(caps.ok);
    assert_eq!(caps.layer_names, ["sp_dashboard:ubs"]);

    let types = dashboard.feature_types().await;
    assert!(!types.ok);
    assert!(types.layer_names.is_empty());
}

// ── Diagnostics ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_diagnostics_all_green() {
    let (server, dashboard) = setup(CountMode::Auto).await;

    Mock::given(method("GET"))
        .and(path("/geoserver/web"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html/>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wms"))
        .and(query_param("request", "GetCapabilities"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<WMT_MS_Capabilities><Capability><Layer>\
             <Layer><Name>sp_dashboard:municipios_sp</Name></Layer>\
             </Layer></Capability></WMT_MS_Capabilities>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wms"))
        .and(query_param("request", "GetMap"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"\x89PNG".to_vec(), "image/png"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .and(query_param("request", "GetCapabilities"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<WFS_Capabilities><FeatureTypeList>\
             <FeatureType><Name>sp_dashboard:ubs</Name></FeatureType>\
             </FeatureTypeList></WFS_Capabilities>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .and(query_param("request", "GetFeature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FeatureCollection",
            "totalFeatures": 1,
            "features": []
        })))
        .mount(&server)
        .await;

    let report = dashboard.diagnose().await;

    let names: Vec<&str> = report.checks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "GeoServer web",
            "WMS GetCapabilities",
            "WFS GetCapabilities",
            "WFS sample municipios_sp",
            "WFS sample ubs",
            "WFS sample escolas",
            "WMS GetMap municipios_sp",
            "WMS GetMap ubs",
            "WMS GetMap escolas",
        ]
    );
    assert!(report.all_ok(), "failures: {:?}", report.failures().collect::<Vec<_>>());
    assert_eq!(report.checks.last().unwrap().detail, "image/png");
}

#[tokio::test]
async fn test_diagnostics_keep_going_after_failures() {
    let (_server, dashboard) = setup(CountMode::Auto).await;

    let report = dashboard.diagnose().await;

    assert_eq!(report.checks.len(), 9);
    assert_eq!(report.failures().count(), 9);
    assert_eq!(report.checks[0].status, Some(404));
}

// ── Reports ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reports_reflect_probed_state() {
    let (server, dashboard) = setup(CountMode::Hits).await;
    mount_hits(&server, "municipios_sp", 645).await;
    mount_hits(&server, "ubs", 139).await;
    dashboard.refresh_now().await;

    let html = dashboard.generate_report(ReportKind::Status, None).unwrap();
    assert!(html.mime_type.starts_with("text/html"));
    assert!(html.file_name.ends_with(".html"));
    let body = html.content;
    assert!(body.contains("Relatório de Conexão GeoServer"));
    assert!(body.contains("Indisponível"));

    let csv = dashboard
        .generate_report(ReportKind::Inventory, Some(ReportFormat::Csv))
        .unwrap();
    let body = csv.content;
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "chave,camada,nome,geometria,disponivel,feicoes,ultima_verificacao"
    );
    assert!(body.contains("sp_dashboard:ubs,point,true,139,"));
    assert!(body.contains("sp_dashboard:escolas,point,false,0,-"));

    let history = dashboard.report_history();
    assert_eq!(history.len(), 2);
}
