#![allow(clippy::unwrap_used)]
// Integration tests for `OgcClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use geodash_api::{BoundingBox, Error, FailureKind, FeatureInfoQuery, GetMapRequest, OgcClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, OgcClient) {
    let server = MockServer::start().await;
    let base = url::Url::parse(&format!("{}/geoserver", server.uri())).unwrap();
    let client = OgcClient::with_client(reqwest::Client::new(), base, "sp_dashboard".into()).unwrap();
    (server, client)
}

fn hits_body(n: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs" numberOfFeatures="{n}" timeStamp="2025-08-17T12:00:00.000Z"/>"#
    )
}

// ── Capabilities ────────────────────────────────────────────────────

#[tokio::test]
async fn test_wms_capabilities_lists_named_layers() {
    let (server, client) = setup().await;

    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMT_MS_Capabilities version="1.1.0">
  <Capability>
    <Layer>
      <Title>GeoServer WMS</Title>
      <Layer queryable="1"><Name>sp_dashboard:municipios_sp</Name></Layer>
      <Layer queryable="1"><Name>sp_dashboard:ubs</Name></Layer>
      <Layer queryable="1"><Name>sp_dashboard:escolas</Name></Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wms"))
        .and(query_param("service", "WMS"))
        .and(query_param("request", "GetCapabilities"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let names = client.wms_capabilities().await.unwrap();
    assert_eq!(
        names,
        vec![
            "sp_dashboard:municipios_sp",
            "sp_dashboard:ubs",
            "sp_dashboard:escolas"
        ]
    );
}

#[tokio::test]
async fn test_wfs_capabilities_lists_feature_types() {
    let (server, client) = setup().await;

    let body = r#"<WFS_Capabilities version="1.0.0"><FeatureTypeList>
<FeatureType><Name>sp_dashboard:ubs</Name></FeatureType>
</FeatureTypeList></WFS_Capabilities>"#;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .and(query_param("service", "WFS"))
        .and(query_param("version", "1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    assert_eq!(client.wfs_capabilities().await.unwrap(), vec!["sp_dashboard:ubs"]);
}

#[tokio::test]
async fn test_capabilities_without_layers_is_protocol_mismatch() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wms"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Bad gateway</html>"))
        .mount(&server)
        .await;

    let err = client.wms_capabilities().await.unwrap_err();
    assert!(matches!(err, Error::ProtocolMismatch { .. }));
    assert_eq!(err.failure_kind(), FailureKind::Protocol);
}

// ── Feature counts ──────────────────────────────────────────────────

#[tokio::test]
async fn test_hits_reads_number_of_features() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .and(query_param("typeName", "sp_dashboard:ubs"))
        .and(query_param("resultType", "hits"))
        .and(query_param("version", "1.1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(hits_body("139")))
        .mount(&server)
        .await;

    assert_eq!(client.hits("ubs").await.unwrap(), 139);
}

#[tokio::test]
async fn test_hits_zero_is_a_count() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .and(query_param("resultType", "hits"))
        .respond_with(ResponseTemplate::new(200).set_body_string(hits_body("0")))
        .mount(&server)
        .await;

    assert_eq!(client.hits("escolas").await.unwrap(), 0);
}

#[tokio::test]
async fn test_hits_server_error_is_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("java.lang.NullPointerException"))
        .mount(&server)
        .await;

    let err = client.hits("ubs").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.is_transient());
    assert_eq!(err.failure_kind(), FailureKind::Network);
}

#[tokio::test]
async fn test_hits_without_attribute_is_protocol_mismatch() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<ok/>"))
        .mount(&server)
        .await;

    let err = client.hits("ubs").await.unwrap_err();
    assert!(matches!(err, Error::ProtocolMismatch { .. }));
}

#[tokio::test]
async fn test_get_features_reads_total_features() {
    let (server, client) = setup().await;

    let body = json!({
        "type": "FeatureCollection",
        "totalFeatures": 645,
        "features": [{
            "type": "Feature",
            "id": "municipios_sp.1",
            "geometry": { "type": "MultiPolygon", "coordinates": [] },
            "properties": { "nome": "São Paulo", "populacao": 11451245 }
        }]
    });

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .and(query_param("request", "GetFeature"))
        .and(query_param("typeName", "sp_dashboard:municipios_sp"))
        .and(query_param("maxFeatures", "1"))
        .and(query_param("outputFormat", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let fc = client.get_features("municipios_sp", 1).await.unwrap();
    assert_eq!(fc.total(), Some(645));
    assert_eq!(fc.features.len(), 1);
    assert_eq!(fc.features[0].geometry_type(), Some("MultiPolygon"));
    assert_eq!(fc.features[0].properties["nome"], "São Paulo");
}

#[tokio::test]
async fn test_service_exception_with_200_is_an_error() {
    let (server, client) = setup().await;

    let body = r#"<?xml version="1.0" ?>
<ServiceExceptionReport version="1.2.0">
  <ServiceException code="InvalidParameterValue">
    Feature type sp_dashboard:nada unknown
  </ServiceException>
</ServiceExceptionReport>"#;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    match client.get_features("nada", 1).await.unwrap_err() {
        Error::ServiceException { message } => {
            assert_eq!(message, "Feature type sp_dashboard:nada unknown");
        }
        other => panic!("expected ServiceException, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_json_keeps_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wfs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    match client.get_features("ubs", 1).await.unwrap_err() {
        Error::Deserialization { body, .. } => assert_eq!(body, "{not json"),
        other => panic!("expected Deserialization, got {other:?}"),
    }
}

// ── WMS GetMap / GetFeatureInfo ─────────────────────────────────────

#[tokio::test]
async fn test_feature_info_sends_pixel_query() {
    let (server, client) = setup().await;

    let body = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "id": "ubs.42",
            "geometry": { "type": "Point", "coordinates": [-46.63, -23.55] },
            "properties": { "nome": "UBS Sé", "leitos": 12 }
        }]
    });

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wms"))
        .and(query_param("request", "GetFeatureInfo"))
        .and(query_param("query_layers", "sp_dashboard:ubs"))
        .and(query_param("x", "128"))
        .and(query_param("y", "64"))
        .and(query_param("info_format", "application/json"))
        .and(query_param("feature_count", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let query = FeatureInfoQuery {
        bbox: BoundingBox::new(-48.0, -24.0, -45.0, -21.0),
        width: 256,
        height: 256,
        x: 128,
        y: 64,
        feature_count: 1,
    };
    let fc = client.feature_info("ubs", &query).await.unwrap();
    assert_eq!(fc.features.len(), 1);
    assert_eq!(fc.features[0].id.as_deref(), Some("ubs.42"));
    assert_eq!(fc.features[0].properties["leitos"], 12);
}

#[tokio::test]
async fn test_get_map_rejects_non_image_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wms"))
        .and(query_param("request", "GetMap"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/vnd.ogc.se_xml")
                .set_body_string(
                    "<ServiceExceptionReport><ServiceException>Could not find layer</ServiceException></ServiceExceptionReport>",
                ),
        )
        .mount(&server)
        .await;

    let req = GetMapRequest {
        layers: vec!["nada".into()],
        styles: vec![String::new()],
        bbox: BoundingBox::new(-48.0, -24.0, -45.0, -21.0),
        width: 256,
        height: 256,
        transparent: true,
    };
    let err = client.get_map(&req).await.unwrap_err();
    assert!(matches!(err, Error::ServiceException { .. }));
}

#[tokio::test]
async fn test_get_map_returns_content_type() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/geoserver/sp_dashboard/wms"))
        .and(query_param("request", "GetMap"))
        .and(query_param("layers", "sp_dashboard:ubs"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .mount(&server)
        .await;

    let req = GetMapRequest {
        layers: vec!["ubs".into()],
        styles: vec![String::new()],
        bbox: BoundingBox::new(-48.0, -24.0, -45.0, -21.0),
        width: 256,
        height: 256,
        transparent: true,
    };
    assert_eq!(client.get_map(&req).await.unwrap(), "image/png");
}

// ── Reachability ────────────────────────────────────────────────────

#[tokio::test]
async fn test_ping_reports_status_without_failing() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/geoserver/web"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(client.ping().await.unwrap(), 404);
}

#[tokio::test]
async fn test_connection_refused_is_network_failure() {
    let base = url::Url::parse("http://127.0.0.1:1/geoserver").unwrap();
    let client = OgcClient::with_client(reqwest::Client::new(), base, "sp_dashboard".into()).unwrap();
    let err = client.hits("ubs").await.unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::Network);
}
