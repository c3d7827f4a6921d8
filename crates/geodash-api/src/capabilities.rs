// OGC response body parsing
//
// GetCapabilities documents are read with a real XML parser. The text
// scanners below are compatibility shims for servers that emit documents
// roxmltree refuses (truncated bodies, broken entities) and for the legacy
// `resultType=hits` response, whose only payload is an attribute.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, ParsingOptions};
use tracing::debug;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Name>\s*([^<]+?)\s*</Name>").expect("static regex"));

static NUMBER_OF_FEATURES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"numberOfFeatures="(\d+)""#).expect("static regex"));

static NUMBER_MATCHED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"numberMatched="(\d+)""#).expect("static regex"));

static SERVICE_EXCEPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:\w+:)?ServiceException\b[^>]*>(.*?)</(?:\w+:)?ServiceException>")
        .expect("static regex")
});

/// Names of every named `<Layer>` in a WMS GetCapabilities document.
///
/// Container layers without a `<Name>` (the root layer usually has only a
/// `<Title>`) are skipped. Order follows the document.
pub fn parse_layer_names(body: &str) -> Vec<String> {
    match parse_document(body) {
        Ok(doc) => named_children(&doc, "Layer"),
        Err(e) => {
            debug!(error = %e, "capabilities not well-formed, falling back to text scan");
            scan_names(body, "Layer")
        }
    }
}

/// Names of every `<FeatureType>` in a WFS GetCapabilities document.
pub fn parse_feature_type_names(body: &str) -> Vec<String> {
    match parse_document(body) {
        Ok(doc) => named_children(&doc, "FeatureType"),
        Err(e) => {
            debug!(error = %e, "capabilities not well-formed, falling back to text scan");
            scan_names(body, "FeatureType")
        }
    }
}

/// Extract `numberOfFeatures="N"` from a `resultType=hits` response.
///
/// WFS 2.0 servers answer with `numberMatched` instead; both are accepted.
pub fn parse_number_of_features(body: &str) -> Option<u64> {
    NUMBER_OF_FEATURES_RE
        .captures(body)
        .or_else(|| NUMBER_MATCHED_RE.captures(body))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// The message of an OGC `ServiceException`, if the body is one.
pub fn service_exception(body: &str) -> Option<String> {
    SERVICE_EXCEPTION_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_owned())
}

fn parse_document(body: &str) -> Result<Document<'_>, roxmltree::Error> {
    // GeoServer's 1.1.0 capabilities carry a DOCTYPE pointing at the WMS DTD.
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(body, options)
}

/// For each `container` element, the text of its direct `<Name>` child.
/// Tag names are matched without namespace so WMS 1.3.0 documents work too.
fn named_children(doc: &Document<'_>, container: &str) -> Vec<String> {
    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == container)
        .filter_map(|layer| {
            layer
                .children()
                .find(|c| c.is_element() && c.tag_name().name() == "Name")
                .and_then(|name| name.text())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        })
        .collect()
}

/// Tolerant scan: split on each `<container` opening tag and take the first
/// `<Name>` before the segment closes or a nested container starts.
fn scan_names(body: &str, container: &str) -> Vec<String> {
    let open = format!("<{container}");
    let close = format!("</{container}>");

    body.split(open.as_str())
        .skip(1)
        .filter(|segment| segment.starts_with(|c: char| c == '>' || c.is_whitespace()))
        .filter_map(|segment| {
            let own = segment.split(close.as_str()).next().unwrap_or(segment);
            NAME_RE
                .captures(own)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_owned())
        })
        .collect()
}
