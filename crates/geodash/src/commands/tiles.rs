//! `tiles`: the layer stack a map would draw, optionally as GetMap URLs.

use geodash_core::{BoundingBox, Dashboard, TileLayerSpec};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, TilesArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct TileRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Layer")]
    layer: String,
    #[tabled(rename = "Opacity")]
    opacity: String,
    #[tabled(rename = "Source")]
    source: String,
}

impl TileRow {
    fn new(spec: &TileLayerSpec) -> Self {
        match spec {
            TileLayerSpec::Base { url_template, .. } => Self {
                kind: "base",
                layer: "-".into(),
                opacity: "1.00".into(),
                source: url_template.clone(),
            },
            TileLayerSpec::Wms(wms) => Self {
                kind: "wms",
                layer: wms.layers.clone(),
                opacity: format!("{:.2}", wms.opacity),
                source: wms.endpoint.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct MapUrl {
    key: String,
    url: String,
}

#[derive(Tabled)]
struct MapUrlRow {
    #[tabled(rename = "Layer")]
    key: String,
    #[tabled(rename = "GetMap")]
    url: String,
}

pub async fn handle(
    dashboard: &Dashboard,
    args: TilesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let bbox = args
        .bbox
        .as_deref()
        .map(str::parse::<BoundingBox>)
        .transpose()
        .map_err(|reason| CliError::Validation {
            field: "bbox".into(),
            reason,
        })?;

    util::refresh(dashboard, global).await;
    util::hide_layers(dashboard, &args.hide)?;
    let plan = dashboard.render_plan();

    let Some(bbox) = bbox else {
        // Rows follow draw order, base map first.
        let out = output::render_list(
            &global.output,
            &plan.layers,
            TileRow::new,
            |spec| match spec {
                TileLayerSpec::Base { .. } => "base".into(),
                TileLayerSpec::Wms(wms) => wms.key.clone(),
            },
        );
        output::print_output(&out, global.quiet);
        return Ok(());
    };

    let urls = plan
        .overlays()
        .map(|spec| {
            let url = dashboard.get_map_url(spec, bbox, args.width, args.height)?;
            Ok(MapUrl {
                key: spec.key.clone(),
                url: url.to_string(),
            })
        })
        .collect::<Result<Vec<_>, CliError>>()?;

    let out = output::render_list(
        &global.output,
        &urls,
        |u| MapUrlRow {
            key: u.key.clone(),
            url: u.url.clone(),
        },
        |u| u.url.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
