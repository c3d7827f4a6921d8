//! `info`: identify the feature under a map position.

use geodash_core::{Dashboard, LatLng, MapClick, Resolution};

use crate::cli::{GlobalOpts, InfoArgs};
use crate::error::CliError;
use crate::output;

use super::util;

fn validate(args: &InfoArgs) -> Result<LatLng, CliError> {
    if !(-90.0..=90.0).contains(&args.lat) {
        return Err(CliError::Validation {
            field: "lat".into(),
            reason: format!("{} is outside -90..90", args.lat),
        });
    }
    if !(-180.0..=180.0).contains(&args.lng) {
        return Err(CliError::Validation {
            field: "lng".into(),
            reason: format!("{} is outside -180..180", args.lng),
        });
    }
    Ok(LatLng {
        lat: args.lat,
        lng: args.lng,
    })
}

fn detail(resolution: &Resolution, at: LatLng) -> String {
    match resolution {
        Resolution::Found(found) => {
            let mut pairs = vec![
                ("Layer", found.source_layer_key.clone()),
                ("Feature", found.feature_id.clone().unwrap_or_else(|| "-".into())),
                ("Geometry", found.geometry_hint.clone().unwrap_or_else(|| "-".into())),
            ];
            pairs.extend(found.attributes.iter().map(|(k, v)| (k.as_str(), v.to_string())));
            output::detail_lines(&pairs)
        }
        Resolution::NothingFound => format!("No feature found at {:.5}, {:.5}", at.lat, at.lng),
        Resolution::Failed { reason } => format!("Lookup failed: {reason}"),
    }
}

pub async fn handle(
    dashboard: &Dashboard,
    args: InfoArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let at = validate(&args)?;

    // Point layers are only queried once a probe has found them.
    util::refresh(dashboard, global).await;
    util::hide_layers(dashboard, &args.hide)?;

    dashboard.pan_to(at);
    if let Some(zoom) = args.zoom {
        dashboard.set_zoom(zoom);
    }
    let viewport = dashboard.camera().viewport(args.width, args.height);

    let pb = util::spinner("Querying features...", global);
    let resolution = dashboard.click(MapClick { at, viewport }).await;
    pb.finish_and_clear();
    let resolution = resolution?;

    if let Resolution::Failed { reason } = resolution {
        return Err(CliError::Protocol { message: reason });
    }

    let out = output::render_single(
        &global.output,
        &resolution,
        |r| detail(r, at),
        |r| match r {
            Resolution::Found(found) => found.feature_id.clone().unwrap_or_default(),
            Resolution::NothingFound | Resolution::Failed { .. } => String::new(),
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
