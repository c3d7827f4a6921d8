//! Direct GeoServer probes: capabilities, feature types, counts, samples.

use geodash_core::{CapabilitiesResult, Dashboard, Feature, FeatureCountResult};
use tabled::Tabled;

use crate::cli::{GlobalOpts, ProbeArgs, ProbeCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct NameRow {
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Geometry")]
    geometry: String,
    #[tabled(rename = "Attributes")]
    attributes: String,
}

impl From<&Feature> for FeatureRow {
    fn from(f: &Feature) -> Self {
        let attributes = f
            .properties
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            id: f.id.clone().unwrap_or_default(),
            geometry: f.geometry_type().unwrap_or("-").to_owned(),
            attributes,
        }
    }
}

fn names_or_error(result: CapabilitiesResult) -> Result<Vec<String>, CliError> {
    if result.ok {
        Ok(result.layer_names)
    } else {
        Err(CliError::Protocol {
            message: result.error.unwrap_or_else(|| "capabilities request failed".into()),
        })
    }
}

fn print_names(names: &[String], global: &GlobalOpts) {
    let out = output::render_list(
        &global.output,
        names,
        |n| NameRow { name: n.clone() },
        String::clone,
    );
    output::print_output(&out, global.quiet);
}

pub async fn handle(
    dashboard: &Dashboard,
    args: ProbeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProbeCommand::Capabilities => {
            let names = names_or_error(dashboard.capabilities().await)?;
            print_names(&names, global);
            Ok(())
        }

        ProbeCommand::FeatureTypes => {
            let names = names_or_error(dashboard.feature_types().await)?;
            print_names(&names, global);
            Ok(())
        }

        ProbeCommand::Count { key } => {
            let result = dashboard.feature_count(&key).await?;
            if !result.ok {
                return Err(CliError::Protocol {
                    message: result.error.unwrap_or_else(|| format!("count of '{key}' failed")),
                });
            }
            let out = output::render_single(
                &global.output,
                &result,
                |r: &FeatureCountResult| format!("{key}: {} features", r.count),
                |r| r.count.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProbeCommand::Sample { key } => {
            let result = dashboard.feature_sample(&key).await?;
            if !result.ok {
                return Err(CliError::Protocol {
                    message: result.error.unwrap_or_else(|| format!("sample of '{key}' failed")),
                });
            }
            let out = output::render_list(
                &global.output,
                &result.features,
                |f| FeatureRow::from(f),
                |f| f.id.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
