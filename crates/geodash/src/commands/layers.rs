//! Layer command handlers.

use geodash_core::{Dashboard, LayerStatus, LayerView};
use tabled::Tabled;

use crate::cli::{GlobalOpts, LayersArgs, LayersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct LayerRow {
    #[tabled(rename = "Layer")]
    key: String,
    #[tabled(rename = "Name")]
    title: String,
    #[tabled(rename = "Geometry")]
    geometry: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Features")]
    features: String,
    #[tabled(rename = "Visible")]
    visible: String,
    #[tabled(rename = "Checked")]
    checked: String,
}

impl LayerRow {
    fn new(view: &LayerView, color: bool) -> Self {
        let state = &view.state;
        Self {
            key: view.descriptor.key.clone(),
            title: view.descriptor.title.clone(),
            geometry: view.descriptor.geometry.to_string(),
            status: status_label(view, color),
            features: if state.available {
                state.feature_count.to_string()
            } else {
                "-".into()
            },
            visible: if state.visible { "yes" } else { "no" }.into(),
            checked: output::age(state.last_checked_at),
        }
    }
}

fn status_label(view: &LayerView, color: bool) -> String {
    match view.state.status {
        LayerStatus::Checking => "checking".into(),
        _ => output::availability_label(view.state.available, color),
    }
}

fn detail(view: &LayerView, color: bool) -> String {
    let d = &view.descriptor;
    let s = &view.state;
    let mut pairs = vec![
        ("Layer", d.key.clone()),
        ("Name", d.title.clone()),
        ("Qualified", d.qualified_name.clone()),
        ("Geometry", d.geometry.to_string()),
        ("Status", status_label(view, color)),
        ("Features", s.feature_count.to_string()),
        ("Visible", s.visible.to_string()),
        ("Checked", output::age(s.last_checked_at)),
    ];
    if let Some(ref err) = s.last_error {
        pairs.push(("Error", err.clone()));
    }
    output::detail_lines(&pairs)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: LayersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        LayersCommand::List => {
            util::refresh(dashboard, global).await;
            let snap = dashboard.layers();
            let out = output::render_list(
                &global.output,
                snap.as_slice(),
                |v| LayerRow::new(v, color),
                |v| v.key().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LayersCommand::Status { key } => {
            // Fail on unknown keys before touching the network.
            dashboard.layer(&key)?;
            util::refresh(dashboard, global).await;
            let view = dashboard.layer(&key)?;
            let out = output::render_single(
                &global.output,
                &view,
                |v| detail(v, color),
                |v| output::availability_label(v.state.available, false),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
