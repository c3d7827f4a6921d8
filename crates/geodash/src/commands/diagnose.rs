//! `diagnose`: the ordered server connectivity checklist.

use geodash_core::{Dashboard, DiagnosticCheck};
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "")]
    mark: String,
    #[tabled(rename = "Check")]
    name: String,
    #[tabled(rename = "HTTP")]
    status: String,
    #[tabled(rename = "Time")]
    elapsed: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl CheckRow {
    fn new(check: &DiagnosticCheck, color: bool) -> Self {
        Self {
            mark: output::pass_mark(check.ok, color),
            name: check.name.clone(),
            status: check.status.map_or_else(|| "-".into(), |s| s.to_string()),
            elapsed: format!("{}ms", check.elapsed_ms),
            detail: check.detail.clone(),
        }
    }
}

pub async fn handle(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    let pb = util::spinner("Running diagnostics...", global);
    let report = dashboard.diagnose().await;
    pb.finish_and_clear();

    let out = output::render_list(
        &global.output,
        &report.checks,
        |c| CheckRow::new(c, color),
        |c| format!("{}\t{}", c.name, if c.ok { "ok" } else { "fail" }),
    );
    output::print_output(&out, global.quiet);

    let failed = report.failures().count();
    if failed > 0 {
        return Err(CliError::DiagnosticsFailed {
            failed,
            total: report.checks.len(),
        });
    }
    Ok(())
}
