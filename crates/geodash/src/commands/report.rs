//! `report`: render a status or inventory report to a file or stdout.

use std::io::Write;
use std::path::{Path, PathBuf};

use geodash_core::{Dashboard, ReportArtifact, ReportFormat, ReportKind};

use crate::cli::{GlobalOpts, ReportArgs, ReportFormatArg, ReportKindArg};
use crate::error::CliError;

use super::util;

impl From<ReportKindArg> for ReportKind {
    fn from(kind: ReportKindArg) -> Self {
        match kind {
            ReportKindArg::Status => Self::Status,
            ReportKindArg::Inventory => Self::Inventory,
        }
    }
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(format: ReportFormatArg) -> Self {
        match format {
            ReportFormatArg::Html => Self::Html,
            ReportFormatArg::Csv => Self::Csv,
        }
    }
}

/// Where the artifact lands: `out` as a file, inside `out` when it is a
/// directory, or the generated file name in the working directory.
fn destination(out: Option<&Path>, artifact: &ReportArtifact) -> PathBuf {
    match out {
        Some(dir) if dir.is_dir() => dir.join(&artifact.file_name),
        Some(file) => file.to_path_buf(),
        None => PathBuf::from(&artifact.file_name),
    }
}

pub async fn handle(
    dashboard: &Dashboard,
    args: ReportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::refresh(dashboard, global).await;
    let artifact = dashboard.generate_report(args.kind.into(), args.format.map(Into::into))?;

    if args.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(artifact.content.as_bytes())?;
        return Ok(());
    }

    let path = destination(args.out.as_deref(), &artifact);
    if path.exists()
        && !util::confirm(
            &format!("Overwrite {}?", path.display()),
            "overwrite report",
            global.yes,
        )?
    {
        return Ok(());
    }
    std::fs::write(&path, artifact.content.as_bytes())?;

    if !global.quiet {
        eprintln!("✓ Wrote {} ({})", path.display(), artifact.mime_type);
    }
    Ok(())
}
