// Generates man pages and static shell completions into OUT_DIR for
// packagers. `geodash completions <shell>` stays the runtime path.

use std::fs;
use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::Shell;

#[path = "src/cli.rs"]
mod cli;

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let Some(out_dir) = std::env::var_os("OUT_DIR") else {
        return Err(io::Error::other("OUT_DIR not set by Cargo"));
    };
    let out_dir = Path::new(&out_dir);

    let mut cmd = cli::Cli::command();

    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;
    write_manpages(&cmd, &man_dir)?;

    let completion_dir = out_dir.join("completions");
    fs::create_dir_all(&completion_dir)?;
    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        clap_complete::generate_to(shell, &mut cmd, "geodash", &completion_dir)?;
    }
    Ok(())
}

/// `geodash.1`, then `geodash-layers.1`, `geodash-layers-list.1`, ...
fn write_manpages(root: &clap::Command, dir: &Path) -> io::Result<()> {
    let mut pending = vec![root.clone()];
    while let Some(cmd) = pending.pop() {
        let mut page = Vec::new();
        clap_mangen::Man::new(cmd.clone()).render(&mut page)?;
        fs::write(dir.join(format!("{}.1", cmd.get_name())), page)?;

        let prefix = cmd.get_name().to_owned();
        pending.extend(
            cmd.get_subcommands()
                .filter(|sub| !sub.is_hide_set())
                .map(|sub| sub.clone().name(format!("{prefix}-{}", sub.get_name()))),
        );
    }
    Ok(())
}
