mod cli;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use carousel_proto::catalog::{
    playlist_entries, read_catalog, render_lookup_table, render_m3u, PlaylistOptions,
};
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    let written = run(cli.command)?;
    info!("wrote {} entries", written);
    Ok(())
}

/// Execute one subcommand; returns how many entries were written.
fn run(command: Commands) -> anyhow::Result<usize> {
    match command {
        Commands::Playlist {
            input,
            output,
            stream_base,
            logo_base,
            exclude_group,
        } => {
            let rows = read_catalog(&input)
                .with_context(|| format!("reading catalogue {}", input.display()))?;
            let opts = PlaylistOptions {
                stream_base,
                logo_base,
                exclude_group,
            };
            let channels = playlist_entries(&rows, &opts);
            if channels.is_empty() {
                warn!("no kept rows in {}", input.display());
            }
            write_output(&output, &render_m3u(&channels))?;
            info!("playlist: {} of {} rows → {}", channels.len(), rows.len(), output.display());
            Ok(channels.len())
        }
        Commands::Table {
            input,
            output,
            exclude_group,
        } => {
            let rows = read_catalog(&input)
                .with_context(|| format!("reading catalogue {}", input.display()))?;
            let table = render_lookup_table(&rows, exclude_group.as_deref());
            let count = table.lines().count();
            write_output(&output, &table)?;
            info!("table: {} of {} rows → {}", count, rows.len(), output.display());
            Ok(count)
        }
    }
}

fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}
