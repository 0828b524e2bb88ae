use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "carousel-gen")]
#[command(author, version, about = "Build M3U playlists and redirect tables from a TSV channel catalogue")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write an extended M3U playlist
    Playlist {
        /// Catalogue TSV
        #[arg(short, long)]
        input: PathBuf,

        /// Playlist to write
        #[arg(short, long)]
        output: PathBuf,

        /// Build stream URLs as <base>/<Name_With_Underscores>
        #[arg(long)]
        stream_base: Option<String>,

        /// Build logo URLs as <base>/<Name_With_Underscores>.jpg
        #[arg(long)]
        logo_base: Option<String>,

        /// Leave out rows of this group
        #[arg(long)]
        exclude_group: Option<String>,
    },

    /// Write the name → stream table read by carousel-redirect
    Table {
        /// Catalogue TSV
        #[arg(short, long)]
        input: PathBuf,

        /// Table to write
        #[arg(short, long)]
        output: PathBuf,

        /// Leave out rows of this group
        #[arg(long)]
        exclude_group: Option<String>,
    },
}
