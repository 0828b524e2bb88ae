//! Error types shared by the carousel crates.

use std::path::PathBuf;

/// Failures while obtaining playlist text.  Parsing itself never fails:
/// malformed entries are skipped.
#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error("playlist request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("playlist server answered HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("cannot read playlist {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while obtaining the redirect lookup table.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("lookup table request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("lookup table server answered HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("cannot read lookup table {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while reading a TSV channel catalogue.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalogue is empty")]
    Empty,

    #[error("catalogue header is missing column {0}")]
    MissingColumn(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
