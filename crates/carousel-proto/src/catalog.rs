//! TSV channel catalogue and the playlists / lookup tables generated from it.
//!
//! The catalogue is a tab-separated file whose header names the columns;
//! `Status`, `ch_num` and `NAME` are required, `GROUP`, `STREAM` and `LOGO`
//! are optional.

use std::path::Path;

use crate::error::CatalogError;
use crate::playlist::Channel;

const COL_STATUS: &str = "Status";
const COL_GROUP: &str = "GROUP";
const COL_NUMBER: &str = "ch_num";
const COL_NAME: &str = "NAME";
const COL_STREAM: &str = "STREAM";
const COL_LOGO: &str = "LOGO";

const KEEP: &str = "KEEP";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    pub status: String,
    pub group: String,
    pub number: String,
    pub name: String,
    pub stream: String,
    pub logo: String,
}

impl CatalogRow {
    /// Marked KEEP and carrying both a number and a name.
    pub fn is_kept(&self) -> bool {
        self.status.eq_ignore_ascii_case(KEEP) && !self.number.is_empty() && !self.name.is_empty()
    }

    /// Path-safe channel id: the name with spaces replaced by underscores.
    pub fn slug(&self) -> String {
        self.name.replace(' ', "_")
    }

    pub fn display_name(&self) -> String {
        format!("{}) {}", self.number, self.name)
    }
}

pub fn parse_catalog(text: &str) -> Result<Vec<CatalogRow>, CatalogError> {
    let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));
    let header: Vec<&str> = lines
        .next()
        .ok_or(CatalogError::Empty)?
        .split('\t')
        .map(str::trim)
        .collect();

    let col = |name: &'static str| header.iter().position(|h| *h == name);
    let required = |name: &'static str| col(name).ok_or(CatalogError::MissingColumn(name));

    let status = required(COL_STATUS)?;
    let number = required(COL_NUMBER)?;
    let name = required(COL_NAME)?;
    let group = col(COL_GROUP);
    let stream = col(COL_STREAM);
    let logo = col(COL_LOGO);

    let rows = lines
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            let field = |idx: Option<usize>| {
                idx.and_then(|i| fields.get(i))
                    .map(|f| f.trim().to_string())
                    .unwrap_or_default()
            };
            CatalogRow {
                status: field(Some(status)),
                group: field(group),
                number: field(Some(number)),
                name: field(Some(name)),
                stream: field(stream),
                logo: field(logo),
            }
        })
        .collect();
    Ok(rows)
}

pub fn read_catalog(path: &Path) -> Result<Vec<CatalogRow>, CatalogError> {
    let text = std::fs::read_to_string(path)?;
    parse_catalog(&text)
}

/// How catalogue rows become playlist entries.
#[derive(Debug, Clone, Default)]
pub struct PlaylistOptions {
    /// When set, streams are `<base>/<slug>` instead of the STREAM column.
    pub stream_base: Option<String>,
    /// When set, logos are `<base>/<slug>.jpg` instead of the LOGO column.
    pub logo_base: Option<String>,
    /// Rows in this group (case-insensitive) are left out.
    pub exclude_group: Option<String>,
}

impl PlaylistOptions {
    fn excludes(&self, row: &CatalogRow) -> bool {
        self.exclude_group
            .as_deref()
            .is_some_and(|g| row.group.eq_ignore_ascii_case(g))
    }
}

fn join_base(base: &str, tail: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), tail)
}

/// Kept rows as channels, in catalogue order.
pub fn playlist_entries(rows: &[CatalogRow], opts: &PlaylistOptions) -> Vec<Channel> {
    rows.iter()
        .filter(|row| row.is_kept() && !opts.excludes(row))
        .filter_map(|row| {
            let slug = row.slug();
            let url = match &opts.stream_base {
                Some(base) => join_base(base, &slug),
                None if row.stream.is_empty() => return None,
                None => row.stream.clone(),
            };
            let logo = match &opts.logo_base {
                Some(base) => join_base(base, &format!("{slug}.jpg")),
                None => row.logo.clone(),
            };
            Some(Channel {
                id: row.number.parse().ok(),
                name: row.display_name(),
                logo,
                group: row.group.clone(),
                url,
            })
        })
        .collect()
}

/// Serialise channels as an extended M3U playlist.
pub fn render_m3u(channels: &[Channel]) -> String {
    let mut lines = vec!["#EXTM3U".to_string()];
    for ch in channels {
        lines.push(format!(
            "#EXTINF:-1 tvg-logo=\"{}\" group-title=\"{}\",{}",
            ch.logo, ch.group, ch.name
        ));
        lines.push(ch.url.clone());
    }
    lines.join("\n")
}

/// `<slug>\t<stream>` lines for the redirect service.  Rows without a
/// STREAM value are skipped.
pub fn render_lookup_table(rows: &[CatalogRow], exclude_group: Option<&str>) -> String {
    let mut out = String::new();
    for row in rows {
        if !row.is_kept() || row.stream.is_empty() {
            continue;
        }
        if exclude_group.is_some_and(|g| row.group.eq_ignore_ascii_case(g)) {
            continue;
        }
        out.push_str(&row.slug());
        out.push('\t');
        out.push_str(&row.stream);
        out.push('\n');
    }
    out
}
