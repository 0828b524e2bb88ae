//! Channel-name → stream lookup table served by the redirect service.

use std::fmt::Write as _;
use std::path::Path;

use tracing::{debug, info};

use crate::error::LookupError;

/// Ordered `name → stream` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: Vec<(String, String)>,
}

impl LookupTable {
    /// Parse tab/comma delimited text.
    ///
    /// The first two fields of each line are name and stream; anything after
    /// a second delimiter is ignored.  Lines missing either field are
    /// skipped.  A repeated name keeps its first position but takes the
    /// later stream.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();
        for line in text.lines() {
            let mut fields = line.trim().split(['\t', ',']);
            let name = fields.next().unwrap_or("");
            let stream = fields.next().unwrap_or("");
            if name.is_empty() || stream.is_empty() {
                continue;
            }
            table.insert(name, stream);
        }
        table
    }

    fn insert(&mut self, name: &str, stream: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = stream.to_string(),
            None => self.entries.push((name.to_string(), stream.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The HTML listing returned for unknown names.  Names are HTML-escaped.
    pub fn render_index(&self) -> String {
        let mut html = String::from("<h3>Available Channels:</h3><ul>");
        for name in self.names() {
            let name = escape_html(name);
            let _ = write!(html, "<li><a href='/{name}'>{name}</a></li>");
        }
        html.push_str("</ul>");
        html
    }

    /// Load from an `http(s)://` URL or a local file.
    pub async fn load(source: &str) -> Result<Self, LookupError> {
        let text = if source.starts_with("http://") || source.starts_with("https://") {
            let response = reqwest::get(source).await?;
            if !response.status().is_success() {
                return Err(LookupError::Status(response.status()));
            }
            response.text().await?
        } else {
            let path = Path::new(source);
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LookupError::Read {
                    path: path.to_path_buf(),
                    source,
                })?
        };
        let table = Self::parse(&text);
        debug!("lookup: parsed {} bytes", text.len());
        info!("Loaded {} lookup entries from {}", table.len(), source);
        Ok(table)
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
