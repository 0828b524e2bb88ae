//! M3U playlist loading and channel grouping.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PlaylistError;

/// Group title used for channels whose `group-title` is empty.
pub const DEFAULT_GROUP: &str = "Other";

const EXTINF: &str = "#EXTINF";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Channel {
    /// Numeric prefix of `name` ("7) News 24" → 7).
    pub id: Option<u32>,
    pub name: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub group: String,
    pub url: String,
}

impl Channel {
    /// The digits before `)` in the display name, or "" when there are none.
    pub fn number(&self) -> &str {
        split_number(&self.name).map(|(num, _)| num).unwrap_or("")
    }

    /// The display name without its `<digits>) ` prefix.
    pub fn label(&self) -> &str {
        split_number(&self.name)
            .map(|(_, label)| label)
            .unwrap_or(&self.name)
    }

    /// Group title with the empty group folded into [`DEFAULT_GROUP`].
    pub fn group_title(&self) -> &str {
        let g = self.group.trim();
        if g.is_empty() {
            DEFAULT_GROUP
        } else {
            g
        }
    }
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\)\s*(.*)$").expect("valid channel number regex"))
}

fn logo_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"tvg-logo="([^"]+)""#).expect("valid tvg-logo regex"))
}

fn group_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"group-title="([^"]+)""#).expect("valid group-title regex"))
}

fn split_number(name: &str) -> Option<(&str, &str)> {
    let caps = number_re().captures(name)?;
    let num = caps.get(1)?.as_str();
    let label = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    Some((num, label))
}

/// Parse the numeric channel id out of a display name.
pub fn parse_channel_id(name: &str) -> Option<u32> {
    split_number(name).and_then(|(num, _)| num.parse().ok())
}

fn is_stream_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Scan M3U text into channels.
///
/// Every `#EXTINF` line consumes the line that follows it as the stream URL.
/// Entries whose URL is missing or not HTTP(S) are dropped.
pub fn parse_m3u(content: &str) -> Vec<Channel> {
    let lines: Vec<&str> = content.lines().collect();
    let mut channels = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if !line.starts_with(EXTINF) {
            continue;
        }

        let logo = logo_re()
            .captures(line)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let group = group_re()
            .captures(line)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let name = line
            .split_once(',')
            .map(|(_, rest)| rest.trim())
            .filter(|n| !n.is_empty())
            .unwrap_or("Unknown")
            .to_string();

        let Some(url) = lines.get(i + 1).map(|l| l.trim()) else {
            debug!("playlist: trailing #EXTINF without url: {}", name);
            continue;
        };
        if !is_stream_url(url) {
            debug!("playlist: dropping '{}' (url {:?})", name, url);
            continue;
        }

        channels.push(Channel {
            id: parse_channel_id(&name),
            name,
            logo,
            group,
            url: url.to_string(),
        });
    }

    channels
}

/// Load a playlist from an `http(s)://` URL or a local file path.
pub async fn load_playlist(source: &str) -> Result<Vec<Channel>, PlaylistError> {
    let text = if is_stream_url(source) {
        fetch_text(source).await?
    } else {
        let path = Path::new(source);
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| PlaylistError::Read {
                path: path.to_path_buf(),
                source,
            })?
    };
    let channels = parse_m3u(&text);
    info!("Loaded {} channels from {}", channels.len(), source);
    Ok(channels)
}

async fn fetch_text(url: &str) -> Result<String, PlaylistError> {
    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(PlaylistError::Status(response.status()));
    }
    Ok(response.text().await?)
}

/// Channels sharing one group title, in playlist order.
#[derive(Debug, Clone)]
pub struct ChannelGroup<'a> {
    pub name: &'a str,
    /// `(index into the full channel list, channel)`.
    pub entries: Vec<(usize, &'a Channel)>,
}

/// Group channels by title, keeping groups in first-seen order.
pub fn group_channels(channels: &[Channel]) -> Vec<ChannelGroup<'_>> {
    let mut groups: Vec<ChannelGroup<'_>> = Vec::new();
    for (idx, ch) in channels.iter().enumerate() {
        let title = ch.group_title();
        match groups.iter_mut().find(|g| g.name == title) {
            Some(g) => g.entries.push((idx, ch)),
            None => groups.push(ChannelGroup {
                name: title,
                entries: vec![(idx, ch)],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_attributes_number_and_label() {
        let text = "#EXTM3U\n\
            #EXTINF:-1 tvg-logo=\"a.png\" group-title=\"News\",7) Channel Seven\n\
            https://example.com/x.m3u8\n";
        let channels = parse_m3u(text);
        assert_eq!(channels.len(), 1);
        let ch = &channels[0];
        assert_eq!(ch.logo, "a.png");
        assert_eq!(ch.group, "News");
        assert_eq!(ch.id, Some(7));
        assert_eq!(ch.number(), "7");
        assert_eq!(ch.label(), "Channel Seven");
        assert_eq!(ch.url, "https://example.com/x.m3u8");
    }

    #[test]
    fn non_http_url_is_dropped() {
        let text = "#EXTINF:-1,Local\nrtsp://192.168.1.1/stream\n";
        assert!(parse_m3u(text).is_empty());
    }

    #[test]
    fn trailing_extinf_is_dropped() {
        let text = "#EXTINF:-1,First\nhttp://a/1\n#EXTINF:-1,Last";
        let channels = parse_m3u(text);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "First");
    }

    #[test]
    fn missing_attributes_default_to_empty() {
        let channels = parse_m3u("#EXTINF:-1,Plain\nhttps://a/b\n");
        assert_eq!(channels[0].logo, "");
        assert_eq!(channels[0].group, "");
        assert_eq!(channels[0].group_title(), DEFAULT_GROUP);
        assert_eq!(channels[0].id, None);
        assert_eq!(channels[0].number(), "");
        assert_eq!(channels[0].label(), "Plain");
    }

    #[test]
    fn missing_name_becomes_unknown() {
        let channels = parse_m3u("#EXTINF:-1 tvg-logo=\"x\"\nhttps://a/b\n");
        assert_eq!(channels[0].name, "Unknown");
    }

    #[test]
    fn crlf_lines_are_tolerated() {
        let channels = parse_m3u("#EXTINF:-1,12) Crlf\r\nhttps://a/b\r\n");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].url, "https://a/b");
        assert_eq!(channels[0].id, Some(12));
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let mk = |name: &str, group: &str| Channel {
            name: name.into(),
            group: group.into(),
            url: "http://x".into(),
            ..Channel::default()
        };
        let channels = vec![
            mk("a", "Sports"),
            mk("b", ""),
            mk("c", "News"),
            mk("d", "Sports"),
        ];
        let groups = group_channels(&channels);
        let names: Vec<&str> = groups.iter().map(|g| g.name).collect();
        assert_eq!(names, ["Sports", "Other", "News"]);
        let sports: Vec<usize> = groups[0].entries.iter().map(|(i, _)| *i).collect();
        assert_eq!(sports, [0, 3]);
    }
}
