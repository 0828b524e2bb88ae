use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub playlist: PlaylistConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub redirect: RedirectConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Where the channel list comes from: an https:// URL or a local file path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    #[serde(default = "default_playlist_source")]
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Initial volume (0.0–1.0) when no saved state exists.
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    /// Seconds to wait for playback to start before reporting an error.
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,
    /// Start playing the restored channel as soon as the list is loaded.
    #[serde(default = "default_true")]
    pub autoplay: bool,
    /// Extra arguments appended to the mpv command line.
    #[serde(default)]
    pub mpv_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Seconds of inactivity before the channel list hides itself.
    #[serde(default = "default_auto_hide")]
    pub auto_hide_secs: u64,
    /// Seconds the channel overlay stays up.
    #[serde(default = "default_auto_hide")]
    pub overlay_secs: u64,
    /// Minimum drag distance in pixels for a swipe.
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold_px: i32,
    /// Terminal cell size used to turn a drag in cells into pixels.
    #[serde(default = "default_cell_width")]
    pub cell_width_px: i32,
    #[serde(default = "default_cell_height")]
    pub cell_height_px: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// URL or file path of the name → stream table.
    #[serde(default = "default_table_source")]
    pub table_source: String,
    /// Seconds a fetched table is reused before it is read again.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            source: default_playlist_source(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            load_timeout_secs: default_load_timeout(),
            autoplay: true,
            mpv_args: Vec::new(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            auto_hide_secs: default_auto_hide(),
            overlay_secs: default_auto_hide(),
            swipe_threshold_px: default_swipe_threshold(),
            cell_width_px: default_cell_width(),
            cell_height_px: default_cell_height(),
        }
    }
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            table_source: default_table_source(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            log_file: default_log_file(),
        }
    }
}

fn default_playlist_source() -> String {
    "https://skabajah.github.io/saturn/sk.m3u".to_string()
}

fn default_volume() -> f32 {
    0.5
}

fn default_load_timeout() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

fn default_auto_hide() -> u64 {
    4
}

fn default_swipe_threshold() -> i32 {
    crate::gesture::SWIPE_THRESHOLD_PX
}

fn default_cell_width() -> i32 {
    8
}

fn default_cell_height() -> i32 {
    16
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_table_source() -> String {
    "https://skabajah.github.io/iptv/channels.csv".to_string()
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_state_file() -> PathBuf {
    platform::data_dir().join("state.json")
}

fn default_log_file() -> PathBuf {
    platform::data_dir().join("carousel.log")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read `path`, writing a default config there first if it is missing.
    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.redirect.port, 8787);
        assert_eq!(config.redirect.cache_ttl_secs, 60);
        assert_eq!(config.player.load_timeout_secs, 15);
        assert!(config.player.autoplay);
        assert_eq!(config.ui.auto_hide_secs, 4);
        assert_eq!(config.ui.swipe_threshold_px, 50);
        assert!(config.playlist.source.starts_with("https://"));
        assert!(config.paths.state_file.ends_with("carousel/state.json"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            "[playlist]\nsource = \"/tmp/list.m3u\"\n[ui]\nauto_hide_secs = 9\n",
        )
        .unwrap();
        assert_eq!(config.playlist.source, "/tmp/list.m3u");
        assert_eq!(config.ui.auto_hide_secs, 9);
        assert_eq!(config.ui.overlay_secs, 4);
        assert_eq!(config.redirect.bind_address, "127.0.0.1");
    }

    #[test]
    fn load_from_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.redirect.port, 8787);
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.playlist.source, config.playlist.source);
    }
}
