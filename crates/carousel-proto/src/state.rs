use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::selection::Selection;

/// What survives a restart: the id of the last played channel and the volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentState {
    #[serde(default)]
    pub last_channel_id: Option<u32>,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    0.5
}

impl Default for PersistentState {
    fn default() -> Self {
        Self {
            last_channel_id: None,
            volume: default_volume(),
        }
    }
}

pub struct StateStore {
    path: PathBuf,
    state: PersistentState,
}

impl StateStore {
    /// Read `path`.  A missing or unreadable file gives defaults with
    /// `volume` set to `default_volume`.
    pub fn open(path: PathBuf, default_volume: f32) -> Self {
        let state = Self::load_persistent(&path).unwrap_or(PersistentState {
            last_channel_id: None,
            volume: default_volume,
        });
        Self { path, state }
    }

    pub fn state(&self) -> &PersistentState {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn set_last_channel(&mut self, id: Option<u32>) -> anyhow::Result<()> {
        if self.state.last_channel_id == id {
            return Ok(());
        }
        self.state.last_channel_id = id;
        self.save().await
    }

    pub async fn set_volume(&mut self, volume: f32) -> anyhow::Result<()> {
        self.state.volume = volume.clamp(0.0, 1.0);
        self.save().await
    }

    async fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&self.state)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    fn load_persistent(path: &Path) -> Option<PersistentState> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("state: ignoring unreadable {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Point `selection` at the remembered channel.
///
/// Returns `true` when the saved id was found.  Otherwise the selection is
/// left on index 0 and the caller should persist the new current id.
pub fn restore_selection(selection: &mut Selection, saved: &PersistentState) -> bool {
    match saved.last_channel_id {
        Some(id) => selection.restore_by_id(id),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::Channel;

    fn channel(id: u32) -> Channel {
        Channel {
            id: Some(id),
            name: format!("{id}) ch"),
            url: format!("http://h/{id}"),
            ..Channel::default()
        }
    }

    #[tokio::test]
    async fn saves_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub/state.json");
        let mut store = StateStore::open(path.clone(), 0.7);
        assert_eq!(store.state().volume, 0.7);
        store.set_last_channel(Some(12)).await.unwrap();
        store.set_volume(1.4).await.unwrap();

        let reopened = StateStore::open(path, 0.5);
        assert_eq!(reopened.state().last_channel_id, Some(12));
        assert_eq!(reopened.state().volume, 1.0);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = StateStore::open(path, 0.3);
        assert_eq!(store.state().last_channel_id, None);
        assert_eq!(store.state().volume, 0.3);
    }

    #[test]
    fn unknown_saved_id_falls_back_to_first() {
        let mut sel = Selection::new(vec![channel(4), channel(9)]);
        let saved = PersistentState {
            last_channel_id: Some(77),
            volume: 0.5,
        };
        assert!(!restore_selection(&mut sel, &saved));
        assert_eq!(sel.index(), Some(0));

        let saved = PersistentState {
            last_channel_id: Some(9),
            volume: 0.5,
        };
        assert!(restore_selection(&mut sel, &saved));
        assert_eq!(sel.index(), Some(1));
    }
}
