use carousel_proto::config::Config;
use carousel_proto::error::PlaylistError;
use carousel_proto::playlist::{group_channels, load_playlist};
use carousel_proto::selection::Selection;
use carousel_proto::state::{restore_selection, StateStore};

const PLAYLIST: &str = "#EXTM3U\n\
#EXTINF:-1 tvg-logo=\"https://l/1.png\" group-title=\"News\",1) Al Jazeera\n\
https://s/aj.m3u8\n\
#EXTINF:-1 group-title=\"Sports\",2) Beta Sport\n\
rtmp://s/beta\n\
#EXTINF:-1 group-title=\"Sports\",3) Gamma Sport\n\
https://s/gamma.m3u8\n\
#EXTINF:-1,4) Delta\n\
http://s/delta\n";

#[tokio::test]
async fn loads_file_groups_and_restores_saved_channel() {
    let dir = tempfile::tempdir().unwrap();
    let list = dir.path().join("list.m3u");
    std::fs::write(&list, PLAYLIST).unwrap();

    let channels = load_playlist(list.to_str().unwrap()).await.unwrap();
    let ids: Vec<Option<u32>> = channels.iter().map(|c| c.id).collect();
    assert_eq!(ids, [Some(1), Some(3), Some(4)]);

    let groups = group_channels(&channels);
    let names: Vec<&str> = groups.iter().map(|g| g.name).collect();
    assert_eq!(names, ["News", "Sports", "Other"]);

    let state_path = dir.path().join("state.json");
    let mut store = StateStore::open(state_path.clone(), 0.5);
    store.set_last_channel(Some(3)).await.unwrap();

    let mut sel = Selection::new(channels);
    let reopened = StateStore::open(state_path, 0.5);
    assert!(restore_selection(&mut sel, reopened.state()));
    assert_eq!(sel.current().map(|c| c.label()), Some("Gamma Sport"));
}

#[tokio::test]
async fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.m3u");
    let err = load_playlist(missing.to_str().unwrap()).await.unwrap_err();
    assert!(matches!(err, PlaylistError::Read { .. }));
}

#[tokio::test]
#[ignore = "network check against the default playlist; run with --ignored"]
async fn default_playlist_is_reachable() {
    let source = Config::default().playlist.source;
    let channels = load_playlist(&source).await.unwrap();
    assert!(!channels.is_empty(), "no channels parsed from {source}");
}
