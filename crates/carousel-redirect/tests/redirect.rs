use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use carousel_redirect::{app, RedirectState};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

const TABLE: &str = "Al_Jazeera\thttps://s/aj.m3u8\nLBC,https://s/lbc.m3u8,extra\n";

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, location, String::from_utf8(body.to_vec()).unwrap())
}

fn table_file(content: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("channels.tsv");
    std::fs::write(&path, content).unwrap();
    let source = path.to_str().unwrap().to_string();
    (dir, source)
}

#[tokio::test]
async fn known_name_redirects() {
    let (_dir, source) = table_file(TABLE);
    let app = app(RedirectState::new(source, Duration::from_secs(60)));

    let (status, location, _) = get(app.clone(), "/Al_Jazeera").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("https://s/aj.m3u8"));

    let (status, location, _) = get(app, "/LBC").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("https://s/lbc.m3u8"));
}

#[tokio::test]
async fn unknown_name_and_root_list_channels() {
    let (_dir, source) = table_file(TABLE);
    let app = app(RedirectState::new(source, Duration::from_secs(60)));
    let expected = "<h3>Available Channels:</h3><ul>\
        <li><a href='/Al_Jazeera'>Al_Jazeera</a></li>\
        <li><a href='/LBC'>LBC</a></li></ul>";

    let (status, location, body) = get(app.clone(), "/Nope").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(location, None);
    assert_eq!(body, expected);

    let (status, _, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, expected);
}

#[tokio::test]
async fn missing_table_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("absent.tsv").to_str().unwrap().to_string();
    let app = app(RedirectState::new(source, Duration::from_secs(60)));
    let (status, _, body) = get(app, "/LBC").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("lookup table unavailable"));
}

#[tokio::test]
async fn table_is_cached_until_ttl_expires() {
    let (dir, source) = table_file(TABLE);
    let path = dir.path().join("channels.tsv");

    let cached = app(RedirectState::new(source.clone(), Duration::from_secs(60)));
    let fresh = app(RedirectState::new(source, Duration::ZERO));
    get(cached.clone(), "/").await;

    std::fs::write(&path, "LBC\thttps://s/lbc-v2.m3u8\n").unwrap();

    let (_, location, _) = get(cached, "/LBC").await;
    assert_eq!(location.as_deref(), Some("https://s/lbc.m3u8"));
    let (_, location, _) = get(fresh, "/LBC").await;
    assert_eq!(location.as_deref(), Some("https://s/lbc-v2.m3u8"));
}

#[tokio::test]
async fn percent_encoded_names_are_decoded_before_lookup() {
    let (_dir, source) = table_file("Al Jazeera\thttps://s/aj-en.m3u8\n");
    let app = app(RedirectState::new(source, Duration::from_secs(60)));
    let (status, location, _) = get(app, "/Al%20Jazeera").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("https://s/aj-en.m3u8"));
}
