//! Channel-name redirect service.
//!
//! `GET /<name>` answers `302 Location: <stream>` when the lookup table knows
//! the name, otherwise the HTML index of known names.  The name is looked up
//! after percent-decoding, so `/Al%20Jazeera` matches `Al Jazeera`.  The table is re-read
//! from its source once the cached copy is older than the TTL.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

use carousel_proto::error::LookupError;
use carousel_proto::lookup::LookupTable;

struct Cached {
    table: Arc<LookupTable>,
    fetched: Instant,
}

pub struct RedirectState {
    source: String,
    ttl: Duration,
    cache: Mutex<Option<Cached>>,
}

impl RedirectState {
    pub fn new(source: impl Into<String>, ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            source: source.into(),
            ttl,
            cache: Mutex::new(None),
        })
    }

    /// The cached table, refreshed when older than the TTL.  Concurrent
    /// requests wait on the same refresh.
    pub async fn table(&self) -> Result<Arc<LookupTable>, LookupError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched.elapsed() < self.ttl {
                return Ok(cached.table.clone());
            }
        }
        debug!("lookup table expired, reading {}", self.source);
        let table = Arc::new(LookupTable::load(&self.source).await?);
        *cache = Some(Cached {
            table: table.clone(),
            fetched: Instant::now(),
        });
        Ok(table)
    }
}

pub fn app(state: Arc<RedirectState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/:name", get(redirect))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index(State(state): State<Arc<RedirectState>>) -> Response {
    match state.table().await {
        Ok(table) => Html(table.render_index()).into_response(),
        Err(e) => bad_gateway(e),
    }
}

async fn redirect(State(state): State<Arc<RedirectState>>, Path(name): Path<String>) -> Response {
    let table = match state.table().await {
        Ok(table) => table,
        Err(e) => return bad_gateway(e),
    };
    match table.get(&name) {
        Some(stream) => {
            info!("redirect {} → {}", name, stream);
            (StatusCode::FOUND, [(header::LOCATION, stream.to_string())]).into_response()
        }
        None => {
            debug!("unknown channel {:?}, serving index", name);
            Html(table.render_index()).into_response()
        }
    }
}

fn bad_gateway(e: LookupError) -> Response {
    error!("lookup table unavailable: {}", e);
    (StatusCode::BAD_GATEWAY, format!("lookup table unavailable: {}", e)).into_response()
}
