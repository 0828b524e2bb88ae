use std::time::Duration;

use carousel_proto::config::Config;
use carousel_redirect::{app, RedirectState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,carousel_redirect=debug")),
        )
        .init();

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());
    let redirect = config.redirect;

    let state = RedirectState::new(
        redirect.table_source.clone(),
        Duration::from_secs(redirect.cache_ttl_secs),
    );

    let addr = format!("{}:{}", redirect.bind_address, redirect.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "redirect service listening on http://{} (table: {}, ttl {}s)",
        addr, redirect.table_source, redirect.cache_ttl_secs
    );

    axum::serve(listener, app(state)).await?;
    Ok(())
}
