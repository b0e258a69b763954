mod app;
mod config;
mod content_store;
mod error;
mod gateway;
mod graphql_client;
mod hot_reload;
mod markdown;
mod models;
mod pages;
mod state;
mod templates;
mod views;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    info!("RUST_ENV is set to development: {}", config.is_development);
    info!("Serving posts from {}", config.posts_dir().display());

    let router_state = app::build_state(config).await?;

    if router_state.app_state.config.is_development {
        info!("Hot reload enabled. Check logs for file change events.");
        hot_reload::start_content_watcher(
            router_state.broadcaster.clone(),
            router_state.app_state.clone(),
        )
        .context("failed to watch content directory")?;
    }

    let addr = router_state.app_state.config.addr();
    let app = app::build_router(router_state);

    info!(%addr, "listening");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}
