use std::sync::Arc;

use axum::{
    routing::{get, get_service, post},
    Router,
};
use tokio::sync::{broadcast, RwLock};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::content_store::{FileContentStore, SharedContentStore};
use crate::gateway::{build_schema, graphiql_handler, graphql_handler, schema_handler, GRAPHQL_PATH};
use crate::graphql_client::GatewayClient;
use crate::hot_reload::ws_handler;
use crate::pages::{index_page, post_page};
use crate::state::{AppState, RouterState};
use crate::templates::Templates;

pub async fn build_state(config: Config) -> anyhow::Result<RouterState> {
    let store: SharedContentStore = Arc::new(FileContentStore::new(config.posts_dir()));
    let templates = Templates::load(&config.content_dir).await?;
    let gateway = GatewayClient::new(config.gateway_timeout())?;
    let (tx, _rx) = broadcast::channel(1);

    Ok(RouterState {
        app_state: Arc::new(AppState {
            config,
            templates: RwLock::new(templates),
            gateway,
        }),
        schema: build_schema(store),
        broadcaster: tx,
    })
}

pub fn build_router(router_state: RouterState) -> Router {
    let config = &router_state.app_state.config;
    let static_dir = get_service(ServeDir::new(config.static_dir()));

    let mut app = Router::new()
        .route("/", get(index_page))
        .route("/posts/{slug}", get(post_page))
        .route(GRAPHQL_PATH, post(graphql_handler).get(graphiql_handler))
        .route("/api/graphql/schema", get(schema_handler))
        .nest_service("/static", static_dir);

    if config.is_development {
        app = app.route("/ws", get(ws_handler));
    }

    app.layer(TraceLayer::new_for_http()).with_state(router_state)
}
