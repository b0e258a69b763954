use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::config::Config;
use crate::gateway::BlogSchema;
use crate::graphql_client::GatewayClient;
use crate::templates::Templates;

pub type RefreshBroadcaster = broadcast::Sender<()>;

pub struct AppState {
    pub config: Config,
    pub templates: RwLock<Templates>,
    pub gateway: GatewayClient,
}

#[derive(Clone)]
pub struct RouterState {
    pub app_state: Arc<AppState>,
    pub schema: BlogSchema,
    pub broadcaster: RefreshBroadcaster,
}

impl axum::extract::FromRef<RouterState> for Arc<AppState> {
    fn from_ref(state: &RouterState) -> Self {
        state.app_state.clone()
    }
}

impl axum::extract::FromRef<RouterState> for BlogSchema {
    fn from_ref(state: &RouterState) -> Self {
        state.schema.clone()
    }
}

impl axum::extract::FromRef<RouterState> for RefreshBroadcaster {
    fn from_ref(state: &RouterState) -> Self {
        state.broadcaster.clone()
    }
}
