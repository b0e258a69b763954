//! GraphQL schema over the content store, and the HTTP handlers that expose it.

use std::sync::Arc;

use async_graphql::{
    http::GraphiQLSource, Context, EmptyMutation, EmptySubscription, Object, Result as GraphQLResult,
    Schema,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::content_store::SharedContentStore;
use crate::models::{Post, PostField};
use crate::state::AppState;

pub const GRAPHQL_PATH: &str = "/api/graphql";

/// The projection both queries hand to the content store.
const POST_FIELDS: [PostField; 8] = PostField::ALL;

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// All posts, newest first.
    async fn posts(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<Post>> {
        let store = ctx.data::<SharedContentStore>()?;
        let posts = store.all_posts(&POST_FIELDS).await?;
        debug!("Resolved {} posts", posts.len());
        Ok(posts)
    }

    /// The post with the given slug, or null when none exists.
    async fn post(&self, ctx: &Context<'_>, slug: String) -> GraphQLResult<Option<Post>> {
        let store = ctx.data::<SharedContentStore>()?;
        let post = store.post_by_slug(&slug, &POST_FIELDS).await?;
        if post.is_none() {
            debug!(%slug, "No post found");
        }
        Ok(post)
    }
}

pub type BlogSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub fn build_schema(store: SharedContentStore) -> BlogSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(store)
        .finish()
}

/// `POST /api/graphql`. The body is decoded here rather than by an extractor so
/// that a malformed request still gets a GraphQL-shaped error.
pub async fn graphql_handler(State(schema): State<BlogSchema>, body: Bytes) -> Response {
    let request: async_graphql::Request = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting malformed GraphQL request: {}", e);
            let errors = json!({ "errors": [{ "message": format!("invalid GraphQL request: {}", e) }] });
            return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
        }
    };

    let response = schema.execute(request).await;
    if response.is_err() {
        for error in &response.errors {
            warn!("GraphQL error: {}", error.message);
        }
    }
    Json(response).into_response()
}

/// `GET /api/graphql/schema`
pub async fn schema_handler(State(schema): State<BlogSchema>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], schema.sdl())
}

/// `GET /api/graphql`, GraphiQL in development only.
pub async fn graphiql_handler(State(state): State<Arc<AppState>>) -> Response {
    if !state.config.is_development {
        return StatusCode::NOT_FOUND.into_response();
    }
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish()).into_response()
}
