//! Page loaders. Each request makes one GraphQL call to the gateway and renders
//! the result.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, info};

use crate::error::PageError;
use crate::graphql_client::gateway_endpoint;
use crate::markdown::render_markdown_to_html;
use crate::state::AppState;
use crate::views;

/// `GET /`
pub async fn index_page(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, PageError> {
    let endpoint = gateway_endpoint(&state.config);
    let posts = state.gateway.all_posts(&endpoint).await?;
    debug!("Rendering index with {} posts", posts.len());

    let body = views::index_content(&posts);
    let templates = state.templates.read().await;
    let page = views::render_with_layout(
        &templates.layout_html,
        &state.config.site_name,
        "",
        &body,
        state.config.is_development,
    );
    Ok(Html(page))
}

/// `GET /posts/{slug}`
pub async fn post_page(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, PageError> {
    let endpoint = gateway_endpoint(&state.config);
    let post = state
        .gateway
        .post_by_slug(&endpoint, &slug)
        .await?
        .filter(|post| post.slug.is_some());

    let Some(mut post) = post else {
        info!(%slug, "Post not found");
        return Ok(not_found(&state, &slug).await);
    };

    let html = render_markdown_to_html(post.content.as_deref().unwrap_or_default());
    post.content = Some(html);

    let title = match &post.title {
        Some(title) => format!("{} | {}", title, state.config.site_name),
        None => state.config.site_name.clone(),
    };
    let templates = state.templates.read().await;
    let page = views::render_with_layout(
        &templates.layout_html,
        &title,
        &views::post_head(&post),
        &views::post_content(&post),
        state.config.is_development,
    );
    Ok(Html(page).into_response())
}

async fn not_found(state: &AppState, slug: &str) -> Response {
    let templates = state.templates.read().await;
    let body = views::not_found_content(&templates.not_found_html, slug);
    let page = views::render_with_layout(
        &templates.layout_html,
        &format!("404 | {}", state.config.site_name),
        "",
        &body,
        state.config.is_development,
    );
    (StatusCode::NOT_FOUND, Html(page)).into_response()
}
