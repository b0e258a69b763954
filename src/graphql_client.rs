//! HTTP client the page loaders use to query the GraphQL gateway.

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use axum::http::header;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::PageError;
use crate::gateway::GRAPHQL_PATH;
use crate::models::Post;

const ALL_POSTS_QUERY: &str = "query AllPosts {
  posts {
    title
    date
    slug
    author { name picture }
    coverImage
    excerpt
  }
}";

// The slug travels as a variable so no request input ever becomes query text.
const POST_BY_SLUG_QUERY: &str = "query PostBySlug($slug: String!) {
  post(slug: $slug) {
    title
    date
    slug
    author { name picture }
    coverImage
    excerpt
    content
    ogImage { url }
  }
}";

#[derive(Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

#[derive(Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Deserialize)]
struct AllPostsData {
    posts: Vec<Post>,
}

#[derive(Deserialize)]
struct PostBySlugData {
    post: Option<Post>,
}

#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Listing projection of every post.
    pub async fn all_posts(&self, endpoint: &str) -> Result<Vec<Post>, PageError> {
        let data: AllPostsData = self.execute(endpoint, ALL_POSTS_QUERY, json!({})).await?;
        Ok(data.posts)
    }

    /// Full post including its markdown content; `None` if the slug is unknown.
    pub async fn post_by_slug(&self, endpoint: &str, slug: &str) -> Result<Option<Post>, PageError> {
        let data: PostBySlugData = self
            .execute(endpoint, POST_BY_SLUG_QUERY, json!({ "slug": slug }))
            .await?;
        Ok(data.post)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, PageError> {
        debug!(%endpoint, "Querying gateway");
        let response: GraphQLResponse<T> = self
            .http
            .post(endpoint)
            .header(header::ACCEPT, "application/json")
            .json(&GraphQLRequest { query, variables })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.errors.is_empty() {
            let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
            warn!("Gateway answered with errors: {:?}", messages);
            return Err(PageError::Gateway(messages.join("; ")));
        }
        response.data.ok_or(PageError::MissingData)
    }
}

/// Where page loaders send their queries: the configured URL, otherwise our
/// own listener. Request headers never take part, so a visitor cannot point the
/// server at another host.
pub fn gateway_endpoint(config: &Config) -> String {
    if let Some(url) = &config.gateway_url {
        return url.clone();
    }
    let ip = match config.host {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}{}", SocketAddr::new(ip, config.port), GRAPHQL_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_prefers_configured_url() {
        let config = Config {
            gateway_url: Some("http://gateway.internal/api/graphql".to_string()),
            ..Config::default()
        };
        assert_eq!(gateway_endpoint(&config), "http://gateway.internal/api/graphql");
    }

    #[test]
    fn wildcard_bind_uses_loopback() {
        assert_eq!(
            gateway_endpoint(&Config::default()),
            "http://127.0.0.1:8080/api/graphql"
        );

        let v6 = Config {
            host: IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            port: 3000,
            ..Config::default()
        };
        assert_eq!(gateway_endpoint(&v6), "http://[::1]:3000/api/graphql");
    }

    #[test]
    fn specific_bind_address_is_used_as_is() {
        let config = Config {
            host: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
            port: 9000,
            ..Config::default()
        };
        assert_eq!(gateway_endpoint(&config), "http://10.0.0.5:9000/api/graphql");
    }

    #[test]
    fn post_query_is_parameterized() {
        assert!(POST_BY_SLUG_QUERY.contains("post(slug: $slug)"));
        assert!(async_graphql::parser::parse_query(POST_BY_SLUG_QUERY).is_ok());
        assert!(async_graphql::parser::parse_query(ALL_POSTS_QUERY).is_ok());
    }

    #[test]
    fn errors_array_is_optional_in_envelope() {
        let response: GraphQLResponse<PostBySlugData> =
            serde_json::from_str(r#"{"data":{"post":null}}"#).unwrap();
        assert!(response.errors.is_empty());
        assert!(response.data.unwrap().post.is_none());
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_request_error() {
        let client = GatewayClient::new(Duration::from_millis(500)).unwrap();
        let err = client
            .all_posts("http://127.0.0.1:1/api/graphql")
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Request(_)));
    }
}
