use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "blog.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Shown in the index title and appended to post titles.
    pub site_name: String,
    /// Holds `posts/`, `static/` and the HTML templates.
    pub content_dir: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    /// Overrides the gateway URL that page loaders otherwise derive from the
    /// request's `Host` header.
    pub gateway_url: Option<String>,
    pub gateway_timeout_secs: u64,
    #[serde(skip)]
    pub is_development: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_name: "Next.js Blog Example with Rust".to_string(),
            content_dir: PathBuf::from("content"),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            gateway_url: None,
            gateway_timeout_secs: 10,
            is_development: false,
        }
    }
}

impl Config {
    /// Loads `BLOG_CONFIG` (or `blog.toml` when present) and applies
    /// environment overrides on top.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os("BLOG_CONFIG").map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if explicit.is_some() || path.exists() {
            Self::from_file(&path)?
        } else {
            debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "PORT",
                value: port,
            })?;
        }
        if let Some(dir) = lookup("BLOG_CONTENT_DIR") {
            self.content_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("BLOG_GATEWAY_URL") {
            self.gateway_url = Some(url);
        }
        self.is_development = lookup("RUST_ENV").is_some_and(|v| v == "development");
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.content_dir.join("posts")
    }

    pub fn static_dir(&self) -> PathBuf {
        self.content_dir.join("static")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("site_name = \"Notes\"\nport = 3000\n").unwrap();
        assert_eq!(config.site_name, "Notes");
        assert_eq!(config.port, 3000);
        assert_eq!(config.content_dir, PathBuf::from("content"));
        assert_eq!(config.gateway_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("colour = \"blue\"").is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("PORT", "9000"),
                ("BLOG_CONTENT_DIR", "/srv/blog"),
                ("RUST_ENV", "development"),
            ]))
            .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.posts_dir(), PathBuf::from("/srv/blog/posts"));
        assert!(config.is_development);
    }

    #[test]
    fn bad_port_is_an_error() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "PORT", .. }));
    }

    #[test]
    fn reads_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.toml");
        std::fs::write(&path, "gateway_url = \"http://gateway:8080/api/graphql\"\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(
            config.gateway_url.as_deref(),
            Some("http://gateway:8080/api/graphql")
        );
    }
}
