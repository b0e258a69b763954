use std::{io::ErrorKind, path::Path};

use tokio::fs;
use tracing::{debug, error, info};

use crate::error::ContentError;
use crate::state::AppState;

const DEFAULT_LAYOUT: &str = include_str!("../content/layout.html");
const DEFAULT_NOT_FOUND: &str = include_str!("../content/not_found.html");

/// HTML shells the views render into. Either file may be left out of the
/// content directory, in which case the bundled copy is used.
#[derive(Debug, Clone, PartialEq)]
pub struct Templates {
    /// Placeholders: `{{ title }}`, `{{ head }}`, `{{ content }}`.
    pub layout_html: String,
    /// Placeholder: `{{slug}}`.
    pub not_found_html: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            layout_html: DEFAULT_LAYOUT.to_string(),
            not_found_html: DEFAULT_NOT_FOUND.to_string(),
        }
    }
}

impl Templates {
    pub async fn load(content_dir: &Path) -> Result<Self, ContentError> {
        Ok(Self {
            layout_html: read_or_default(&content_dir.join("layout.html"), DEFAULT_LAYOUT).await?,
            not_found_html: read_or_default(&content_dir.join("not_found.html"), DEFAULT_NOT_FOUND)
                .await?,
        })
    }
}

async fn read_or_default(path: &Path, fallback: &str) -> Result<String, ContentError> {
    match fs::read_to_string(path).await {
        Ok(html) => Ok(html),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} not found, using the bundled template", path.display());
            Ok(fallback.to_string())
        }
        Err(source) => Err(ContentError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub async fn reload_templates(app_state: &AppState) {
    info!("Reloading templates...");
    match Templates::load(&app_state.config.content_dir).await {
        Ok(templates) => {
            *app_state.templates.write().await = templates;
            info!("Templates successfully reloaded.");
        }
        Err(e) => {
            error!("Failed to reload templates: {}", e);
        }
    }
}
