use std::{path::Path, sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use notify_debouncer_full::{
    new_debouncer,
    notify::{Error as NotifyError, RecursiveMode, Watcher},
    DebouncedEvent,
};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info};

use crate::state::{AppState, RefreshBroadcaster};
use crate::templates::reload_templates;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(tx): State<RefreshBroadcaster>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, tx))
}

async fn handle_socket(mut socket: WebSocket, tx: RefreshBroadcaster) {
    let mut rx = tx.subscribe();

    if rx.recv().await.is_ok()
        && socket.send(Message::Text("reload".into())).await.is_err()
    {
        debug!("Client disconnected before reload message could be sent");
    }
}

// Emacs lock files and backups.
fn is_editor_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(".#") || name.ends_with('~'))
}

fn is_relevant(event: &DebouncedEvent) -> bool {
    let kind = &event.kind;
    (kind.is_modify() || kind.is_create() || kind.is_remove())
        && !event.event.paths.iter().any(|path| is_editor_temp_file(path))
}

/// Watches the content directory; on change reloads templates and tells
/// connected browsers to refresh. Posts are read per request and need no reload.
pub fn start_content_watcher(
    tx: RefreshBroadcaster,
    app_state: Arc<AppState>,
) -> Result<(), NotifyError> {
    info!("Starting content watcher for hot-reload...");
    let (watcher_tx, mut watcher_rx) = tokio::sync::mpsc::channel(1);

    let mut debouncer = new_debouncer(
        Duration::from_millis(200),
        None,
        move |res: Result<Vec<DebouncedEvent>, Vec<NotifyError>>| match res {
            Ok(events) => {
                let changed: Vec<_> = events
                    .iter()
                    .filter(|event| is_relevant(event))
                    .flat_map(|event| event.event.paths.iter().map(|p| p.display().to_string()))
                    .collect();
                if changed.is_empty() {
                    return;
                }
                debug!("Relevant file change detected: {:?}", changed);
                // A full channel already has a reload queued.
                if let Err(TrySendError::Closed(_)) = watcher_tx.try_send(()) {
                    error!("Content watcher channel closed");
                }
            }
            Err(errors) => {
                for e in errors {
                    error!("Watcher error: {}", e);
                }
            }
        },
    )?;

    debouncer
        .watcher()
        .watch(&app_state.config.content_dir, RecursiveMode::Recursive)?;

    tokio::spawn(async move {
        // Dropping the debouncer stops the watch.
        let _debouncer = debouncer;
        while watcher_rx.recv().await.is_some() {
            info!("Content change detected, reloading templates and sending signal...");
            reload_templates(&app_state).await;

            if tx.send(()).is_err() {
                debug!("No browsers connected for reload");
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_temp_files_are_ignored() {
        assert!(is_editor_temp_file(Path::new("content/posts/.#hello-world.md")));
        assert!(is_editor_temp_file(Path::new("content/layout.html~")));
        assert!(!is_editor_temp_file(Path::new("content/posts/hello-world.md")));
    }
}
