use crate::editor::PendingWrites;
use notify::Event;
use std::path::Path;
use std::time::Duration;
use undotree_core::FileTracker;

/// Rename-style saves leave the path missing for a moment.
const RENAME_GRACE: Duration = Duration::from_millis(150);

pub fn file_id_for(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// True if `path` is still missing after [`RENAME_GRACE`].
async fn vanished(path: &Path) -> bool {
    if path.exists() {
        return false;
    }
    tokio::time::sleep(RENAME_GRACE).await;
    !path.exists()
}

/// Feed one watcher event to the tracker as buffer-change notifications.
///
/// Only files already being tracked are considered; removing a tracked file
/// closes it.
pub async fn handle_fs_event(event: Event, tracker: &FileTracker, pending: &PendingWrites) {
    if event.kind.is_access() || event.kind.is_other() {
        return;
    }
    tracing::trace!("[Watcher] Event: {:?}", event);

    for path in event.paths {
        let file_id = file_id_for(&path);
        if !tracker.is_tracked(&file_id) {
            continue;
        }

        if pending.should_ignore(&path) {
            tracing::trace!("[Watcher] Skipping our own write: {:?}", path);
            continue;
        }

        if (event.kind.is_remove() || !path.exists()) && vanished(&path).await {
            tracing::info!("[Watcher] {} removed, closing", file_id);
            tracker.close(&file_id);
            continue;
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => tracker.on_edit(&file_id, &text),
            Err(e) => tracing::warn!("[Watcher] Cannot read {}: {}", file_id, e),
        }
    }
}
