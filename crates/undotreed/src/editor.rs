use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use undotree_core::{EditorBuffer, Result};

/// How long a write of ours masks watcher events for the same path.
const ECHO_WINDOW: Duration = Duration::from_millis(250);

/// Paths the daemon just wrote, so the watcher can skip the echo.
#[derive(Clone, Default)]
pub struct PendingWrites {
    // path -> when we stop ignoring it
    paths: Arc<Mutex<HashMap<String, Instant>>>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }

    pub fn add(&self, path: &Path) {
        self.paths
            .lock()
            .insert(Self::normalize(path), Instant::now() + ECHO_WINDOW);
    }

    pub fn should_ignore(&self, path: &Path) -> bool {
        let mut paths = self.paths.lock();
        let key = Self::normalize(path);

        match paths.get(&key) {
            Some(&expiry) if Instant::now() < expiry => true,
            Some(_) => {
                paths.remove(&key);
                false
            }
            None => false,
        }
    }
}

/// Treats each tracked file on disk as an editor buffer. The file id is the
/// file's path.
#[derive(Clone)]
pub struct FileEditor {
    pending: PendingWrites,
}

impl FileEditor {
    pub fn new(pending: PendingWrites) -> Self {
        Self { pending }
    }
}

#[async_trait]
impl EditorBuffer for FileEditor {
    async fn replace_content(&self, file_id: &str, content: &str) -> Result<()> {
        let path = PathBuf::from(file_id);
        self.pending.add(&path);
        tokio::fs::write(&path, content).await?;
        tracing::info!("[Editor] Rewrote {} ({} chars)", file_id, content.chars().count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_write_masks_path() {
        let pending = PendingWrites::new();
        let path = Path::new("/tmp/notes.txt");
        assert!(!pending.should_ignore(path));

        pending.add(path);
        assert!(pending.should_ignore(path));
        assert!(!pending.should_ignore(Path::new("/tmp/other.txt")));
    }

    #[tokio::test]
    async fn test_file_editor_writes_and_masks_echo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "old").unwrap();

        let pending = PendingWrites::new();
        let editor = FileEditor::new(pending.clone());
        let file_id = path.to_string_lossy().to_string();
        editor.replace_content(&file_id, "new text").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new text");
        assert!(pending.should_ignore(&path));
    }
}
