use crate::error::Result;
use async_trait::async_trait;

/// The editor-side buffer the engine writes remote changes into.
///
/// Implementations must not feed their own writes back as edits, or must
/// tolerate them: the tracker diffs an echo against its content and finds
/// nothing to push.
#[async_trait]
pub trait EditorBuffer: Send + Sync + 'static {
    async fn replace_content(&self, file_id: &str, content: &str) -> Result<()>;
}

/// Discards every write. For headless use and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEditor;

#[async_trait]
impl EditorBuffer for NullEditor {
    async fn replace_content(&self, _file_id: &str, _content: &str) -> Result<()> {
        Ok(())
    }
}
