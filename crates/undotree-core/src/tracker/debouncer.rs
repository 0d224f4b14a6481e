use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// At most one scheduled task per file; scheduling again cancels the last.
#[derive(Debug, Default)]
pub(crate) struct Debounce {
    handle: Option<JoinHandle<()>>,
}

impl Debounce {
    /// Cancel any scheduled task and run `task` after `delay` of quiet.
    pub(crate) fn reschedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Forget the handle without aborting. Used by the task itself once it
    /// fires, so a later reschedule cannot abort it mid-flight.
    pub(crate) fn detach(&mut self) {
        self.handle.take();
    }

    pub(crate) fn is_scheduled(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debounce {
    fn drop(&mut self) {
        self.cancel();
    }
}
