//! Fire-and-forget cache writes that must finish before the host exits.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Set of in-flight background tasks.
///
/// Spawning never waits for the task. [`BackgroundTasks::drain`] waits for
/// everything spawned so far; hosts call it before shutting down and tests
/// call it before asserting on cache contents.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.inner.lock().await;
        // reap finished tasks so the set doesn't grow without bound
        while set.try_join_next().is_some() {}
        set.spawn(task);
    }

    /// Wait for every spawned task to complete.
    pub async fn drain(&self) {
        let mut set = self.inner.lock().await;
        while let Some(result) = set.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "background task failed");
            }
        }
    }

    pub async fn pending(&self) -> usize {
        self.inner.lock().await.len()
    }
}
