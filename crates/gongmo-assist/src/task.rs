use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::AssistError;

/// A one-shot timer: after `delay` it runs `work` and hands the result to
/// `on_complete`. Cancelling before the delay elapses drops both closures.
#[derive(Debug)]
pub struct DeferredTask {
    id: Uuid,
    label: &'static str,
    handle: JoinHandle<()>,
}

impl DeferredTask {
    /// Spawns onto the current tokio runtime.
    pub fn start<T, W, C>(label: &'static str, delay: Duration, work: W, on_complete: C) -> Self
    where
        T: Send + 'static,
        W: FnOnce() -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let id = Uuid::new_v4();
        let span = tracing::debug_span!("deferred_task", %id, label);
        let handle = tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;
                let value = work();
                on_complete(value);
                debug!("completed");
            }
            .instrument(span),
        );
        debug!(%id, label, delay_ms = delay.as_millis() as u64, "deferred task started");
        Self { id, label, handle }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// No-op when the task already completed.
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            debug!(id = %self.id, label = self.label, "deferred task cancelled");
        }
        self.handle.abort();
    }

    pub async fn join(self) -> Result<(), AssistError> {
        match self.handle.await {
            Ok(()) => Ok(()),
            Err(err) if err.is_cancelled() => Err(AssistError::Cancelled(self.id)),
            Err(err) => Err(AssistError::Panicked {
                id: self.id,
                message: err.to_string(),
            }),
        }
    }
}
