use crate::errors::{AppError, AppResult};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Runs a callback with the latest value once no new value has arrived for `delay`.
///
/// Each [`call`](Debouncer::call) replaces the pending value and restarts the quiet
/// period. Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    handle: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(delay: Duration, mut callback: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        let handle = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                if pending.is_none() {
                    match rx.recv().await {
                        Some(value) => pending = Some(value),
                        None => break,
                    }
                    continue;
                }

                tokio::select! {
                    received = rx.recv() => match received {
                        Some(value) => pending = Some(value),
                        None => break,
                    },
                    _ = tokio::time::sleep(delay) => {
                        if let Some(value) = pending.take() {
                            callback(value);
                        }
                    }
                }
            }

            // Closed channel: flush whatever is still waiting.
            if let Some(value) = pending.take() {
                callback(value);
            }
        });

        Self { tx, handle }
    }

    pub fn call(&self, value: T) -> AppResult<()> {
        self.tx
            .send(value)
            .map_err(|_| AppError::InvalidInput("Debouncer is no longer running".into()))
    }

    /// Flushes the pending value, if any, and waits for the task to stop.
    pub async fn finish(self) -> AppResult<()> {
        drop(self.tx);
        self.handle
            .await
            .map_err(|e| AppError::IoError(format!("Debounce task failed: {e}")))
    }
}
