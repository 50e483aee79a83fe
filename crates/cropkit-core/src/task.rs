//! Cooperative cancellation and single-shot task completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::CropError;

/// Shared flag checked by long-running work between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Work already in progress finishes its current
    /// step before observing the flag.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail with [`CropError::Cancelled`] if cancellation was requested.
    pub fn check(&self) -> Result<(), CropError> {
        if self.is_cancelled() {
            Err(CropError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Handle to a background task that delivers exactly one result.
pub struct TaskHandle<T> {
    receiver: Receiver<Result<T, CropError>>,
    cancel: CancelToken,
    thread: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Run `work` on a new thread. The closure receives the task's cancel
    /// token; a cancelled task always reports [`CropError::Cancelled`].
    pub fn spawn<F>(name: &str, work: F) -> Result<Self, CropError>
    where
        F: FnOnce(&CancelToken) -> Result<T, CropError> + Send + 'static,
    {
        let cancel = CancelToken::new();
        let (tx, rx) = mpsc::sync_channel(1);
        let worker_cancel = cancel.clone();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let result = work(&worker_cancel).and_then(|value| {
                    worker_cancel.check()?;
                    Ok(value)
                });
                // The receiver may already be gone; nobody is waiting then.
                let _ = tx.send(result);
            })
            .map_err(|e| CropError::WorkerSpawn(e.to_string()))?;

        Ok(Self {
            receiver: rx,
            cancel,
            thread: Some(thread),
        })
    }
}

impl<T> TaskHandle<T> {
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the task finishes.
    pub fn wait(mut self) -> Result<T, CropError> {
        let result = self.receiver.recv().unwrap_or(Err(CropError::Cancelled));
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        result
    }

    /// Block for at most `timeout`. Returns `None` if the task is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, CropError>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(CropError::Cancelled)),
        }
    }

    /// Poll without blocking.
    pub fn try_result(&self) -> Option<Result<T, CropError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(CropError::Cancelled)),
        }
    }
}
