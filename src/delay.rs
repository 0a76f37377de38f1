//! Cancellable delay abstraction for publish pacing
//!
//! Inter-chunk and inter-platform pauses go through [`Sleeper`] so tests can
//! substitute a recording fake instead of sleeping in real time.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
///
/// The returned future completes only when the timer fires; dropping it
/// cancels the timer, so dropping a publish invocation cancels any pending
/// pause and no further network call starts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test sleeper that records every requested pause and returns immediately.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    requested: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration requested so far, in order.
    pub fn requested(&self) -> Vec<Duration> {
        self.requested.lock().unwrap().clone()
    }

    pub fn sleep_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.requested.lock().unwrap().push(duration);
    }
}
