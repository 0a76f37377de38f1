//! Multi-platform dispatch
//!
//! Renders and publishes one message to every configured platform in turn.
//! Each platform gets its own composition pass (mentions, styling, chunking
//! against its limit) and its own thread; one platform failing never stops
//! the others. Platforms are paced with a pause between them, a longer one
//! after a rate-limit-sensitive platform.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::composer::compose;
use crate::delay::{Sleeper, TokioSleeper};
use crate::platforms::Platform;
use crate::publisher::{ThreadOutcome, ThreadPublisher};
use crate::types::{Message, PersonDirectory, PublishResult};

const INTER_PLATFORM_DELAY: Duration = Duration::from_secs(2);
const RATE_LIMITED_PLATFORM_DELAY: Duration = Duration::from_secs(10);

/// How the dispatch as a whole went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    AllSucceeded,
    PartialSuccess,
    AllFailed,
}

/// Per-platform outcomes for one dispatched message.
#[derive(Debug)]
pub struct DispatchReport {
    pub outcomes: Vec<ThreadOutcome>,
}

impl DispatchReport {
    pub fn results(&self) -> impl Iterator<Item = &PublishResult> {
        self.outcomes.iter().map(|o| &o.result)
    }

    /// Ternary summary. An empty platform set counts as success: there was
    /// nothing to fail.
    pub fn outcome(&self) -> DispatchOutcome {
        let total = self.outcomes.len();
        let succeeded = self.outcomes.iter().filter(|o| o.success()).count();

        if succeeded == total {
            DispatchOutcome::AllSucceeded
        } else if succeeded == 0 {
            DispatchOutcome::AllFailed
        } else {
            DispatchOutcome::PartialSuccess
        }
    }
}

pub struct MultiPlatformDispatcher {
    publisher: ThreadPublisher,
    sleeper: Arc<dyn Sleeper>,
}

impl MultiPlatformDispatcher {
    pub fn new() -> Self {
        Self {
            publisher: ThreadPublisher::new(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the delay source for both inter-chunk and inter-platform
    /// pauses, letting tests observe them instead of waiting them out.
    pub fn with_sleeper(sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            publisher: ThreadPublisher::with_sleeper(sleeper.clone()),
            sleeper,
        }
    }

    /// Publish `message` to every platform, sequentially, in the order
    /// given. Returns one outcome per platform.
    pub async fn dispatch(
        &self,
        message: &Message,
        people: &PersonDirectory,
        platforms: &[Box<dyn Platform>],
    ) -> DispatchReport {
        info!(
            message_id = %message.id,
            platforms = platforms.len(),
            "dispatching message"
        );

        let mut outcomes = Vec::with_capacity(platforms.len());
        for (i, platform) in platforms.iter().enumerate() {
            let kind = platform.kind();
            let chunks = compose(&message.text, people, kind, platform.character_limit());

            let outcome = self
                .publisher
                .publish_thread(platform.as_ref(), &chunks, &message.attachments)
                .await;
            if !outcome.success() {
                warn!(platform = %kind, "platform publish failed, continuing with remaining platforms");
            }
            outcomes.push(outcome);

            if i + 1 < platforms.len() {
                let pause = if platform.rate_limit_sensitive() {
                    RATE_LIMITED_PLATFORM_DELAY
                } else {
                    INTER_PLATFORM_DELAY
                };
                self.sleeper.sleep(pause).await;
            }
        }

        let report = DispatchReport { outcomes };
        info!(outcome = ?report.outcome(), "dispatch finished");
        report
    }
}

impl Default for MultiPlatformDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
