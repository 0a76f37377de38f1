//! Sequential thread publishing
//!
//! Publishes a chunked message to one platform as a reply chain: the first
//! chunk becomes the thread root, every later chunk replies to its
//! predecessor while pointing back at the root. Chunks go out strictly in
//! order with the platform's pause between them; the first failure stops
//! the thread, leaving already-published chunks in place.
//!
//! Cancelling the returned future between chunks abandons the remainder of
//! the thread without touching what was already posted.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::delay::{Sleeper, TokioSleeper};
use crate::error::{CrosscastError, PlatformError};
use crate::platforms::Platform;
use crate::types::{Chunk, ChunkReceipt, ImageAttachment, PostRef, PublishResult, ReplyRefs};

/// Everything one thread publish produced: per-chunk receipts for whatever
/// made it out, plus the summarized result.
#[derive(Debug, Clone)]
pub struct ThreadOutcome {
    pub receipts: Vec<ChunkReceipt>,
    pub result: PublishResult,
}

impl ThreadOutcome {
    pub fn success(&self) -> bool {
        self.result.success
    }
}

pub struct ThreadPublisher {
    sleeper: Arc<dyn Sleeper>,
}

impl ThreadPublisher {
    pub fn new() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the delay source, letting tests observe pauses instead of
    /// waiting them out.
    pub fn with_sleeper(sleeper: Arc<dyn Sleeper>) -> Self {
        Self { sleeper }
    }

    /// Publish `chunks` to `platform` as one reply-chained thread.
    ///
    /// Attachments ride the first chunk only. Every chunk is validated
    /// before anything is posted, so an oversized chunk fails the thread
    /// without side effects.
    pub async fn publish_thread(
        &self,
        platform: &dyn Platform,
        chunks: &[Chunk],
        attachments: &[ImageAttachment],
    ) -> ThreadOutcome {
        let kind = platform.kind();
        if chunks.is_empty() {
            warn!(platform = %kind, "nothing to publish");
            return failure(
                platform,
                Vec::new(),
                PlatformError::Validation("No chunks to publish".to_string()),
                None,
            );
        }

        for chunk in chunks {
            if let Err(e) = platform.validate_content(&chunk.text) {
                warn!(platform = %kind, chunk = chunk.index, error = %e, "preflight validation failed");
                return failure(
                    platform,
                    Vec::new(),
                    into_platform_error(e),
                    Some(chunk.index),
                );
            }
        }

        info!(platform = %kind, chunks = chunks.len(), "publishing thread");

        let mut receipts: Vec<ChunkReceipt> = Vec::new();
        let mut root: Option<PostRef> = None;
        let mut parent: Option<PostRef> = None;

        for chunk in chunks {
            if chunk.index > 0 {
                self.sleeper.sleep(platform.inter_chunk_delay()).await;
            }

            let reply = match (&root, &parent) {
                (Some(root), Some(parent)) => Some(ReplyRefs {
                    root: root.clone(),
                    parent: parent.clone(),
                }),
                _ => None,
            };
            let chunk_attachments = if chunk.index == 0 { attachments } else { &[] };

            debug!(
                platform = %kind,
                chunk = chunk.index,
                total = chunk.total,
                "publishing chunk"
            );
            match platform
                .publish_chunk(&chunk.text, reply.as_ref(), chunk_attachments)
                .await
            {
                Ok(post) => {
                    receipts.push(ChunkReceipt {
                        index: chunk.index,
                        post: post.clone(),
                    });
                    if root.is_none() {
                        root = Some(post.clone());
                    }
                    parent = Some(post);
                }
                Err(e) => {
                    warn!(
                        platform = %kind,
                        chunk = chunk.index,
                        error = %e,
                        "chunk failed, abandoning rest of thread"
                    );
                    return failure(
                        platform,
                        receipts,
                        into_platform_error(e),
                        Some(chunk.index),
                    );
                }
            }
        }

        let root_post = &receipts[0].post;
        let result = PublishResult {
            platform: kind,
            success: true,
            post_id: Some(root_post.id().to_string()),
            post_url: platform.post_url(root_post),
            error: None,
            failed_chunk: None,
            published_at: Some(Utc::now().timestamp()),
        };
        info!(
            platform = %kind,
            post_id = result.post_id.as_deref().unwrap_or(""),
            "thread published"
        );

        ThreadOutcome { receipts, result }
    }
}

impl Default for ThreadPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the failed outcome. When part of the thread already went out, the
/// root's id and URL are reported so the partial thread can be found.
fn failure(
    platform: &dyn Platform,
    receipts: Vec<ChunkReceipt>,
    error: PlatformError,
    failed_chunk: Option<usize>,
) -> ThreadOutcome {
    let root = receipts.first().map(|r| &r.post);
    let result = PublishResult {
        platform: platform.kind(),
        success: false,
        post_id: root.map(|p| p.id().to_string()),
        post_url: root.and_then(|p| platform.post_url(p)),
        error: Some(error),
        failed_chunk,
        published_at: None,
    };
    ThreadOutcome { receipts, result }
}

fn into_platform_error(error: CrosscastError) -> PlatformError {
    match error {
        CrosscastError::Platform(e) => e,
        other => PlatformError::Posting(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::RecordingSleeper;
    use crate::platforms::MockPlatform;
    use crate::types::{ImageMimeType, PlatformKind};

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        let total = texts.len();
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                index,
                total,
                text: text.to_string(),
            })
            .collect()
    }

    fn publisher_with_recorder() -> (ThreadPublisher, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        (
            ThreadPublisher::with_sleeper(sleeper.clone()),
            sleeper,
        )
    }

    #[tokio::test]
    async fn test_single_chunk_thread() {
        let (publisher, sleeper) = publisher_with_recorder();
        let platform = MockPlatform::success(PlatformKind::Twitter);

        let outcome = publisher
            .publish_thread(&platform, &chunks(&["hello"]), &[])
            .await;

        assert!(outcome.success());
        assert_eq!(outcome.receipts.len(), 1);
        assert_eq!(sleeper.sleep_count(), 0);
        assert_eq!(
            outcome.result.post_id.as_deref(),
            Some("twitter-mock-1")
        );
        assert!(outcome.result.published_at.is_some());
        assert_eq!(
            outcome.result.post_url.as_deref(),
            Some("https://mock.example/twitter-mock-1")
        );
    }

    #[tokio::test]
    async fn test_reply_chain_points_at_root_and_parent() {
        let (publisher, _) = publisher_with_recorder();
        let platform = MockPlatform::success(PlatformKind::Bluesky);

        let outcome = publisher
            .publish_thread(&platform, &chunks(&["one", "two", "three"]), &[])
            .await;
        assert!(outcome.success());

        let published = platform.published();
        assert_eq!(published.len(), 3);
        assert!(published[0].reply.is_none());

        let first = published[1].reply.as_ref().unwrap();
        assert_eq!(first.root.id(), "bluesky-mock-1");
        assert_eq!(first.parent.id(), "bluesky-mock-1");

        let second = published[2].reply.as_ref().unwrap();
        assert_eq!(second.root.id(), "bluesky-mock-1");
        assert_eq!(second.parent.id(), "bluesky-mock-2");
    }

    #[tokio::test]
    async fn test_sleeps_between_chunks_only() {
        let (publisher, sleeper) = publisher_with_recorder();
        let platform = MockPlatform::success(PlatformKind::Twitter);

        publisher
            .publish_thread(&platform, &chunks(&["a", "b", "c", "d"]), &[])
            .await;

        assert_eq!(sleeper.sleep_count(), 3);
        for pause in sleeper.requested() {
            assert_eq!(pause, platform.inter_chunk_delay());
        }
    }

    #[tokio::test]
    async fn test_failure_stops_thread() {
        let (publisher, sleeper) = publisher_with_recorder();
        let platform = MockPlatform::failing_at(PlatformKind::Bluesky, 2, "boom");

        let outcome = publisher
            .publish_thread(&platform, &chunks(&["one", "two", "three"]), &[])
            .await;

        assert!(!outcome.success());
        // The third chunk is never attempted.
        assert_eq!(platform.publish_call_count(), 2);
        assert_eq!(outcome.receipts.len(), 1);
        assert_eq!(outcome.result.failed_chunk, Some(1));
        assert_eq!(sleeper.sleep_count(), 1);
        assert!(outcome.result.published_at.is_none());

        // The partial thread's root is still reported.
        assert_eq!(outcome.result.post_id.as_deref(), Some("bluesky-mock-1"));
        match outcome.result.error {
            Some(PlatformError::Posting(ref msg)) => assert_eq!(msg, "boom"),
            ref other => panic!("Expected posting error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_attachments_ride_first_chunk_only() {
        let (publisher, _) = publisher_with_recorder();
        let platform = MockPlatform::success(PlatformKind::Bluesky);
        let attachments = vec![
            ImageAttachment::new(vec![1], ImageMimeType::Png),
            ImageAttachment::new(vec![2], ImageMimeType::Jpeg),
        ];

        publisher
            .publish_thread(&platform, &chunks(&["one", "two"]), &attachments)
            .await;

        let published = platform.published();
        assert_eq!(published[0].attachment_count, 2);
        assert_eq!(published[1].attachment_count, 0);
    }

    #[tokio::test]
    async fn test_empty_chunk_list_is_validation_failure() {
        let (publisher, _) = publisher_with_recorder();
        let platform = MockPlatform::success(PlatformKind::Twitter);

        let outcome = publisher.publish_thread(&platform, &[], &[]).await;

        assert!(!outcome.success());
        assert_eq!(platform.publish_call_count(), 0);
        assert_eq!(outcome.result.failed_chunk, None);
        assert!(matches!(
            outcome.result.error,
            Some(PlatformError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_preflight_rejects_oversized_chunk_before_posting() {
        let (publisher, _) = publisher_with_recorder();
        let platform = MockPlatform::with_limit(PlatformKind::Twitter, 10);

        let outcome = publisher
            .publish_thread(
                &platform,
                &chunks(&["short", "this one is far too long"]),
                &[],
            )
            .await;

        assert!(!outcome.success());
        // Nothing was posted, not even the valid first chunk.
        assert_eq!(platform.publish_call_count(), 0);
        assert_eq!(outcome.result.failed_chunk, Some(1));
        assert!(outcome.result.post_id.is_none());
    }

    #[tokio::test]
    async fn test_uri_cid_platform_roundtrip() {
        let (publisher, _) = publisher_with_recorder();
        let platform = MockPlatform::with_uri_cid_refs(PlatformKind::Bluesky);

        let outcome = publisher
            .publish_thread(&platform, &chunks(&["one", "two"]), &[])
            .await;

        assert!(outcome.success());
        let published = platform.published();
        let reply = published[1].reply.as_ref().unwrap();
        assert!(reply.root.id().starts_with("at://did:plc:mock/"));
        assert!(outcome
            .result
            .post_url
            .as_deref()
            .unwrap()
            .contains("at://did:plc:mock/"));
    }
}
