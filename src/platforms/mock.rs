//! Mock platform implementation for testing
//!
//! A configurable platform that records every publish call and can be told
//! to fail outright or at the nth chunk. Used by integration tests to
//! verify thread and dispatch logic without credentials or network access.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::{ImageAttachment, PlatformKind, PostRef, ReplyRefs};

/// One recorded, successful publish call.
#[derive(Debug, Clone)]
pub struct PublishedChunk {
    pub text: String,
    pub reply: Option<ReplyRefs>,
    pub attachment_count: usize,
}

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Which platform the mock claims to be
    pub kind: PlatformKind,

    /// Character limit for validation and chunk sizing
    pub character_limit: usize,

    /// Pause the publisher should insert between chunks
    pub inter_chunk_delay: Duration,

    /// Whether the publisher should treat this platform as rate limited
    pub rate_limit_sensitive: bool,

    /// Whether publishing succeeds at all
    pub post_succeeds: bool,

    /// Fail exactly the nth publish call (1-based)
    pub fail_at_call: Option<usize>,

    /// Error message returned on failure
    pub post_error: Option<String>,

    /// Emit (uri, cid) refs instead of plain ids
    pub uri_cid_refs: bool,

    /// Number of times publish_chunk has been called
    pub publish_call_count: Arc<Mutex<usize>>,

    /// Successful publishes (for verification)
    pub published: Arc<Mutex<Vec<PublishedChunk>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            kind: PlatformKind::Bluesky,
            character_limit: 280,
            inter_chunk_delay: Duration::from_millis(0),
            rate_limit_sensitive: false,
            post_succeeds: true,
            fail_at_call: None,
            post_error: None,
            uri_cid_refs: false,
            publish_call_count: Arc::new(Mutex::new(0)),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock platform for testing
#[derive(Debug)]
pub struct MockPlatform {
    config: MockConfig,
}

impl MockPlatform {
    /// Create a new mock platform with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Create a mock platform that always succeeds
    pub fn success(kind: PlatformKind) -> Self {
        Self::new(MockConfig {
            kind,
            ..Default::default()
        })
    }

    /// Create a mock platform that fails every publish
    pub fn post_failure(kind: PlatformKind, error: &str) -> Self {
        Self::new(MockConfig {
            kind,
            post_succeeds: false,
            post_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Create a mock platform that fails exactly the nth publish (1-based)
    pub fn failing_at(kind: PlatformKind, call: usize, error: &str) -> Self {
        Self::new(MockConfig {
            kind,
            fail_at_call: Some(call),
            post_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Create a mock platform with a character limit
    pub fn with_limit(kind: PlatformKind, limit: usize) -> Self {
        Self::new(MockConfig {
            kind,
            character_limit: limit,
            ..Default::default()
        })
    }

    /// Create a mock platform that hands out (uri, cid) refs
    pub fn with_uri_cid_refs(kind: PlatformKind) -> Self {
        Self::new(MockConfig {
            kind,
            uri_cid_refs: true,
            ..Default::default()
        })
    }

    /// Get the number of times publish_chunk was called
    pub fn publish_call_count(&self) -> usize {
        *self.config.publish_call_count.lock().unwrap()
    }

    /// Get every successful publish, in order
    pub fn published(&self) -> Vec<PublishedChunk> {
        self.config.published.lock().unwrap().clone()
    }

    /// Get the text of every successful publish, in order
    pub fn published_texts(&self) -> Vec<String> {
        self.published().into_iter().map(|p| p.text).collect()
    }

    fn next_ref(&self, sequence: usize) -> PostRef {
        if self.config.uri_cid_refs {
            PostRef::UriCid {
                uri: format!(
                    "at://did:plc:mock/app.bsky.feed.post/{}-{}",
                    self.config.kind, sequence
                ),
                cid: format!("cid-{}", sequence),
            }
        } else {
            PostRef::Generic {
                id: format!("{}-mock-{}", self.config.kind, sequence),
            }
        }
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn kind(&self) -> PlatformKind {
        self.config.kind
    }

    fn character_limit(&self) -> usize {
        self.config.character_limit
    }

    fn inter_chunk_delay(&self) -> Duration {
        self.config.inter_chunk_delay
    }

    fn rate_limit_sensitive(&self) -> bool {
        self.config.rate_limit_sensitive
    }

    fn validate_content(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Err(PlatformError::Validation("Content cannot be empty".to_string()).into());
        }

        let chars = text.chars().count();
        if chars > self.config.character_limit {
            return Err(PlatformError::Validation(format!(
                "Content exceeds {} character limit (got {} characters)",
                self.config.character_limit, chars
            ))
            .into());
        }

        Ok(())
    }

    async fn publish_chunk(
        &self,
        text: &str,
        reply: Option<&ReplyRefs>,
        attachments: &[ImageAttachment],
    ) -> Result<PostRef> {
        let sequence = {
            let mut count = self.config.publish_call_count.lock().unwrap();
            *count += 1;
            *count
        };

        let failing = self.config.fail_at_call == Some(sequence) || !self.config.post_succeeds;
        if failing {
            let error_msg = self
                .config
                .post_error
                .clone()
                .unwrap_or_else(|| "Mock posting failed".to_string());
            return Err(PlatformError::Posting(error_msg).into());
        }

        self.config.published.lock().unwrap().push(PublishedChunk {
            text: text.to_string(),
            reply: reply.cloned(),
            attachment_count: attachments.len(),
        });

        Ok(self.next_ref(sequence))
    }

    fn post_url(&self, post: &PostRef) -> Option<String> {
        match post {
            PostRef::Generic { id } => Some(format!("https://mock.example/{}", id)),
            PostRef::UriCid { uri, .. } => Some(format!("https://mock.example/{}", uri)),
        }
    }
}
