//! Twitter platform implementation
//!
//! Posts through the v2 API with bearer authentication. Media still rides
//! the v1.1 upload endpoint, which takes base64 form payloads and returns
//! the media id that the v2 create-tweet call references.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::{ImageAttachment, PlatformKind, PostRef, ReplyRefs};

const DEFAULT_API_BASE: &str = "https://api.twitter.com";
const MEDIA_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";
const STANDARD_LIMIT: usize = 280;
const PREMIUM_LIMIT: usize = 25_000;
const INTER_CHUNK_DELAY: Duration = Duration::from_secs(5);

/// Map a Twitter API error response to a PlatformError.
fn map_twitter_error(status: StatusCode, body: &str, context: &str) -> PlatformError {
    match status.as_u16() {
        401 | 403 => PlatformError::Authentication(format!(
            "Twitter authentication failed during {}: {} {}. Please check your bearer token.",
            context, status, body
        )),
        429 => PlatformError::RateLimit(format!(
            "Twitter rate limit exceeded during {}: {}. Please wait before trying again.",
            context, body
        )),
        400 | 422 => PlatformError::Validation(format!(
            "Twitter rejected the request during {}: {}. Check content format and length.",
            context, body
        )),
        _ => PlatformError::Posting(format!(
            "Twitter operation failed during {}: {} {}",
            context, status, body
        )),
    }
}

/// Map a transport-level failure to a PlatformError.
fn transport_error(error: reqwest::Error, context: &str) -> PlatformError {
    if error.is_timeout() || error.is_connect() {
        PlatformError::Network(format!(
            "Network error while reaching Twitter during {}: {}. Check your internet connection.",
            context, error
        ))
    } else {
        PlatformError::Posting(format!(
            "Twitter request failed during {}: {}",
            context, error
        ))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct CreateTweetRequest {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<TweetReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<TweetMedia>,
}

#[derive(Debug, Serialize)]
struct TweetReply {
    in_reply_to_tweet_id: String,
}

#[derive(Debug, Serialize)]
struct TweetMedia {
    media_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

fn build_tweet_request(
    text: &str,
    reply_to: Option<String>,
    media_ids: Vec<String>,
) -> CreateTweetRequest {
    CreateTweetRequest {
        text: text.to_string(),
        reply: reply_to.map(|id| TweetReply {
            in_reply_to_tweet_id: id,
        }),
        media: if media_ids.is_empty() {
            None
        } else {
            Some(TweetMedia { media_ids })
        },
    }
}

/// Tweet id the chunk replies to. Twitter refs are plain ids; an AT-style
/// ref here means the caller mixed up platforms.
fn reply_target(reply: Option<&ReplyRefs>) -> Result<Option<String>> {
    match reply {
        None => Ok(None),
        Some(refs) => match &refs.parent {
            PostRef::Generic { id } => Ok(Some(id.clone())),
            PostRef::UriCid { .. } => Err(PlatformError::Posting(
                "Reply parent is not a tweet id".to_string(),
            )
            .into()),
        },
    }
}

// ============================================================================
// Client
// ============================================================================

/// Bearer token credential for the Twitter API.
#[derive(Debug)]
pub struct TwitterCredential {
    pub bearer_token: SecretString,
}

#[derive(Debug)]
pub struct TwitterClient {
    http: reqwest::Client,
    credential: TwitterCredential,
    premium: bool,
    api_base: String,
}

impl TwitterClient {
    /// Create a new Twitter client. `premium` raises the character limit
    /// from 280 to 25000; `api_base` overrides the default API host.
    pub fn new(credential: TwitterCredential, premium: bool, api_base: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credential,
            premium,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }

    fn bearer(&self) -> &str {
        self.credential.bearer_token.expose_secret()
    }

    async fn upload_media(&self, attachment: &ImageAttachment) -> Result<String> {
        debug!(
            bytes = attachment.bytes.len(),
            mime = %attachment.mime_type,
            "uploading media to Twitter"
        );

        let form = [
            ("media_data", BASE64.encode(&attachment.bytes)),
            ("media_category", "tweet_image".to_string()),
        ];
        let response = self
            .http
            .post(MEDIA_UPLOAD_URL)
            .bearer_auth(self.bearer())
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(e, "media upload"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_twitter_error(status, &body, "media upload").into());
        }

        let parsed: MediaUploadResponse = response.json().await.map_err(|e| {
            PlatformError::Posting(format!("Unexpected Twitter media upload response: {}", e))
        })?;
        Ok(parsed.media_id_string)
    }
}

#[async_trait]
impl Platform for TwitterClient {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Twitter
    }

    fn character_limit(&self) -> usize {
        if self.premium {
            PREMIUM_LIMIT
        } else {
            STANDARD_LIMIT
        }
    }

    fn inter_chunk_delay(&self) -> Duration {
        INTER_CHUNK_DELAY
    }

    fn rate_limit_sensitive(&self) -> bool {
        true
    }

    fn validate_content(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Err(PlatformError::Validation("Content cannot be empty".to_string()).into());
        }

        let limit = self.character_limit();
        let chars = text.chars().count();
        if chars > limit {
            return Err(PlatformError::Validation(format!(
                "Content exceeds Twitter's {} character limit (current: {} characters)",
                limit, chars
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
        let mut media_ids = Vec::new();
        for attachment in attachments {
            media_ids.push(self.upload_media(attachment).await?);
        }

        let request = build_tweet_request(text, reply_target(reply)?, media_ids);
        debug!(
            chars = text.chars().count(),
            in_reply = request.reply.is_some(),
            "posting to Twitter"
        );

        let response = self
            .http
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(self.bearer())
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, "posting"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_twitter_error(status, &body, "posting").into());
        }

        let parsed: CreateTweetResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Posting(format!("Unexpected Twitter response: {}", e)))?;
        debug!(tweet_id = %parsed.data.id, "posted to Twitter");

        Ok(PostRef::Generic { id: parsed.data.id })
    }

    fn post_url(&self, post: &PostRef) -> Option<String> {
        match post {
            PostRef::Generic { id } => Some(format!("https://x.com/i/status/{}", id)),
            PostRef::UriCid { .. } => None,
        }
    }
}
