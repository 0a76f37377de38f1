//! Bluesky platform implementation
//!
//! Talks XRPC to the session's PDS: `com.atproto.repo.createRecord` for
//! posts, `com.atproto.repo.uploadBlob` for images, and
//! `com.atproto.identity.resolveHandle` for mention facets. Replies carry
//! the strong (uri, cid) pair of both the thread root and the parent.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlatformError, Result};
use crate::facets::{extract_facets, Facet, HandleResolver};
use crate::platforms::Platform;
use crate::types::{ImageAttachment, PlatformKind, PostRef, ReplyRefs};

const CHARACTER_LIMIT: usize = 300;
const INTER_CHUNK_DELAY: Duration = Duration::from_secs(1);
const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Map a Bluesky XRPC error response to a PlatformError.
fn map_bluesky_error(status: StatusCode, body: &str, context: &str) -> PlatformError {
    match status.as_u16() {
        401 | 403 => PlatformError::Authentication(format!(
            "Bluesky authentication failed during {}: {} {}. Please check your session and re-authenticate.",
            context, status, body
        )),
        400 => PlatformError::Validation(format!(
            "Bluesky rejected the request during {}: {}. Check content format and length.",
            context, body
        )),
        429 => PlatformError::RateLimit(format!(
            "Bluesky rate limit exceeded during {}: {}. Please wait before trying again.",
            context, body
        )),
        _ => PlatformError::Posting(format!(
            "Bluesky operation failed during {}: {} {}",
            context, status, body
        )),
    }
}

/// Map a transport-level failure to a PlatformError.
fn transport_error(error: reqwest::Error, context: &str) -> PlatformError {
    if error.is_timeout() || error.is_connect() {
        PlatformError::Network(format!(
            "Network error while connecting to Bluesky PDS during {}: {}. Check your internet connection and PDS availability.",
            context, error
        ))
    } else {
        PlatformError::Posting(format!(
            "Bluesky request failed during {}: {}",
            context, error
        ))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct CreateRecordRequest {
    repo: String,
    collection: &'static str,
    record: PostRecord,
}

#[derive(Debug, Serialize)]
struct PostRecord {
    #[serde(rename = "$type")]
    record_type: &'static str,
    text: String,
    #[serde(rename = "createdAt")]
    created_at: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    facets: Vec<Facet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<WireReplyRefs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embed: Option<ImageEmbed>,
}

#[derive(Debug, Serialize)]
struct WireReplyRefs {
    root: WireRef,
    parent: WireRef,
}

#[derive(Debug, Serialize)]
struct WireRef {
    uri: String,
    cid: String,
}

#[derive(Debug, Serialize)]
struct ImageEmbed {
    #[serde(rename = "$type")]
    embed_type: &'static str,
    images: Vec<EmbeddedImage>,
}

#[derive(Debug, Serialize)]
struct EmbeddedImage {
    image: serde_json::Value,
    alt: String,
}

#[derive(Debug, Deserialize)]
struct CreateRecordResponse {
    uri: String,
    cid: String,
}

#[derive(Debug, Deserialize)]
struct UploadBlobResponse {
    blob: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ResolveHandleResponse {
    did: String,
}

/// Bluesky replies need the strong ref of root and parent; a plain id means
/// the caller mixed up platforms.
fn wire_ref(post: &PostRef) -> Result<WireRef> {
    match post {
        PostRef::UriCid { uri, cid } => Ok(WireRef {
            uri: uri.clone(),
            cid: cid.clone(),
        }),
        PostRef::Generic { .. } => {
            Err(PlatformError::Posting("Reply reference is missing its cid".to_string()).into())
        }
    }
}

fn wire_reply(reply: Option<&ReplyRefs>) -> Result<Option<WireReplyRefs>> {
    match reply {
        None => Ok(None),
        Some(refs) => Ok(Some(WireReplyRefs {
            root: wire_ref(&refs.root)?,
            parent: wire_ref(&refs.parent)?,
        })),
    }
}

/// Split an AT URI like `at://did:plc:abc/app.bsky.feed.post/rkey` into
/// its authority and record key.
fn parse_at_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("at://")?;
    let mut parts = rest.splitn(3, '/');
    let authority = parts.next()?;
    let _collection = parts.next()?;
    let rkey = parts.next()?;
    if authority.is_empty() || rkey.is_empty() {
        return None;
    }
    Some((authority, rkey))
}

// ============================================================================
// Client
// ============================================================================

/// An authenticated Bluesky session, as returned by
/// `com.atproto.server.createSession`.
#[derive(Debug)]
pub struct BlueskySession {
    pub did: String,
    pub handle: String,
    pub access_jwt: SecretString,
    pub service: String,
}

#[derive(Debug)]
pub struct BlueskyClient {
    http: reqwest::Client,
    session: BlueskySession,
}

impl BlueskyClient {
    pub fn new(session: BlueskySession) -> Self {
        Self {
            http: reqwest::Client::new(),
            session,
        }
    }

    fn jwt(&self) -> &str {
        self.session.access_jwt.expose_secret()
    }

    fn xrpc_url(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.session.service, method)
    }

    async fn upload_blob(&self, attachment: &ImageAttachment) -> Result<serde_json::Value> {
        debug!(
            bytes = attachment.bytes.len(),
            mime = %attachment.mime_type,
            "uploading blob to Bluesky"
        );

        let response = self
            .http
            .post(self.xrpc_url("com.atproto.repo.uploadBlob"))
            .header(reqwest::header::CONTENT_TYPE, attachment.mime_type.as_str())
            .bearer_auth(self.jwt())
            .body(attachment.bytes.clone())
            .send()
            .await
            .map_err(|e| transport_error(e, "blob upload"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_bluesky_error(status, &body, "blob upload").into());
        }

        let parsed: UploadBlobResponse = response.json().await.map_err(|e| {
            PlatformError::Posting(format!("Unexpected Bluesky blob upload response: {}", e))
        })?;
        Ok(parsed.blob)
    }

    async fn build_embed(&self, attachments: &[ImageAttachment]) -> Result<Option<ImageEmbed>> {
        if attachments.is_empty() {
            return Ok(None);
        }

        let mut images = Vec::new();
        for attachment in attachments {
            let blob = self.upload_blob(attachment).await?;
            images.push(EmbeddedImage {
                image: blob,
                alt: attachment.alt_text.clone().unwrap_or_default(),
            });
        }
        Ok(Some(ImageEmbed {
            embed_type: "app.bsky.embed.images",
            images,
        }))
    }
}

#[async_trait]
impl HandleResolver for BlueskyClient {
    async fn resolve_handle(&self, handle: &str) -> Result<String> {
        let response = self
            .http
            .get(self.xrpc_url("com.atproto.identity.resolveHandle"))
            .query(&[("handle", handle)])
            .send()
            .await
            .map_err(|e| transport_error(e, "handle resolution"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_bluesky_error(status, &body, "handle resolution").into());
        }

        let parsed: ResolveHandleResponse = response.json().await.map_err(|e| {
            PlatformError::Posting(format!("Unexpected resolveHandle response: {}", e))
        })?;
        Ok(parsed.did)
    }
}

#[async_trait]
impl Platform for BlueskyClient {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Bluesky
    }

    fn character_limit(&self) -> usize {
        CHARACTER_LIMIT
    }

    fn inter_chunk_delay(&self) -> Duration {
        INTER_CHUNK_DELAY
    }

    fn validate_content(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Err(PlatformError::Validation("Content cannot be empty".to_string()).into());
        }

        let chars = text.chars().count();
        if chars > CHARACTER_LIMIT {
            return Err(PlatformError::Validation(format!(
                "Content exceeds Bluesky's {} character limit (current: {} characters)",
                CHARACTER_LIMIT, chars
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
        let facets = extract_facets(text, self).await;
        let embed = self.build_embed(attachments).await?;

        let request = CreateRecordRequest {
            repo: self.session.did.clone(),
            collection: POST_COLLECTION,
            record: PostRecord {
                record_type: POST_COLLECTION,
                text: text.to_string(),
                created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                facets,
                reply: wire_reply(reply)?,
                embed,
            },
        };

        debug!(
            chars = text.chars().count(),
            facets = request.record.facets.len(),
            in_reply = request.record.reply.is_some(),
            "posting to Bluesky"
        );

        let response = self
            .http
            .post(self.xrpc_url("com.atproto.repo.createRecord"))
            .bearer_auth(self.jwt())
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, "posting"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_bluesky_error(status, &body, "posting").into());
        }

        let parsed: CreateRecordResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Posting(format!("Unexpected Bluesky response: {}", e)))?;
        debug!(uri = %parsed.uri, "posted to Bluesky");

        Ok(PostRef::UriCid {
            uri: parsed.uri,
            cid: parsed.cid,
        })
    }

    fn post_url(&self, post: &PostRef) -> Option<String> {
        match post {
            PostRef::UriCid { uri, .. } => {
                let (authority, rkey) = parse_at_uri(uri)?;
                Some(format!("https://bsky.app/profile/{}/post/{}", authority, rkey))
            }
            PostRef::Generic { .. } => None,
        }
    }
}
