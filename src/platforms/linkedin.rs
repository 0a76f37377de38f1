//! LinkedIn platform implementation
//!
//! Roots a thread as a UGC post and publishes every following chunk as a
//! comment on that root, since LinkedIn has no native reply-chain. Images
//! go through the two-step asset flow: register an upload, then PUT the
//! bytes to the returned URL.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::{ImageAttachment, PlatformKind, PostRef, ReplyRefs};

const DEFAULT_API_BASE: &str = "https://api.linkedin.com";
const CHARACTER_LIMIT: usize = 3000;
const INTER_CHUNK_DELAY: Duration = Duration::from_secs(2);

/// Characters escaped inside a path segment, the colon included so URNs
/// survive RestLi routing.
const PATH_SEGMENT_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'{')
    .add(b'}');

/// Map a LinkedIn API error response to a PlatformError.
fn map_linkedin_error(status: StatusCode, body: &str, context: &str) -> PlatformError {
    match status.as_u16() {
        401 | 403 => PlatformError::Authentication(format!(
            "LinkedIn authentication failed during {}: {} {}. Please check your access token and its permissions.",
            context, status, body
        )),
        400 | 422 => PlatformError::Validation(format!(
            "LinkedIn rejected the request during {}: {}. Check content format and length.",
            context, body
        )),
        429 => PlatformError::RateLimit(format!(
            "LinkedIn rate limit exceeded during {}: {}. Please wait before trying again.",
            context, body
        )),
        _ => PlatformError::Posting(format!(
            "LinkedIn operation failed during {}: {} {}",
            context, status, body
        )),
    }
}

/// Map a transport-level failure to a PlatformError.
fn transport_error(error: reqwest::Error, context: &str) -> PlatformError {
    if error.is_timeout() || error.is_connect() {
        PlatformError::Network(format!(
            "Network error while reaching LinkedIn during {}: {}. Check your internet connection.",
            context, error
        ))
    } else {
        PlatformError::Posting(format!(
            "LinkedIn request failed during {}: {}",
            context, error
        ))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct UgcPostRequest {
    author: String,
    #[serde(rename = "lifecycleState")]
    lifecycle_state: &'static str,
    #[serde(rename = "specificContent")]
    specific_content: SpecificContent,
    visibility: Visibility,
}

#[derive(Debug, Serialize)]
struct SpecificContent {
    #[serde(rename = "com.linkedin.ugc.ShareContent")]
    share_content: ShareContent,
}

#[derive(Debug, Serialize)]
struct ShareContent {
    #[serde(rename = "shareCommentary")]
    share_commentary: TextBody,
    #[serde(rename = "shareMediaCategory")]
    share_media_category: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    media: Vec<ShareMedia>,
}

#[derive(Debug, Serialize)]
struct ShareMedia {
    status: &'static str,
    media: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<TextBody>,
}

#[derive(Debug, Serialize)]
struct Visibility {
    #[serde(rename = "com.linkedin.ugc.MemberNetworkVisibility")]
    member_network_visibility: &'static str,
}

#[derive(Debug, Serialize)]
struct TextBody {
    text: String,
}

#[derive(Debug, Serialize)]
struct CommentRequest {
    actor: String,
    message: TextBody,
}

#[derive(Debug, Deserialize)]
struct CreatedEntity {
    id: String,
}

#[derive(Debug, Serialize)]
struct RegisterUploadRequest {
    #[serde(rename = "registerUploadRequest")]
    register_upload_request: RegisterUpload,
}

#[derive(Debug, Serialize)]
struct RegisterUpload {
    recipes: Vec<&'static str>,
    owner: String,
    #[serde(rename = "serviceRelationships")]
    service_relationships: Vec<ServiceRelationship>,
}

#[derive(Debug, Serialize)]
struct ServiceRelationship {
    #[serde(rename = "relationshipType")]
    relationship_type: &'static str,
    identifier: &'static str,
}

#[derive(Debug, Deserialize)]
struct RegisterUploadResponse {
    value: RegisterUploadValue,
}

#[derive(Debug, Deserialize)]
struct RegisterUploadValue {
    #[serde(rename = "uploadMechanism")]
    upload_mechanism: UploadMechanism,
    asset: String,
}

#[derive(Debug, Deserialize)]
struct UploadMechanism {
    #[serde(rename = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest")]
    media_upload: MediaUpload,
}

#[derive(Debug, Deserialize)]
struct MediaUpload {
    #[serde(rename = "uploadUrl")]
    upload_url: String,
}

fn build_ugc_request(author: &str, text: &str, media: Vec<ShareMedia>) -> UgcPostRequest {
    UgcPostRequest {
        author: author.to_string(),
        lifecycle_state: "PUBLISHED",
        specific_content: SpecificContent {
            share_content: ShareContent {
                share_commentary: TextBody {
                    text: text.to_string(),
                },
                share_media_category: if media.is_empty() { "NONE" } else { "IMAGE" },
                media,
            },
        },
        visibility: Visibility {
            member_network_visibility: "PUBLIC",
        },
    }
}

/// Comments attach to the thread root. The root must be the ugcPost URN
/// this client produced; an AT-style ref means mixed-up platforms.
fn comment_target(refs: &ReplyRefs) -> Result<&str> {
    match &refs.root {
        PostRef::Generic { id } => Ok(id),
        PostRef::UriCid { .. } => {
            Err(PlatformError::Posting("Reply root is not an ugcPost urn".to_string()).into())
        }
    }
}

fn encode_urn(urn: &str) -> String {
    utf8_percent_encode(urn, PATH_SEGMENT_SET).to_string()
}

// ============================================================================
// Client
// ============================================================================

/// OAuth access token plus the member URN posts are authored as.
#[derive(Debug)]
pub struct LinkedInCredential {
    pub access_token: SecretString,
    pub author_urn: String,
}

#[derive(Debug)]
pub struct LinkedInClient {
    http: reqwest::Client,
    credential: LinkedInCredential,
    api_base: String,
}

impl LinkedInClient {
    pub fn new(credential: LinkedInCredential, api_base: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credential,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }

    fn token(&self) -> &str {
        self.credential.access_token.expose_secret()
    }

    /// Register an image upload, PUT the bytes, return the asset URN.
    async fn upload_image(&self, attachment: &ImageAttachment) -> Result<String> {
        debug!(
            bytes = attachment.bytes.len(),
            mime = %attachment.mime_type,
            "registering LinkedIn image upload"
        );

        let request = RegisterUploadRequest {
            register_upload_request: RegisterUpload {
                recipes: vec!["urn:li:digitalmediaRecipe:feedshare-image"],
                owner: self.credential.author_urn.clone(),
                service_relationships: vec![ServiceRelationship {
                    relationship_type: "OWNER",
                    identifier: "urn:li:userGeneratedContent",
                }],
            },
        };
        let response = self
            .http
            .post(format!("{}/v2/assets?action=registerUpload", self.api_base))
            .bearer_auth(self.token())
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, "upload registration"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_linkedin_error(status, &body, "upload registration").into());
        }
        let registered: RegisterUploadResponse = response.json().await.map_err(|e| {
            PlatformError::Posting(format!("Unexpected LinkedIn registerUpload response: {}", e))
        })?;

        let upload = self
            .http
            .put(&registered.value.upload_mechanism.media_upload.upload_url)
            .bearer_auth(self.token())
            .header(reqwest::header::CONTENT_TYPE, attachment.mime_type.as_str())
            .body(attachment.bytes.clone())
            .send()
            .await
            .map_err(|e| transport_error(e, "image upload"))?;

        let status = upload.status();
        if !status.is_success() {
            let body = upload.text().await.unwrap_or_default();
            return Err(map_linkedin_error(status, &body, "image upload").into());
        }

        Ok(registered.value.asset)
    }

    async fn publish_root(&self, text: &str, attachments: &[ImageAttachment]) -> Result<PostRef> {
        let mut media = Vec::new();
        for attachment in attachments {
            let asset = self.upload_image(attachment).await?;
            media.push(ShareMedia {
                status: "READY",
                media: asset,
                description: attachment.alt_text.clone().map(|text| TextBody { text }),
            });
        }

        let request = build_ugc_request(&self.credential.author_urn, text, media);
        debug!(chars = text.chars().count(), "posting to LinkedIn");

        let response = self
            .http
            .post(format!("{}/v2/ugcPosts", self.api_base))
            .bearer_auth(self.token())
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, "posting"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_linkedin_error(status, &body, "posting").into());
        }

        let created: CreatedEntity = response
            .json()
            .await
            .map_err(|e| PlatformError::Posting(format!("Unexpected LinkedIn response: {}", e)))?;
        debug!(urn = %created.id, "posted to LinkedIn");

        Ok(PostRef::Generic { id: created.id })
    }

    async fn publish_comment(&self, text: &str, root_urn: &str) -> Result<PostRef> {
        let request = CommentRequest {
            actor: self.credential.author_urn.clone(),
            message: TextBody {
                text: text.to_string(),
            },
        };
        debug!(root = %root_urn, chars = text.chars().count(), "commenting on LinkedIn thread root");

        let response = self
            .http
            .post(format!(
                "{}/v2/socialActions/{}/comments",
                self.api_base,
                encode_urn(root_urn)
            ))
            .bearer_auth(self.token())
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, "commenting"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_linkedin_error(status, &body, "commenting").into());
        }

        let created: CreatedEntity = response.json().await.map_err(|e| {
            PlatformError::Posting(format!("Unexpected LinkedIn comment response: {}", e))
        })?;
        Ok(PostRef::Generic { id: created.id })
    }
}

#[async_trait]
impl Platform for LinkedInClient {
    fn kind(&self) -> PlatformKind {
        PlatformKind::LinkedIn
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
                "Content exceeds LinkedIn's {} character limit (current: {} characters)",
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
        match reply {
            None => self.publish_root(text, attachments).await,
            Some(refs) => {
                if !attachments.is_empty() {
                    debug!("comments cannot carry images, ignoring attachments");
                }
                self.publish_comment(text, comment_target(refs)?).await
            }
        }
    }

    fn post_url(&self, post: &PostRef) -> Option<String> {
        match post {
            PostRef::Generic { id } => {
                Some(format!("https://www.linkedin.com/feed/update/{}", id))
            }
            PostRef::UriCid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LinkedInClient {
        LinkedInClient::new(
            LinkedInCredential {
                access_token: SecretString::from("test-token"),
                author_urn: "urn:li:person:abc".to_string(),
            },
            None,
        )
    }

    #[test]
    fn test_kind_and_limits() {
        let client = client();
        assert_eq!(client.kind(), PlatformKind::LinkedIn);
        assert_eq!(client.character_limit(), 3000);
        assert!(!client.rate_limit_sensitive());
        assert_eq!(client.inter_chunk_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_validate_content_empty() {
        let result = client().validate_content("");
        match result {
            Err(crate::CrosscastError::Platform(PlatformError::Validation(msg))) => {
                assert_eq!(msg, "Content cannot be empty");
            }
            _ => panic!("Expected validation error"),
        }
    }

    #[test]
    fn test_validate_content_too_long() {
        let long_content = "a".repeat(3001);
        let result = client().validate_content(&long_content);
        match result {
            Err(crate::CrosscastError::Platform(PlatformError::Validation(msg))) => {
                assert!(msg.contains("3000 character limit"));
                assert!(msg.contains("3001 characters"));
            }
            _ => panic!("Expected validation error"),
        }
    }

    #[test]
    fn test_validate_content_at_limit() {
        let content = "a".repeat(3000);
        assert!(client().validate_content(&content).is_ok());
    }

    #[test]
    fn test_encode_urn_escapes_colons() {
        assert_eq!(
            encode_urn("urn:li:ugcPost:6871234"),
            "urn%3Ali%3AugcPost%3A6871234"
        );
    }

    #[test]
    fn test_post_url_from_urn() {
        let post = PostRef::Generic {
            id: "urn:li:ugcPost:6871234".to_string(),
        };
        assert_eq!(
            client().post_url(&post),
            Some("https://www.linkedin.com/feed/update/urn:li:ugcPost:6871234".to_string())
        );
    }

    #[test]
    fn test_post_url_rejects_foreign_ref() {
        let post = PostRef::UriCid {
            uri: "at://did:plc:abc/app.bsky.feed.post/xyz".to_string(),
            cid: "bafy".to_string(),
        };
        assert_eq!(client().post_url(&post), None);
    }

    #[test]
    fn test_comment_target_takes_thread_root() {
        let refs = ReplyRefs {
            root: PostRef::Generic {
                id: "urn:li:ugcPost:1".to_string(),
            },
            parent: PostRef::Generic {
                id: "urn:li:comment:9".to_string(),
            },
        };
        assert_eq!(comment_target(&refs).unwrap(), "urn:li:ugcPost:1");
    }

    #[test]
    fn test_comment_target_rejects_foreign_ref() {
        let refs = ReplyRefs {
            root: PostRef::UriCid {
                uri: "at://x".to_string(),
                cid: "c".to_string(),
            },
            parent: PostRef::Generic {
                id: "urn:li:comment:9".to_string(),
            },
        };
        assert!(comment_target(&refs).is_err());
    }

    #[test]
    fn test_ugc_request_wire_format() {
        let request = build_ugc_request("urn:li:person:abc", "hello network", Vec::new());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["author"], "urn:li:person:abc");
        assert_eq!(json["lifecycleState"], "PUBLISHED");
        assert_eq!(
            json["specificContent"]["com.linkedin.ugc.ShareContent"]["shareCommentary"]["text"],
            "hello network"
        );
        assert_eq!(
            json["specificContent"]["com.linkedin.ugc.ShareContent"]["shareMediaCategory"],
            "NONE"
        );
        assert!(json["specificContent"]["com.linkedin.ugc.ShareContent"]
            .get("media")
            .is_none());
        assert_eq!(
            json["visibility"]["com.linkedin.ugc.MemberNetworkVisibility"],
            "PUBLIC"
        );
    }

    #[test]
    fn test_ugc_request_with_media() {
        let media = vec![ShareMedia {
            status: "READY",
            media: "urn:li:digitalmediaAsset:xyz".to_string(),
            description: Some(TextBody {
                text: "a chart".to_string(),
            }),
        }];
        let request = build_ugc_request("urn:li:person:abc", "with image", media);
        let json = serde_json::to_value(&request).unwrap();

        let share = &json["specificContent"]["com.linkedin.ugc.ShareContent"];
        assert_eq!(share["shareMediaCategory"], "IMAGE");
        assert_eq!(share["media"][0]["status"], "READY");
        assert_eq!(share["media"][0]["media"], "urn:li:digitalmediaAsset:xyz");
        assert_eq!(share["media"][0]["description"]["text"], "a chart");
    }

    #[test]
    fn test_comment_request_wire_format() {
        let request = CommentRequest {
            actor: "urn:li:person:abc".to_string(),
            message: TextBody {
                text: "part two".to_string(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["actor"], "urn:li:person:abc");
        assert_eq!(json["message"]["text"], "part two");
    }

    #[test]
    fn test_register_upload_wire_format() {
        let request = RegisterUploadRequest {
            register_upload_request: RegisterUpload {
                recipes: vec!["urn:li:digitalmediaRecipe:feedshare-image"],
                owner: "urn:li:person:abc".to_string(),
                service_relationships: vec![ServiceRelationship {
                    relationship_type: "OWNER",
                    identifier: "urn:li:userGeneratedContent",
                }],
            },
        };
        let json = serde_json::to_value(&request).unwrap();

        let inner = &json["registerUploadRequest"];
        assert_eq!(
            inner["recipes"][0],
            "urn:li:digitalmediaRecipe:feedshare-image"
        );
        assert_eq!(inner["owner"], "urn:li:person:abc");
        assert_eq!(
            inner["serviceRelationships"][0]["relationshipType"],
            "OWNER"
        );
    }

    #[test]
    fn test_register_upload_response_parsing() {
        let body = serde_json::json!({
            "value": {
                "uploadMechanism": {
                    "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest": {
                        "uploadUrl": "https://api.linkedin.com/mediaUpload/abc",
                        "headers": {}
                    }
                },
                "asset": "urn:li:digitalmediaAsset:abc",
                "mediaArtifact": "urn:li:digitalmediaMediaArtifact:(urn:li:digitalmediaAsset:abc,x)"
            }
        });
        let parsed: RegisterUploadResponse = serde_json::from_value(body).unwrap();

        assert_eq!(parsed.value.asset, "urn:li:digitalmediaAsset:abc");
        assert_eq!(
            parsed.value.upload_mechanism.media_upload.upload_url,
            "https://api.linkedin.com/mediaUpload/abc"
        );
    }

    // Error mapping tests

    #[test]
    fn test_error_mapping_authentication_401() {
        let result = map_linkedin_error(StatusCode::UNAUTHORIZED, "Invalid token", "posting");
        match result {
            PlatformError::Authentication(msg) => {
                assert!(msg.contains("authentication failed"));
                assert!(msg.contains("access token"));
            }
            _ => panic!("Expected Authentication error"),
        }
    }

    #[test]
    fn test_error_mapping_validation_422() {
        let result =
            map_linkedin_error(StatusCode::UNPROCESSABLE_ENTITY, "Length exceeded", "posting");
        assert!(matches!(result, PlatformError::Validation(_)));
    }

    #[test]
    fn test_error_mapping_rate_limit_429() {
        let result = map_linkedin_error(StatusCode::TOO_MANY_REQUESTS, "Throttled", "commenting");
        match result {
            PlatformError::RateLimit(msg) => {
                assert!(msg.contains("rate limit exceeded"));
                assert!(msg.contains("commenting"));
            }
            _ => panic!("Expected RateLimit error"),
        }
    }

    #[test]
    fn test_error_mapping_server_error_is_posting() {
        let result = map_linkedin_error(StatusCode::BAD_GATEWAY, "upstream", "posting");
        assert!(matches!(result, PlatformError::Posting(_)));
    }
}
