//! Core types for Crosscast

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PlatformError;

/// The platforms a message can be dispatched to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Twitter,
    LinkedIn,
    Bluesky,
}

impl PlatformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::LinkedIn => "linkedin",
            Self::Bluesky => "bluesky",
        }
    }
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlatformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twitter" => Ok(Self::Twitter),
            "linkedin" => Ok(Self::LinkedIn),
            "bluesky" => Ok(Self::Bluesky),
            _ => Err(format!(
                "Unknown platform: '{}'. Valid options: twitter, linkedin, bluesky",
                s
            )),
        }
    }
}

/// One author-facing message, possibly longer than any platform limit.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub attachments: Vec<ImageAttachment>,
    pub created_at: i64,
}

impl Message {
    pub fn new(text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            attachments: Vec::new(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_attachments(text: String, attachments: Vec<ImageAttachment>) -> Self {
        Self {
            attachments,
            ..Self::new(text)
        }
    }
}

/// One platform-sized segment of a message, published as one post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub total: usize,
    pub text: String,
}

// ============================================================================
// Post identifiers and thread state
// ============================================================================

/// Identifier a platform hands back for a created post.
///
/// Generic-id platforms return a single opaque id; content-addressed
/// platforms return a URI plus CID, and replies must cite both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PostRef {
    Generic { id: String },
    UriCid { uri: String, cid: String },
}

impl PostRef {
    /// The primary identifier: the id itself, or the URI for
    /// content-addressed posts.
    pub fn id(&self) -> &str {
        match self {
            Self::Generic { id } => id,
            Self::UriCid { uri, .. } => uri,
        }
    }
}

/// Reply anchors for a non-first chunk: the thread's first post and the
/// immediately preceding one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRefs {
    pub root: PostRef,
    pub parent: PostRef,
}

/// Raw result for one successfully published chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkReceipt {
    pub index: usize,
    pub post: PostRef,
}

/// Aggregate outcome of publishing one message to one platform.
///
/// Chunk 0's identifiers represent "the post"; `failed_chunk` names the
/// chunk whose publish call failed, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub platform: PlatformKind,
    pub success: bool,
    pub post_id: Option<String>,
    pub post_url: Option<String>,
    pub error: Option<PlatformError>,
    pub failed_chunk: Option<usize>,
    pub published_at: Option<i64>,
}

// ============================================================================
// Person registry
// ============================================================================

/// One person the author can tag with `@{Name}`.
///
/// Managed externally; read-only inputs here. `name` is the tag key,
/// `display_name` what readers see, and the per-platform handles are
/// optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonMapping {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub twitter_handle: Option<String>,
    pub bluesky_handle: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PersonMapping {
    pub fn new(name: String, display_name: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            display_name,
            twitter_handle: None,
            bluesky_handle: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The handle slot for a platform. LinkedIn has no handle concept
    /// here; its mentions render as display names.
    pub fn handle_for(&self, kind: PlatformKind) -> Option<&str> {
        match kind {
            PlatformKind::Twitter => self.twitter_handle.as_deref(),
            PlatformKind::Bluesky => self.bluesky_handle.as_deref(),
            PlatformKind::LinkedIn => None,
        }
    }
}

/// Read-only roster of taggable people.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonDirectory {
    people: Vec<PersonMapping>,
}

impl PersonDirectory {
    pub fn new(people: Vec<PersonMapping>) -> Self {
        Self { people }
    }

    /// Case-insensitive lookup, canonical name first, then display name.
    pub fn lookup(&self, key: &str) -> Option<&PersonMapping> {
        self.people
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(key))
            .or_else(|| {
                self.people
                    .iter()
                    .find(|p| p.display_name.eq_ignore_ascii_case(key))
            })
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }
}

// ============================================================================
// Attachment Types
// ============================================================================

/// Supported image MIME types for attachments
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageMimeType {
    /// Parse MIME type from a MIME string (e.g., "image/jpeg")
    pub fn from_mime_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detect MIME type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Get the MIME type string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }

    /// Get the typical file extension for this MIME type
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }
}

impl std::fmt::Display for ImageMimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved image attachment, bytes already in memory.
///
/// Selection and loading happen in the host; the pipeline only forwards
/// these to the chunk-0 publish call.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub bytes: Vec<u8>,
    pub mime_type: ImageMimeType,
    pub alt_text: Option<String>,
}

impl ImageAttachment {
    pub fn new(bytes: Vec<u8>, mime_type: ImageMimeType) -> Self {
        Self {
            bytes,
            mime_type,
            alt_text: None,
        }
    }

    pub fn with_alt_text(bytes: Vec<u8>, mime_type: ImageMimeType, alt_text: String) -> Self {
        Self {
            bytes,
            mime_type,
            alt_text: Some(alt_text),
        }
    }
}
