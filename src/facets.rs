//! Rich-text facet extraction
//!
//! Scans chunk text for mentions, links, and hashtags and produces facets
//! with byte-accurate UTF-8 ranges, the shape Bluesky's richtext schema
//! expects. Handle mentions are resolved to DIDs through a [`HandleResolver`];
//! a handle that fails to resolve is logged and skipped rather than failing
//! the whole post.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[A-Za-z0-9._-]+").expect("valid mention pattern"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("valid link pattern"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("valid hashtag pattern"));

/// Punctuation that ends a sentence rather than a handle or URL.
const TRAILING_MENTION_PUNCT: &[char] = &['.', ',', '!', '?', ';', ':'];
const TRAILING_LINK_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"'];

// ============================================================================
// Wire types
// ============================================================================

/// Half-open byte range into the chunk's UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteRange {
    pub byte_start: usize,
    pub byte_end: usize,
}

/// A single annotated span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub index: ByteRange,
    pub features: Vec<FacetFeature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention { did: String },
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: String },
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag { tag: String },
}

impl Facet {
    pub fn mention(byte_start: usize, byte_end: usize, did: String) -> Self {
        Facet {
            index: ByteRange {
                byte_start,
                byte_end,
            },
            features: vec![FacetFeature::Mention { did }],
        }
    }

    pub fn link(byte_start: usize, byte_end: usize, uri: String) -> Self {
        Facet {
            index: ByteRange {
                byte_start,
                byte_end,
            },
            features: vec![FacetFeature::Link { uri }],
        }
    }

    pub fn tag(byte_start: usize, byte_end: usize, tag: String) -> Self {
        Facet {
            index: ByteRange {
                byte_start,
                byte_end,
            },
            features: vec![FacetFeature::Tag { tag }],
        }
    }
}

// ============================================================================
// Handle resolution
// ============================================================================

/// Resolves a dotted handle like `alice.bsky.social` to its DID.
#[async_trait]
pub trait HandleResolver: Send + Sync {
    async fn resolve_handle(&self, handle: &str) -> Result<String>;
}

// ============================================================================
// Extraction
// ============================================================================

/// Extract mention, link, and hashtag facets from `text`.
///
/// Byte ranges index into `text` exactly as sent to the server. Spans are
/// appended in category order without deduplication; a span annotated as
/// both link and hashtag yields both facets.
pub async fn extract_facets(text: &str, resolver: &dyn HandleResolver) -> Vec<Facet> {
    let mut facets = Vec::new();

    for m in MENTION_RE.find_iter(text) {
        // Reject infixes like the domain half of an email address.
        if !at_token_start(text, m.start()) {
            continue;
        }

        let trimmed = m.as_str().trim_end_matches(TRAILING_MENTION_PUNCT);
        let handle = &trimmed[1..];
        if handle.is_empty() {
            continue;
        }

        // Only dotted handles are real: bare names cannot resolve.
        if !handle.contains('.') {
            debug!(handle = %handle, "skipping bare mention");
            continue;
        }

        let byte_end = m.start() + trimmed.len();
        match resolver.resolve_handle(handle).await {
            Ok(did) => facets.push(Facet::mention(m.start(), byte_end, did)),
            Err(e) => {
                warn!(handle = %handle, error = %e, "failed to resolve handle, posting without mention facet");
            }
        }
    }

    for m in LINK_RE.find_iter(text) {
        let trimmed = m.as_str().trim_end_matches(TRAILING_LINK_PUNCT);
        if trimmed.is_empty() {
            continue;
        }
        let byte_end = m.start() + trimmed.len();
        facets.push(Facet::link(m.start(), byte_end, trimmed.to_string()));
    }

    for m in TAG_RE.find_iter(text) {
        // A tag followed by a dot is a fragment of something else, e.g. a URL.
        if text[m.end()..].starts_with('.') {
            continue;
        }
        let tag = m.as_str()[1..].to_string();
        facets.push(Facet::tag(m.start(), m.end(), tag));
    }

    facets
}

/// True when the byte at `start` begins a token: start of text or preceded
/// by whitespace.
fn at_token_start(text: &str, start: usize) -> bool {
    match text[..start].chars().next_back() {
        None => true,
        Some(c) => c.is_whitespace(),
    }
}
