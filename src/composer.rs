//! Per-platform message composition
//!
//! Runs the rendering pipeline in its fixed order: person tags are resolved
//! to platform handles first, Unicode styling second, chunking last. Tag
//! resolution must precede styling so that underscores inside substituted
//! handles are never mistaken for italic markers.

use tracing::debug;

use crate::chunker::chunk_text;
use crate::mentions::resolve_person_tags;
use crate::styling::apply_styling;
use crate::types::{Chunk, PersonDirectory, PlatformKind};

/// Render `text` for one platform and split it to fit `limit`.
pub fn compose(
    text: &str,
    people: &PersonDirectory,
    platform: PlatformKind,
    limit: usize,
) -> Vec<Chunk> {
    let resolved = resolve_person_tags(text, people, platform);
    let styled = apply_styling(&resolved);
    let chunks = chunk_text(&styled, limit);

    debug!(
        platform = %platform,
        chunks = chunks.len(),
        chars = styled.chars().count(),
        "composed message"
    );
    chunks
}
