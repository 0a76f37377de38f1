//! Unified person-tag resolution
//!
//! Authors tag people as `@{Name}`; each platform needs different mention
//! text. Twitter and Bluesky render `@handle` when the person has a handle
//! there, LinkedIn renders the display name (it has no resolvable handle
//! concept here).

use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::types::{PersonDirectory, PersonMapping, PlatformKind};

/// Replace every `@{Name}` span with the platform's mention text.
///
/// Absence of tag syntax is a no-op. Malformed spans (empty or unclosed
/// braces) do not match and pass through verbatim.
pub fn resolve_person_tags(
    text: &str,
    directory: &PersonDirectory,
    platform: PlatformKind,
) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"@\{([^{}]+)\}").expect("valid tag pattern"));

    TAG_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let key = caps[1].trim();
            render_mention(key, directory.lookup(key), platform)
        })
        .into_owned()
}

fn render_mention(key: &str, mapping: Option<&PersonMapping>, platform: PlatformKind) -> String {
    match mapping {
        Some(person) => {
            if platform == PlatformKind::LinkedIn {
                debug!(tag = key, platform = %platform, "rendered display-name mention");
                return format!("@{}", person.display_name);
            }
            match person.handle_for(platform) {
                Some(handle) => {
                    debug!(tag = key, platform = %platform, handle, "resolved mention");
                    format!("@{}", handle)
                }
                None => {
                    // No handle on this platform: a bare display name cannot
                    // be a clickable identity, so drop the @.
                    debug!(tag = key, platform = %platform, "no handle, using bare display name");
                    person.display_name.clone()
                }
            }
        }
        None => {
            warn!(tag = key, platform = %platform, "unknown person tag");
            if platform == PlatformKind::LinkedIn {
                format!("@{}", key)
            } else {
                key.to_string()
            }
        }
    }
}
