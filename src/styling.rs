//! Styling-marker conversion to Unicode glyphs
//!
//! `**bold**` and `_italic_` spans become mathematical sans-serif
//! alphanumerics, which survive platforms that strip markup. Bold runs
//! first; before the italic pass every `@handle` token is shielded behind a
//! placeholder so a handle's internal underscores are never read as italic
//! delimiters, then restored.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid bold pattern"));
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_]+)_").expect("valid italic pattern"));
static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[A-Za-z0-9._-]+").expect("valid handle pattern"));

// Private-use sentinel framing a shield index; never appears in real text.
const SHIELD_MARK: char = '\u{E000}';

/// Convert styling markers to Unicode glyphs.
///
/// Idempotent once no markers remain: already-converted glyphs are outside
/// the ASCII/Greek source ranges and pass through untouched.
pub fn apply_styling(text: &str) -> String {
    let bolded = BOLD_RE.replace_all(text, |caps: &Captures<'_>| map_span(&caps[1], bold_char));

    // Shield resolved handles from the italic pass.
    let mut shielded: Vec<String> = Vec::new();
    let masked = HANDLE_RE.replace_all(&bolded, |caps: &Captures<'_>| {
        shielded.push(caps[0].to_string());
        format!("{}{}{}", SHIELD_MARK, shielded.len() - 1, SHIELD_MARK)
    });

    let italicized =
        ITALIC_RE.replace_all(&masked, |caps: &Captures<'_>| map_span(&caps[1], italic_char));

    let mut restored = italicized.into_owned();
    for (i, handle) in shielded.iter().enumerate() {
        let placeholder = format!("{}{}{}", SHIELD_MARK, i, SHIELD_MARK);
        restored = restored.replace(&placeholder, handle);
    }
    restored
}

fn map_span(span: &str, map: fn(char) -> char) -> String {
    span.chars().map(map).collect()
}

/// ASCII letters/digits and Greek letters to sans-serif bold.
fn bold_char(c: char) -> char {
    let mapped = match c {
        'A'..='Z' => 0x1D5D4 + (c as u32 - 'A' as u32),
        'a'..='z' => 0x1D5EE + (c as u32 - 'a' as u32),
        '0'..='9' => 0x1D7EC + (c as u32 - '0' as u32),
        'Α'..='Ω' => 0x1D756 + (c as u32 - 'Α' as u32),
        'α'..='ω' => 0x1D770 + (c as u32 - 'α' as u32),
        _ => return c,
    };
    char::from_u32(mapped).unwrap_or(c)
}

/// ASCII letters to sans-serif italic; no italic digits or sans-serif
/// italic Greek exist, so those pass through.
fn italic_char(c: char) -> char {
    let mapped = match c {
        'A'..='Z' => 0x1D608 + (c as u32 - 'A' as u32),
        'a'..='z' => 0x1D622 + (c as u32 - 'a' as u32),
        _ => return c,
    };
    char::from_u32(mapped).unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_ascii_letters() {
        assert_eq!(apply_styling("**Hello**"), "𝗛𝗲𝗹𝗹𝗼");
    }

    #[test]
    fn test_bold_digits() {
        assert_eq!(apply_styling("**42**"), "𝟰𝟮");
    }

    #[test]
    fn test_bold_greek_letters() {
        assert_eq!(apply_styling("**αΩ**"), "𝝰𝝮");
    }

    #[test]
    fn test_bold_passes_unmapped_chars_through() {
        assert_eq!(apply_styling("**a-b!**"), "𝗮-𝗯!");
    }

    #[test]
    fn test_italic_ascii_letters() {
        assert_eq!(apply_styling("_foo_"), "𝘧𝘰𝘰");
    }

    #[test]
    fn test_italic_leaves_digits() {
        assert_eq!(apply_styling("_v2_"), "𝘷2");
    }

    #[test]
    fn test_bold_and_italic_together() {
        assert_eq!(apply_styling("**Hi** _there_"), "𝗛𝗶 𝘵𝘩𝘦𝘳𝘦");
    }

    #[test]
    fn test_no_markers_is_identity() {
        let text = "plain text, no markers at all";
        assert_eq!(apply_styling(text), text);
    }

    #[test]
    fn test_unpaired_markers_are_preserved() {
        assert_eq!(apply_styling("a ** b"), "a ** b");
        assert_eq!(apply_styling("snake_case"), "snake_case");
    }

    #[test]
    fn test_idempotent_on_styled_text() {
        let once = apply_styling("**Hello** _world_ @dev_ops");
        let twice = apply_styling(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_handle_underscores_are_shielded() {
        let out = apply_styling("_foo_ @john_doe _bar_");
        assert_eq!(out, "𝘧𝘰𝘰 @john_doe 𝘣𝘢𝘳");
    }

    #[test]
    fn test_handle_between_italic_spans_keeps_every_underscore() {
        let out = apply_styling("_a_ @a_b_c _d_");
        assert_eq!(out, "𝘢 @a_b_c 𝘥");
    }

    #[test]
    fn test_dotted_handle_is_untouched() {
        let out = apply_styling("_hi_ @alice.bsky.social");
        assert_eq!(out, "𝘩𝘪 @alice.bsky.social");
    }

    #[test]
    fn test_multiple_handles_restore_in_order() {
        let out = apply_styling("@one_1 and @two_2");
        assert_eq!(out, "@one_1 and @two_2");
    }

    #[test]
    fn test_bold_inside_sentence() {
        assert_eq!(
            apply_styling("launch is **today** at noon"),
            "launch is 𝘁𝗼𝗱𝗮𝘆 at noon"
        );
    }
}
