//! Limit-respecting text chunking
//!
//! Splits formatted text into ordered chunks of at most `limit` characters
//! (Unicode scalar values). Break points are chosen by scanning backward
//! from the limit in priority order: sentence end, paragraph break, line
//! break, space, hard cut. Boundary whitespace is trimmed, so concatenating
//! chunk texts reconstructs the input modulo the trimmed whitespace.

use crate::types::Chunk;

const SENTENCE_MIN_RATIO: f64 = 0.6;
const PARAGRAPH_MIN_RATIO: f64 = 0.4;
const NEWLINE_MIN_RATIO: f64 = 0.6;
const SPACE_MIN_RATIO: f64 = 0.7;
const TRUNCATE_SPACE_RATIO: f64 = 0.8;
const TRUNCATION_MARKER: char = '…';

/// Split `text` into ordered chunks of at most `limit` characters.
///
/// Text within the limit comes back as a single untouched chunk. Every
/// loop iteration consumes at least one character, so pathological input
/// cannot spin forever.
pub fn chunk_text(text: &str, limit: usize) -> Vec<Chunk> {
    debug_assert!(limit > 0, "platform character limit must be positive");

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= limit {
        return vec![Chunk {
            index: 0,
            total: 1,
            text: text.to_string(),
        }];
    }

    let mut pieces: Vec<String> = Vec::new();
    let mut rest: &[char] = &chars;

    while !rest.is_empty() {
        if rest.len() <= limit {
            let piece: String = rest.iter().collect();
            let piece = piece.trim_end().to_string();
            if !piece.is_empty() {
                pieces.push(piece);
            }
            break;
        }

        let split = find_break_point(rest, limit);
        let piece: String = rest[..split].iter().collect();
        let piece = piece.trim_end().to_string();
        if !piece.is_empty() {
            pieces.push(truncate_to_limit(&piece, limit));
        }

        rest = &rest[split..];
        while let Some(c) = rest.first() {
            if c.is_whitespace() {
                rest = &rest[1..];
            } else {
                break;
            }
        }
    }

    // All-whitespace input trims away entirely; keep the list non-empty.
    if pieces.is_empty() {
        return vec![Chunk {
            index: 0,
            total: 1,
            text: text.trim().to_string(),
        }];
    }

    let total = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk { index, total, text })
        .collect()
}

/// Number of characters the current chunk should take from `rest`.
/// Caller guarantees `rest.len() > limit`.
fn find_break_point(rest: &[char], limit: usize) -> usize {
    let meets = |pos: usize, ratio: f64| pos as f64 >= limit as f64 * ratio;

    // Sentence end: break after the punctuation, keeping it in the chunk.
    for i in (1..limit).rev() {
        if matches!(rest[i], '.' | '?' | '!') && rest[i + 1] == ' ' {
            if meets(i + 1, SENTENCE_MIN_RATIO) {
                return i + 1;
            }
            break;
        }
    }

    // Paragraph break: end the chunk before the blank line.
    for i in (1..limit).rev() {
        if rest[i] == '\n' && rest[i + 1] == '\n' {
            if meets(i, PARAGRAPH_MIN_RATIO) {
                return i;
            }
            break;
        }
    }

    // Line break.
    for i in (1..limit).rev() {
        if rest[i] == '\n' {
            if meets(i, NEWLINE_MIN_RATIO) {
                return i;
            }
            break;
        }
    }

    // Space.
    for i in (1..limit).rev() {
        if rest[i] == ' ' {
            if meets(i, SPACE_MIN_RATIO) {
                return i;
            }
            break;
        }
    }

    // No usable break point: hard cut at the limit.
    limit
}

/// Safety net for a chunk that still exceeds the limit: cut and append a
/// truncation marker, preferring a space cut past 80% of the limit so whole
/// words survive. The result never exceeds `limit` characters.
pub fn truncate_to_limit(text: &str, limit: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= limit {
        return text.to_string();
    }

    // The marker occupies one of the limit's slots.
    let keep = limit.saturating_sub(1);
    let window = &chars[..keep];
    let min_space = (limit as f64 * TRUNCATE_SPACE_RATIO) as usize;
    let cut = window
        .iter()
        .rposition(|&c| c == ' ')
        .filter(|&i| i >= min_space)
        .unwrap_or(keep);

    let kept: String = chars[..cut].iter().collect();
    format!("{}{}", kept.trim_end(), TRUNCATION_MARKER)
}
