//! Sentence segmentation of a finalized response.
//!
//! A heuristic, not linguistics: every period ends a unit, and whitespace
//! directly after it is consumed. Units are trimmed and empty ones dropped.

use std::fmt;
use std::ops::Range;

use crate::accumulate::FinalizedResponse;

/// Character that terminates a display unit.
pub const TERMINATOR: char = '.';

/// One sentence-like piece of a response, shown as its own message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayUnit {
    text: String,
    span: Range<usize>,
}

impl DisplayUnit {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Byte range of the unit inside the segmented response.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

impl fmt::Display for DisplayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq<&str> for DisplayUnit {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

/// Split a finalized response into display units.
///
/// ```
/// use chatpace::accumulate::FinalizedResponse;
/// use chatpace::segment::segment;
///
/// let response = FinalizedResponse::from("Hello world. How are you.".to_string());
/// let units = segment(&response);
/// assert_eq!(units, vec!["Hello world.", "How are you."]);
/// ```
pub fn segment(response: &FinalizedResponse) -> Vec<DisplayUnit> {
    segment_str(response.as_str())
}

/// Same as [`segment`], on any string.
pub fn segment_str(text: &str) -> Vec<DisplayUnit> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != TERMINATOR {
            continue;
        }

        let end = i + c.len_utf8();
        push_unit(text, start..end, &mut units);

        start = end;
        while let Some(&(j, w)) = chars.peek() {
            if !w.is_whitespace() {
                break;
            }
            start = j + w.len_utf8();
            chars.next();
        }
    }

    push_unit(text, start..text.len(), &mut units);
    units
}

fn push_unit(text: &str, candidate: Range<usize>, units: &mut Vec<DisplayUnit>) {
    let slice = &text[candidate.clone()];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }

    let offset = candidate.start + (slice.len() - slice.trim_start().len());
    units.push(DisplayUnit {
        text: trimmed.to_string(),
        span: offset..offset + trimmed.len(),
    });
}
