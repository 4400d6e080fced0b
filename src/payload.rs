//! Payload extraction for individual event frames.
//!
//! A frame either carries a `data: ` payload with a JSON object holding a
//! `response` fragment, or it is protocol noise (comments, keep-alives,
//! `event:` lines). Parsing never fails the stream: the result is tagged and
//! the caller decides what to do with each variant.

use crate::model::ChatResponseBody;

/// Prefix marking a data-bearing frame.
pub const DATA_PREFIX: &str = "data: ";

/// Outcome of extracting one frame.
#[derive(Debug)]
pub enum FramePayload {
    /// Text fragment to append. May be empty when the field is missing.
    Text(String),

    /// Not a data frame, or an end marker. Dropped silently.
    Ignored,

    /// Data frame whose payload did not parse. Dropped after reporting.
    Malformed {
        payload: String,
        error: serde_json::Error,
    },
}

/// Extract the incremental text carried by one complete frame.
///
/// # Example
/// ```
/// use chatpace::payload::{extract_payload, FramePayload};
///
/// match extract_payload(r#"data: {"response":"Hi"}"#) {
///     FramePayload::Text(text) => assert_eq!(text, "Hi"),
///     other => panic!("unexpected {:?}", other),
/// }
/// assert!(matches!(extract_payload(": keep-alive"), FramePayload::Ignored));
/// ```
pub fn extract_payload(frame: &str) -> FramePayload {
    let Some(payload) = frame.strip_prefix(DATA_PREFIX) else {
        return FramePayload::Ignored;
    };

    if is_done_marker(payload.trim()) {
        return FramePayload::Ignored;
    }

    match serde_json::from_str::<ChatResponseBody>(payload) {
        Ok(body) => FramePayload::Text(body.response),
        Err(error) => FramePayload::Malformed {
            payload: payload.to_string(),
            error,
        },
    }
}

/// Check if a data payload is the `[DONE]` end marker some servers append.
///
/// ```
/// use chatpace::payload::is_done_marker;
///
/// assert!(is_done_marker("[DONE]"));
/// assert!(!is_done_marker("{}"));
/// ```
pub fn is_done_marker(data: &str) -> bool {
    data == "[DONE]"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(frame: &str) -> String {
        match extract_payload(frame) {
            FramePayload::Text(text) => text,
            other => panic!("expected text for {:?}, got {:?}", frame, other),
        }
    }

    #[test]
    fn test_extract_text() {
        assert_eq!(text(r#"data: {"response":"Hi"}"#), "Hi");
        assert_eq!(text(r#"data: {"response":" there."}"#), " there.");
        assert_eq!(text("data: {\"response\":\"linha\\nnova\"}"), "linha\nnova");
    }

    #[test]
    fn test_missing_field_is_empty_contribution() {
        assert_eq!(text(r#"data: {"status":"thinking"}"#), "");
    }

    #[test]
    fn test_non_data_frames_ignored() {
        assert!(matches!(extract_payload(": ping"), FramePayload::Ignored));
        assert!(matches!(extract_payload("event: open"), FramePayload::Ignored));
        assert!(matches!(extract_payload(""), FramePayload::Ignored));
        assert!(matches!(extract_payload("data:{}"), FramePayload::Ignored));
    }

    #[test]
    fn test_done_marker_ignored() {
        assert!(matches!(extract_payload("data: [DONE]"), FramePayload::Ignored));
    }

    #[test]
    fn test_malformed_payload() {
        match extract_payload("data: {\"response\": ") {
            FramePayload::Malformed { payload, .. } => assert_eq!(payload, "{\"response\": "),
            other => panic!("expected malformed, got {:?}", other),
        }
        assert!(matches!(
            extract_payload(r#"data: {"response": 42}"#),
            FramePayload::Malformed { .. }
        ));
    }
}
