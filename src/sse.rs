//! Server-Sent Events (SSE) frame splitting and stream processing.
//!
//! The chat endpoint streams frames separated by a blank line:
//! ```text
//! data: {"response": "Hi"}
//!
//! data: {"response": " there."}
//!
//! ```
//!
//! Raw chunks go through three stages: [`Utf8ChunkDecoder`] turns bytes into
//! text, [`FrameSplitter`] cuts the text into complete frames, and
//! [`extract_payload`] pulls the `response` fragment out of each frame.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::{debug, warn};

use crate::client::ClientError;
use crate::decode::Utf8ChunkDecoder;
use crate::payload::{extract_payload, FramePayload};

/// Blank line between two frames.
pub const FRAME_SEPARATOR: &str = "\n\n";

/// Reassembles decoded text into complete frames.
///
/// After every [`push`](FrameSplitter::push) the buffer holds at most one
/// incomplete trailing frame.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buffer: String,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decoded fragment and return every frame completed by it, in
    /// order. Frames are returned without their separator.
    ///
    /// # Example
    /// ```
    /// use chatpace::sse::FrameSplitter;
    ///
    /// let mut splitter = FrameSplitter::new();
    /// assert!(splitter.push("data: {\"response\"").is_empty());
    /// assert_eq!(
    ///     splitter.push(":\"Hi\"}\n\ndata: "),
    ///     vec!["data: {\"response\":\"Hi\"}".to_string()]
    /// );
    /// assert_eq!(splitter.remainder(), "data: ");
    /// ```
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        self.buffer.push_str(fragment);
        if self.buffer.contains('\r') {
            // A lone trailing '\r' stays put until its '\n' arrives.
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find(FRAME_SEPARATOR) {
            frames.push(self.buffer[..pos].to_string());
            self.buffer.drain(..pos + FRAME_SEPARATOR.len());
        }
        frames
    }

    /// Text received after the last complete frame.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    /// Consume the splitter, returning the unterminated trailing text if any.
    pub fn finish(self) -> Option<String> {
        Some(self.buffer).filter(|rest| !rest.trim().is_empty())
    }
}

/// Extension trait turning a raw body stream into a stream of text fragments.
///
/// Malformed frames are logged and skipped; only transport errors from the
/// underlying byte stream are yielded as `Err`, after which the stream ends.
///
/// # Example
/// ```ignore
/// use chatpace::sse::SseFragmentExt;
///
/// let mut fragments = response.bytes_stream().sse_fragments();
/// while let Some(fragment) = fragments.next().await {
///     print!("{}", fragment?);
/// }
/// ```
pub trait SseFragmentExt {
    fn sse_fragments(self) -> impl Stream<Item = Result<String, ClientError>> + Send;
}

impl<S, E> SseFragmentExt for S
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ClientError> + Send,
{
    fn sse_fragments(self) -> impl Stream<Item = Result<String, ClientError>> + Send {
        text_fragments(self)
    }
}

struct FragmentState<S> {
    bytes: Pin<Box<S>>,
    decoder: Utf8ChunkDecoder,
    splitter: FrameSplitter,
    ready: VecDeque<String>,
    ended: bool,
}

impl<S> FragmentState<S> {
    fn accept(&mut self, text: &str) {
        for frame in self.splitter.push(text) {
            match extract_payload(&frame) {
                FramePayload::Text(fragment) => {
                    if !fragment.is_empty() {
                        self.ready.push_back(fragment);
                    }
                }
                FramePayload::Ignored => {
                    debug!(frame = %frame, "Skipping non-data frame");
                }
                FramePayload::Malformed { payload, error } => {
                    warn!(payload = %payload, error = %error, "Dropping malformed stream frame");
                }
            }
        }
    }

    fn close(&mut self) {
        let tail = self.decoder.finish();
        self.accept(&tail);
        let splitter = std::mem::take(&mut self.splitter);
        if let Some(rest) = splitter.finish() {
            debug!(rest = %rest, "Discarding unterminated trailing frame");
        }
        self.ended = true;
    }
}

/// Decode, split and extract a raw body stream into response fragments.
///
/// Empty fragments are not yielded.
pub fn text_fragments<S, E>(byte_stream: S) -> impl Stream<Item = Result<String, ClientError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ClientError> + Send,
{
    let state = FragmentState {
        bytes: Box::pin(byte_stream),
        decoder: Utf8ChunkDecoder::new(),
        splitter: FrameSplitter::new(),
        ready: VecDeque::new(),
        ended: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.ready.pop_front() {
                return Some((Ok(fragment), state));
            }

            if state.ended {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let text = state.decoder.decode(&chunk, true);
                    state.accept(&text);
                }
                Some(Err(e)) => {
                    // Transport failure: surface it and stop reading.
                    state.ended = true;
                    return Some((Err(e.into()), state));
                }
                None => state.close(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    const STREAM: &str = "data: {\"response\":\"Olá\"}\n\n: keep-alive\n\ndata: {\"response\":\", tudo \"}\n\ndata: {\"response\":\"bem? 😢\"}\n\n";

    fn frames_in_one_piece(text: &str) -> Vec<String> {
        FrameSplitter::new().push(text)
    }

    fn chunks(parts: &[&[u8]]) -> Vec<Result<Bytes, ClientError>> {
        parts.iter().map(|p| Ok(Bytes::copy_from_slice(p))).collect()
    }

    async fn collect(parts: Vec<Result<Bytes, ClientError>>) -> Result<Vec<String>, ClientError> {
        stream::iter(parts).sse_fragments().try_collect().await
    }

    #[test]
    fn test_splitter_keeps_incomplete_frame() {
        let mut splitter = FrameSplitter::new();
        assert!(splitter.push("data: {\"resp").is_empty());
        assert_eq!(splitter.remainder(), "data: {\"resp");
        let frames = splitter.push("onse\":\"x\"}\n");
        assert!(frames.is_empty());
        let frames = splitter.push("\ndata: next");
        assert_eq!(frames, vec!["data: {\"response\":\"x\"}"]);
        assert_eq!(splitter.remainder(), "data: next");
        assert_eq!(splitter.finish().as_deref(), Some("data: next"));
    }

    #[test]
    fn test_splitter_multiple_frames_in_one_push() {
        let frames = frames_in_one_piece("a\n\nb\n\n\n\nc");
        assert_eq!(frames, vec!["a", "b", ""]);
    }

    #[test]
    fn test_splitter_normalizes_crlf() {
        let mut splitter = FrameSplitter::new();
        assert!(splitter.push("data: a\r\n\r").is_empty());
        assert_eq!(splitter.push("\ndata: b\r\n\r\n"), vec!["data: a", "data: b"]);
        assert!(splitter.finish().is_none());
    }

    #[test]
    fn test_splitter_chunk_boundary_invariance() {
        let text = STREAM;
        let expected = frames_in_one_piece(text);
        assert_eq!(expected.len(), 4);

        // Every pair of cut points, on char boundaries, must give the same frames.
        let cuts: Vec<usize> = (0..=text.len()).filter(|i| text.is_char_boundary(*i)).collect();
        for &a in &cuts {
            for &b in cuts.iter().filter(|b| **b >= a) {
                let mut splitter = FrameSplitter::new();
                let mut frames = splitter.push(&text[..a]);
                frames.extend(splitter.push(&text[a..b]));
                frames.extend(splitter.push(&text[b..]));
                assert_eq!(frames, expected, "cuts at {} and {}", a, b);
            }
        }
    }

    #[tokio::test]
    async fn test_fragments_single_chunk() {
        let fragments = collect(chunks(&[STREAM.as_bytes()])).await.unwrap();
        assert_eq!(fragments, vec!["Olá", ", tudo ", "bem? 😢"]);
    }

    #[tokio::test]
    async fn test_fragments_byte_boundary_invariance() {
        let bytes = STREAM.as_bytes();
        let expected = collect(chunks(&[bytes])).await.unwrap();

        for split in 0..=bytes.len() {
            let parts = chunks(&[&bytes[..split], &bytes[split..]]);
            let fragments = collect(parts).await.unwrap();
            assert_eq!(fragments, expected, "split at byte {}", split);
        }

        let one_by_one: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(collect(chunks(&one_by_one)).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_fragments_skip_malformed_frame() {
        let body = "data: {\"response\": oops}\n\ndata: {\"response\":\"still here\"}\n\n";
        let fragments = collect(chunks(&[body.as_bytes()])).await.unwrap();
        assert_eq!(fragments, vec!["still here"]);
    }

    #[tokio::test]
    async fn test_fragments_drop_unterminated_tail() {
        let body = "data: {\"response\":\"Hi\"}\n\ndata: {\"response\":\"lost\"}";
        let fragments = collect(chunks(&[body.as_bytes()])).await.unwrap();
        assert_eq!(fragments, vec!["Hi"]);
    }

    #[tokio::test]
    async fn test_fragments_transport_error_ends_stream() {
        let parts = vec![
            Ok(Bytes::from_static(b"data: {\"response\":\"Hi\"}\n\n")),
            Err(ClientError::Io(std::io::Error::other("connection reset"))),
            Ok(Bytes::from_static(b"data: {\"response\":\"never\"}\n\n")),
        ];
        let items: Vec<_> = stream::iter(parts).sse_fragments().collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "Hi");
        assert!(matches!(items[1], Err(ClientError::Io(_))));
    }
}
