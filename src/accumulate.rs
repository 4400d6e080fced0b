//! Accumulation of streamed fragments into one finalized response.

use futures::{Stream, StreamExt};
use std::fmt;

use crate::client::ClientError;

/// Growing response text. Only appends; reading happens after
/// [`finish`](ResponseAccumulator::finish).
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    text: String,
    fragments: usize,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        self.fragments += 1;
    }

    /// Number of fragments received so far.
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Freeze the accumulated text.
    pub fn finish(self) -> FinalizedResponse {
        FinalizedResponse(self.text)
    }
}

/// The complete, read-only response text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FinalizedResponse(String);

impl FinalizedResponse {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for FinalizedResponse {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for FinalizedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Drain a fragment stream until it ends and return the finalized text.
///
/// The first transport error aborts accumulation.
pub async fn collect_response<S>(fragments: S) -> Result<FinalizedResponse, ClientError>
where
    S: Stream<Item = Result<String, ClientError>>,
{
    futures::pin_mut!(fragments);

    let mut accumulator = ResponseAccumulator::new();
    while let Some(fragment) = fragments.next().await {
        accumulator.push(&fragment?);
    }

    tracing::debug!(fragments = accumulator.fragments(), "Response stream finished");
    Ok(accumulator.finish())
}
