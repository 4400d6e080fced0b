//! Transport seam and error types.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use std::pin::Pin;
use thiserror::Error;
use tracing::debug;

use crate::accumulate::{collect_response, FinalizedResponse};
use crate::http::{add_extra_headers, build_http_client};
use crate::model::{ChatRequest, ChatResponseBody};
use crate::options::{ResponseMode, TransportOptions};
use crate::sse::SseFragmentExt;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Exchange cancelled")]
    Cancelled,
}

impl ClientError {
    /// Whether the server answered with a non-success status.
    pub fn is_status(&self) -> bool {
        matches!(self, ClientError::Status { .. })
    }
}

/// Longest error body kept from a non-success response.
pub const MAX_ERROR_BODY: usize = 4096;

/// Raw response body as delivered by the transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// A successful reply from the chat endpoint.
pub enum ChatReply {
    /// Server-sent event body still being received.
    Streaming(ByteStream),

    /// Full response text delivered at once.
    Complete(FinalizedResponse),
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatReply::Streaming(_) => f.write_str("ChatReply::Streaming(..)"),
            ChatReply::Complete(text) => f.debug_tuple("ChatReply::Complete").field(text).finish(),
        }
    }
}

/// Something that can carry one user message to the chat endpoint.
///
/// Implement `send`; `fetch` drives the reply to a finalized response.
///
/// # Example
/// ```rust,ignore
/// struct Canned;
///
/// #[async_trait]
/// impl ChatTransport for Canned {
///     async fn send(&self, _request: ChatRequest) -> Result<ChatReply, ClientError> {
///         Ok(ChatReply::Complete("Hello.".to_string().into()))
///     }
/// }
/// ```
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the request. Non-success statuses come back as
    /// [`ClientError::Status`].
    async fn send(&self, request: ChatRequest) -> Result<ChatReply, ClientError>;

    /// Send the request and wait for the complete response text.
    ///
    /// Streaming bodies are decoded, split into frames and accumulated;
    /// malformed frames are skipped.
    async fn fetch(&self, request: ChatRequest) -> Result<FinalizedResponse, ClientError> {
        match self.send(request).await? {
            ChatReply::Streaming(body) => collect_response(body.sse_fragments()).await,
            ChatReply::Complete(response) => Ok(response),
        }
    }
}

/// `ChatTransport` over HTTP POST with a JSON body.
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    http: reqwest::Client,
    options: TransportOptions,
}

impl HttpChatClient {
    pub fn new(options: TransportOptions) -> Result<Self, ClientError> {
        if options.endpoint.trim().is_empty() {
            return Err(ClientError::Config("endpoint is required".to_string()));
        }

        let http = build_http_client(&options)?;
        Ok(Self { http, options })
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }
}

#[async_trait]
impl ChatTransport for HttpChatClient {
    async fn send(&self, request: ChatRequest) -> Result<ChatReply, ClientError> {
        let mut req = self
            .http
            .post(&self.options.endpoint)
            .header(CONTENT_TYPE, "application/json");

        req = add_extra_headers(req, &self.options.extra_headers);

        let response = req.json(&request).send().await?;
        let status = response.status();
        debug!(status = %status, mode = ?self.options.mode, "Chat endpoint responded");

        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        match self.options.mode {
            ResponseMode::Streaming => {
                let body = response.bytes_stream().map(|chunk| chunk.map_err(ClientError::from));
                Ok(ChatReply::Streaming(Box::pin(body)))
            }
            ResponseMode::Complete => {
                let text = response.text().await?;
                let body: ChatResponseBody = serde_json::from_str(&text)?;
                Ok(ChatReply::Complete(body.response.into()))
            }
        }
    }
}

/// Read at most [`MAX_ERROR_BODY`] bytes of an error response.
async fn read_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while body.len() < MAX_ERROR_BODY {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = MAX_ERROR_BODY - body.len();
                body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "Failed to read error body");
                break;
            }
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
