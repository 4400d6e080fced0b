//! Options structures for transport and presentation configuration.

use std::collections::HashMap;
use std::time::Duration;

/// Delay between two revealed units.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(1000);

/// Shown in place of the composing indicator when the server answers with a
/// non-success status.
pub const DEFAULT_CONNECTIVITY_NOTICE: &str = "Sorry, I couldn't connect. 😢";

/// Shown when the request itself fails.
pub const DEFAULT_OFFLINE_NOTICE: &str = "Oops, I'm offline right now.";

/// How the endpoint delivers its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Server-sent event body with one `data: ` frame per fragment.
    #[default]
    Streaming,

    /// One JSON object holding the full `response` at once.
    Complete,
}

/// HTTP transport options.
///
/// # Example
/// ```rust
/// use chatpace::options::{ResponseMode, TransportOptions};
/// use std::time::Duration;
///
/// let options = TransportOptions::new("http://localhost:8000/chat")
///     .with_mode(ResponseMode::Complete)
///     .with_timeout(Duration::from_secs(30));
/// assert_eq!(options.mode, ResponseMode::Complete);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Full URL of the chat endpoint
    pub endpoint: String,

    /// Reply format expected from the endpoint
    pub mode: ResponseMode,

    /// Request timeout. None waits indefinitely.
    pub timeout: Option<Duration>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl TransportOptions {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: ResponseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}

/// Options for the paced presenter.
#[derive(Debug, Clone)]
pub struct PresenterOptions {
    /// Pause between two revealed units
    pub reveal_delay: Duration,

    pub connectivity_notice: String,

    pub offline_notice: String,
}

impl Default for PresenterOptions {
    fn default() -> Self {
        Self {
            reveal_delay: DEFAULT_REVEAL_DELAY,
            connectivity_notice: DEFAULT_CONNECTIVITY_NOTICE.to_string(),
            offline_notice: DEFAULT_OFFLINE_NOTICE.to_string(),
        }
    }
}

impl PresenterOptions {
    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay = delay;
        self
    }

    pub fn with_connectivity_notice(mut self, notice: impl Into<String>) -> Self {
        self.connectivity_notice = notice.into();
        self
    }

    pub fn with_offline_notice(mut self, notice: impl Into<String>) -> Self {
        self.offline_notice = notice.into();
        self
    }
}
