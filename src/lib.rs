//! # chatpace - paced chat response rendering
//!
//! A small client library that sends a user message to a chat endpoint,
//! accumulates the reply from a Server-Sent Events stream, splits it into
//! sentences, and reveals them one by one with a fixed pause.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Streaming (SSE) and single-JSON reply modes
//! - Tolerant frame parsing: malformed frames are logged and skipped
//! - Cancellation of the exchange in flight when a new message is sent
//!
//! ## Architecture
//!
//! The reply travels through these stages, leaf first:
//!
//! 1. [`decode`]: raw bytes into text, across split multi-byte characters
//! 2. [`sse`]: text into complete frames
//! 3. [`payload`]: frames into `response` fragments
//! 4. [`accumulate`]: fragments into one finalized response
//! 5. [`segment`]: the response into display units
//! 6. [`present`]: units into the [`transcript`], one per second
//!
//! [`client`] holds the transport seam and its HTTP implementation.
//!
//! ## Example
//! ```no_run
//! use std::sync::{Arc, Mutex};
//! use chatpace::{ConversationId, HttpChatClient, MemoryTranscript, Presenter};
//! use chatpace::options::{PresenterOptions, TransportOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpChatClient::new(TransportOptions::new("http://localhost:8000/chat"))?;
//!     let transcript = Arc::new(Mutex::new(MemoryTranscript::new()));
//!
//!     let presenter = Presenter::new(
//!         client,
//!         transcript.clone(),
//!         ConversationId::generate(),
//!         PresenterOptions::default(),
//!     );
//!
//!     let outcome = presenter.send("Hello!").await;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod accumulate;
pub mod client;
pub mod decode;
pub mod http;
pub mod model;
pub mod options;
pub mod payload;
pub mod present;
pub mod segment;
pub mod sse;
pub mod transcript;

// Re-exports for convenience
pub use accumulate::FinalizedResponse;
pub use client::{ChatReply, ChatTransport, ClientError, HttpChatClient};
pub use model::{ChatRequest, ConversationId};
pub use present::{ExchangeOutcome, PresentationState, Presenter};
pub use segment::DisplayUnit;
pub use transcript::{MemoryTranscript, Sender, Transcript};
