//! Terminal chat against a streaming chat endpoint.
//!
//! Run with:
//! ```bash
//! export CHATPACE_ENDPOINT="http://localhost:8000/chat"
//! export CHATPACE_MODE="streaming"   # or "complete"
//! RUST_LOG=chatpace=debug cargo run --example terminal_chat
//! ```

use std::io::Write;
use std::sync::{Arc, Mutex};

use chatpace::options::{PresenterOptions, ResponseMode, TransportOptions};
use chatpace::transcript::EntryId;
use chatpace::{ConversationId, HttpChatClient, Presenter, Sender, Transcript};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const COMPOSING: &str = "• • •";
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Prints entries as they arrive. Only the composing indicator can be
/// taken back, since it is always the last line written.
#[derive(Default)]
struct TerminalTranscript {
    next_id: u64,
    composing: Option<EntryId>,
}

impl TerminalTranscript {
    fn next(&mut self) -> EntryId {
        self.next_id += 1;
        EntryId(self.next_id)
    }

    fn clear_composing(&mut self, id: EntryId) -> bool {
        if self.composing == Some(id) {
            self.composing = None;
            print!("{}", CLEAR_LINE);
            true
        } else {
            false
        }
    }
}

impl Transcript for TerminalTranscript {
    fn append(&mut self, sender: Sender, text: &str) -> EntryId {
        if sender == Sender::Assistant {
            println!("bot> {}", text);
        }
        self.next()
    }

    fn append_composing(&mut self) -> EntryId {
        let id = self.next();
        self.composing = Some(id);
        print!("bot> {}", COMPOSING);
        let _ = std::io::stdout().flush();
        id
    }

    fn replace(&mut self, id: EntryId, text: &str) {
        if self.clear_composing(id) {
            println!("bot> {}", text);
        }
    }

    fn remove(&mut self, id: EntryId) {
        self.clear_composing(id);
        let _ = std::io::stdout().flush();
    }

    fn set_send_enabled(&mut self, enabled: bool) {
        if enabled {
            print!("you> ");
            let _ = std::io::stdout().flush();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let endpoint = std::env::var("CHATPACE_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:8000/chat".to_string());
    let mode = match std::env::var("CHATPACE_MODE").as_deref() {
        Ok("complete") => ResponseMode::Complete,
        _ => ResponseMode::Streaming,
    };

    let client = HttpChatClient::new(TransportOptions::new(endpoint).with_mode(mode))?;
    let transcript = Arc::new(Mutex::new(TerminalTranscript::default()));
    let presenter = Presenter::new(
        client,
        transcript.clone(),
        ConversationId::generate(),
        PresenterOptions::default(),
    );

    println!("Conversation {}", presenter.conversation_id());
    transcript
        .lock()
        .map_err(|_| "transcript lock poisoned")?
        .set_send_enabled(true);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = presenter.send(&line).await;
        tracing::debug!(?outcome, "Exchange settled");
        if outcome == chatpace::ExchangeOutcome::Skipped {
            print!("you> ");
            std::io::stdout().flush()?;
        }
    }

    Ok(())
}
