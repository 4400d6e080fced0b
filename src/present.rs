//! Paced presentation of a response, one display unit at a time.
//!
//! One exchange moves through these states:
//!
//! ```text
//! Idle -> AwaitingFirstByte -> Revealing -> Done
//!               |                 |
//!               +-> Error         +-> Cancelled
//! ```
//!
//! The composing indicator is shown when the request starts and disappears
//! exactly once on every path: removed when the response is complete, turned
//! into the connectivity notice on a non-success status, or removed before
//! the offline notice on a transport failure.
//!
//! Starting a new exchange cancels the one in flight. The cancelled exchange
//! stops at its next suspension point and leaves the send control to its
//! successor.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ChatTransport, ClientError};
use crate::model::{ChatRequest, ConversationId};
use crate::options::PresenterOptions;
use crate::segment::segment;
use crate::transcript::{EntryId, Sender, Transcript};

/// Why an exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The server answered with a non-success status.
    Status,
    /// The request or the response body failed in transit.
    Offline,
}

/// Where the current exchange is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationState {
    #[default]
    Idle,
    AwaitingFirstByte,
    Revealing { shown: usize, total: usize },
    Done,
    Error(ErrorKind),
    Cancelled,
}

impl PresentationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PresentationState::Done | PresentationState::Error(_) | PresentationState::Cancelled
        )
    }
}

/// Result of one call to [`Presenter::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The message was blank; nothing was sent.
    Skipped,
    Done { shown: usize },
    Failed(ErrorKind),
    Cancelled { shown: usize },
}

impl ExchangeOutcome {
    fn state(&self) -> PresentationState {
        match self {
            ExchangeOutcome::Skipped => PresentationState::Idle,
            ExchangeOutcome::Done { .. } => PresentationState::Done,
            ExchangeOutcome::Failed(kind) => PresentationState::Error(*kind),
            ExchangeOutcome::Cancelled { .. } => PresentationState::Cancelled,
        }
    }
}

/// The composing indicator of one exchange. Consumed when it goes away, so
/// it cannot be removed twice.
#[must_use]
struct ComposingIndicator {
    id: EntryId,
}

impl ComposingIndicator {
    fn show<V: Transcript>(transcript: &mut V) -> Self {
        Self {
            id: transcript.append_composing(),
        }
    }

    fn dismiss<V: Transcript>(self, transcript: &mut V) {
        transcript.remove(self.id);
    }

    fn resolve<V: Transcript>(self, transcript: &mut V, text: &str) {
        transcript.replace(self.id, text);
    }
}

/// One exchange in flight. Dropping it before [`settle`](Exchange::settle),
/// as happens when the `send` future is dropped, still removes the
/// indicator and settles the exchange as cancelled.
struct Exchange<'a, T, V>
where
    T: ChatTransport,
    V: Transcript,
{
    presenter: &'a Presenter<T, V>,
    generation: u64,
    indicator: Option<ComposingIndicator>,
    shown: usize,
    settled: bool,
}

impl<T, V> Exchange<'_, T, V>
where
    T: ChatTransport,
    V: Transcript,
{
    fn dismiss_indicator(&mut self) {
        if let Some(indicator) = self.indicator.take() {
            self.presenter.with_transcript(|t| indicator.dismiss(t));
        }
    }

    fn resolve_indicator(&mut self, text: &str) {
        if let Some(indicator) = self.indicator.take() {
            self.presenter.with_transcript(|t| indicator.resolve(t, text));
        }
    }

    fn settle(&mut self, outcome: ExchangeOutcome) {
        self.dismiss_indicator();
        self.settled = true;
        self.presenter.finish(self.generation, outcome);
    }
}

impl<T, V> Drop for Exchange<'_, T, V>
where
    T: ChatTransport,
    V: Transcript,
{
    fn drop(&mut self) {
        if !self.settled {
            warn!(generation = self.generation, shown = self.shown, "Exchange dropped before it settled");
            self.settle(ExchangeOutcome::Cancelled { shown: self.shown });
        }
    }
}

#[derive(Debug, Default)]
struct Control {
    generation: u64,
    token: Option<CancellationToken>,
    state: PresentationState,
}

/// Sends user messages and reveals the replies sentence by sentence.
///
/// # Example
/// ```no_run
/// use std::sync::{Arc, Mutex};
/// use chatpace::client::HttpChatClient;
/// use chatpace::model::ConversationId;
/// use chatpace::options::{PresenterOptions, TransportOptions};
/// use chatpace::present::Presenter;
/// use chatpace::transcript::MemoryTranscript;
///
/// # async fn run() -> Result<(), chatpace::ClientError> {
/// let client = HttpChatClient::new(TransportOptions::new("http://localhost:8000/chat"))?;
/// let transcript = Arc::new(Mutex::new(MemoryTranscript::new()));
/// let presenter = Presenter::new(client, transcript, ConversationId::generate(), PresenterOptions::default());
///
/// presenter.send("Hello!").await;
/// # Ok(())
/// # }
/// ```
pub struct Presenter<T, V> {
    transport: T,
    transcript: Arc<Mutex<V>>,
    conversation_id: ConversationId,
    options: PresenterOptions,
    control: Mutex<Control>,
}

impl<T, V> Presenter<T, V>
where
    T: ChatTransport,
    V: Transcript,
{
    pub fn new(
        transport: T,
        transcript: Arc<Mutex<V>>,
        conversation_id: ConversationId,
        options: PresenterOptions,
    ) -> Self {
        Self {
            transport,
            transcript,
            conversation_id,
            options,
            control: Mutex::new(Control::default()),
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn transcript(&self) -> &Arc<Mutex<V>> {
        &self.transcript
    }

    /// State of the most recent exchange.
    pub fn state(&self) -> PresentationState {
        self.control().state
    }

    /// Cancel the exchange in flight, if any.
    pub fn cancel(&self) {
        if let Some(token) = &self.control().token {
            token.cancel();
        }
    }

    /// Send one user message and present the reply.
    ///
    /// Returns once the last unit is shown, the exchange failed, or it was
    /// cancelled.
    pub async fn send(&self, message: &str) -> ExchangeOutcome {
        let message = message.trim();
        if message.is_empty() {
            return ExchangeOutcome::Skipped;
        }

        let (generation, token) = self.begin();
        let mut exchange = Exchange {
            presenter: self,
            generation,
            indicator: None,
            shown: 0,
            settled: false,
        };
        let outcome = self.run(&mut exchange, message, &token).await;
        exchange.settle(outcome);
        outcome
    }

    async fn run(
        &self,
        exchange: &mut Exchange<'_, T, V>,
        message: &str,
        token: &CancellationToken,
    ) -> ExchangeOutcome {
        let generation = exchange.generation;
        exchange.indicator = Some(self.with_transcript(|t| {
            t.append(Sender::User, message);
            t.set_send_enabled(false);
            ComposingIndicator::show(t)
        }));
        self.transition(generation, PresentationState::AwaitingFirstByte);

        let request = ChatRequest::new(message).with_conversation_id(self.conversation_id.clone());
        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ClientError::Cancelled),
            result = self.transport.fetch(request) => result,
        };

        let response = match fetched {
            Ok(response) => response,
            Err(ClientError::Cancelled) => {
                exchange.dismiss_indicator();
                return ExchangeOutcome::Cancelled { shown: 0 };
            }
            Err(e) if e.is_status() => {
                warn!(error = %e, "Chat endpoint rejected the request");
                exchange.resolve_indicator(&self.options.connectivity_notice);
                return ExchangeOutcome::Failed(ErrorKind::Status);
            }
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                exchange.dismiss_indicator();
                self.with_transcript(|t| t.append(Sender::Assistant, &self.options.offline_notice));
                return ExchangeOutcome::Failed(ErrorKind::Offline);
            }
        };

        let units = segment(&response);
        let total = units.len();
        debug!(bytes = response.as_str().len(), units = total, "Response complete");

        exchange.dismiss_indicator();
        if token.is_cancelled() {
            return ExchangeOutcome::Cancelled { shown: 0 };
        }
        self.transition(generation, PresentationState::Revealing { shown: 0, total });

        for (shown, unit) in units.iter().enumerate() {
            if shown > 0 {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return ExchangeOutcome::Cancelled { shown },
                    _ = tokio::time::sleep(self.options.reveal_delay) => {}
                }
            }

            self.with_transcript(|t| t.append(Sender::Assistant, unit.as_str()));
            exchange.shown = shown + 1;
            self.transition(generation, PresentationState::Revealing { shown: shown + 1, total });
        }

        ExchangeOutcome::Done { shown: total }
    }

    /// Register a new exchange, cancelling the previous one.
    fn begin(&self) -> (u64, CancellationToken) {
        let mut control = self.control();
        if let Some(previous) = control.token.take() {
            info!(generation = control.generation, "Superseding exchange in flight");
            previous.cancel();
        }

        let token = CancellationToken::new();
        control.generation += 1;
        control.token = Some(token.clone());
        (control.generation, token)
    }

    /// Settle the exchange. Only the latest exchange touches the send control.
    fn finish(&self, generation: u64, outcome: ExchangeOutcome) {
        let mut control = self.control();
        if control.generation != generation {
            debug!(generation, ?outcome, "Superseded exchange finished");
            return;
        }

        control.token = None;
        control.state = outcome.state();
        debug!(generation, ?outcome, "Exchange finished");
        drop(control);

        self.with_transcript(|t| t.set_send_enabled(true));
    }

    fn transition(&self, generation: u64, state: PresentationState) {
        let mut control = self.control();
        if control.generation == generation {
            debug!(from = ?control.state, to = ?state, "Presentation state");
            control.state = state;
        }
    }

    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_transcript<R>(&self, f: impl FnOnce(&mut V) -> R) -> R {
        let mut transcript = self.transcript.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut transcript)
    }
}
