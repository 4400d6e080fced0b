//! The chat transcript as seen by the presenter.
//!
//! `Transcript` is the seam to whatever renders the conversation: a terminal,
//! a GUI, or the in-memory [`MemoryTranscript`] used by headless callers and
//! tests. Only the presenter mutates it.

use tokio::time::Instant;

/// Handle to one transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(pub u64);

/// Who an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// UI operations needed to present one exchange.
pub trait Transcript: Send {
    /// Append a regular message.
    fn append(&mut self, sender: Sender, text: &str) -> EntryId;

    /// Append the transient composing indicator.
    fn append_composing(&mut self) -> EntryId;

    /// Replace an entry's content with plain text. A composing indicator
    /// becomes a regular assistant message.
    fn replace(&mut self, id: EntryId, text: &str);

    fn remove(&mut self, id: EntryId);

    /// Enable or disable the send control.
    fn set_send_enabled(&mut self, enabled: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Message(String),
    Composing,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub id: EntryId,
    pub sender: Sender,
    pub kind: EntryKind,
    /// When the entry last changed.
    pub at: Instant,
}

impl Entry {
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Message(text) => Some(text),
            EntryKind::Composing => None,
        }
    }
}

/// Transcript kept in memory.
///
/// Operations on unknown entries are counted rather than panicking so that
/// callers can check for double removals.
#[derive(Debug)]
pub struct MemoryTranscript {
    entries: Vec<Entry>,
    next_id: u64,
    send_enabled: bool,
    stale_operations: usize,
}

impl Default for MemoryTranscript {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            send_enabled: true,
            stale_operations: 0,
        }
    }
}

impl MemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Texts of all regular messages from `sender`, in order.
    pub fn messages_from(&self, sender: Sender) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.sender == sender)
            .filter_map(Entry::text)
            .collect()
    }

    /// Number of composing indicators currently shown.
    pub fn composing_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Composing)
            .count()
    }

    pub fn send_enabled(&self) -> bool {
        self.send_enabled
    }

    /// Replacements or removals that targeted an entry no longer present.
    pub fn stale_operations(&self) -> usize {
        self.stale_operations
    }

    fn push(&mut self, sender: Sender, kind: EntryKind) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            sender,
            kind,
            at: Instant::now(),
        });
        id
    }

    fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

impl Transcript for MemoryTranscript {
    fn append(&mut self, sender: Sender, text: &str) -> EntryId {
        self.push(sender, EntryKind::Message(text.to_string()))
    }

    fn append_composing(&mut self) -> EntryId {
        self.push(Sender::Assistant, EntryKind::Composing)
    }

    fn replace(&mut self, id: EntryId, text: &str) {
        match self.position(id) {
            Some(pos) => {
                let entry = &mut self.entries[pos];
                entry.kind = EntryKind::Message(text.to_string());
                entry.at = Instant::now();
            }
            None => self.stale_operations += 1,
        }
    }

    fn remove(&mut self, id: EntryId) {
        match self.position(id) {
            Some(pos) => {
                self.entries.remove(pos);
            }
            None => self.stale_operations += 1,
        }
    }

    fn set_send_enabled(&mut self, enabled: bool) {
        self.send_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_remove_composing() {
        let mut transcript = MemoryTranscript::new();
        transcript.append(Sender::User, "hello");
        let indicator = transcript.append_composing();
        assert_eq!(transcript.composing_count(), 1);

        transcript.remove(indicator);
        assert_eq!(transcript.composing_count(), 0);
        assert_eq!(transcript.stale_operations(), 0);

        transcript.remove(indicator);
        assert_eq!(transcript.stale_operations(), 1);
    }

    #[test]
    fn test_replace_turns_indicator_into_message() {
        let mut transcript = MemoryTranscript::new();
        let indicator = transcript.append_composing();
        transcript.replace(indicator, "notice");
        assert_eq!(transcript.composing_count(), 0);
        assert_eq!(transcript.messages_from(Sender::Assistant), vec!["notice"]);
    }

    #[test]
    fn test_send_enabled_by_default() {
        let mut transcript = MemoryTranscript::new();
        assert!(transcript.send_enabled());
        transcript.set_send_enabled(false);
        assert!(!transcript.send_enabled());
    }
}
