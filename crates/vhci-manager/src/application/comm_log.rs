//! Communication log: the user-facing record of traffic with the agent.
//!
//! Entries are appended only while comm logging is switched on.  Sequence
//! numbers keep increasing across clears so a view can tell a fresh entry
//! from one it has already shown.

use serde::Serialize;

/// One line of the communication log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommLogEntry {
    pub sequence: u64,
    pub text: String,
}

/// Ordered, append-only list of [`CommLogEntry`] values.
#[derive(Debug, Default)]
pub struct CommLog {
    entries: Vec<CommLogEntry>,
    next_sequence: u64,
}

impl CommLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line when `enabled`.  The text is only built when it will be
    /// kept.
    pub fn record(
        &mut self,
        enabled: bool,
        text: impl FnOnce() -> String,
    ) -> Option<CommLogEntry> {
        if !enabled {
            return None;
        }
        self.next_sequence += 1;
        let entry = CommLogEntry {
            sequence: self.next_sequence,
            text: text(),
        };
        self.entries.push(entry.clone());
        Some(entry)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[CommLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
