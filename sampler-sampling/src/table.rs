use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};

use sampler_common::EventKind;

/// Hands out identifiers for begin-events.
///
/// Identifiers start at `1` and are never repeated within the lifetime of the generator, across
/// all event kinds and threads.
#[derive(Debug)]
pub struct EventIds {
    next: AtomicU64,
}

impl EventIds {
    /// Creates a generator whose first identifier is `1`.
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Returns the next identifier.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for EventIds {
    fn default() -> Self {
        Self::new()
    }
}

/// A forwarded begin-event waiting for its end-event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Correspondence {
    /// The identifier returned by the next tool.
    pub inner_id: u64,
    /// The kind of the begin-event.
    pub kind: EventKind,
}

/// The result of looking up an end-event in the [`CorrespondenceTable`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EndLookup {
    /// The begin-event was forwarded. The entry has been removed.
    Forwarded(Correspondence),
    /// The begin-event was not forwarded, or the end-event was already relayed.
    Unknown,
    /// The begin-event was forwarded with a different kind. The entry is kept.
    KindMismatch {
        /// The kind recorded for the begin-event.
        recorded: EventKind,
    },
}

/// Maps identifiers handed to the host to identifiers of the next tool.
///
/// Only forwarded begin-events have an entry. An entry is created once the next tool returned its
/// identifier and is removed when the matching end-event is relayed.
#[derive(Debug, Default)]
pub struct CorrespondenceTable {
    entries: HashMap<u64, Correspondence>,
}

impl CorrespondenceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a forwarded begin-event.
    ///
    /// Returns the previous entry if the outer identifier was already recorded.
    pub fn insert(
        &mut self,
        outer_id: u64,
        kind: EventKind,
        inner_id: u64,
    ) -> Option<Correspondence> {
        self.entries
            .insert(outer_id, Correspondence { inner_id, kind })
    }

    /// Looks up the begin-event for an end-event and removes its entry if the kinds match.
    pub fn take(&mut self, outer_id: u64, kind: EventKind) -> EndLookup {
        match self.entries.entry(outer_id) {
            Entry::Vacant(_) => EndLookup::Unknown,
            Entry::Occupied(entry) if entry.get().kind != kind => EndLookup::KindMismatch {
                recorded: entry.get().kind,
            },
            Entry::Occupied(entry) => EndLookup::Forwarded(entry.remove()),
        }
    }

    /// Returns the entry of an outer identifier without removing it.
    pub fn get(&self, outer_id: u64) -> Option<&Correspondence> {
        self.entries.get(&outer_id)
    }

    /// Returns the number of begin-events waiting for their end-event.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no begin-event is waiting for its end-event.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
