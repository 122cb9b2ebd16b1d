use std::fmt;

/// The kind of a kernel event reported by the host runtime.
///
/// Every kind has its own begin and end callback, and its own invocation counter in the sampling
/// engine.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum EventKind {
    /// A `parallel_for` kernel.
    For,
    /// A `parallel_scan` kernel.
    Scan,
    /// A `parallel_reduce` kernel.
    Reduce,
}

impl EventKind {
    /// All event kinds, in the order of [`EventKind::index`].
    pub const ALL: [EventKind; 3] = [EventKind::For, EventKind::Scan, EventKind::Reduce];

    /// Returns a dense index for per-kind tables.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            EventKind::For => 0,
            EventKind::Scan => 1,
            EventKind::Reduce => 2,
        }
    }

    /// Returns the name used in diagnostics, such as `parallel-for`.
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::For => "parallel-for",
            EventKind::Scan => "parallel-scan",
            EventKind::Reduce => "parallel-reduce",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
