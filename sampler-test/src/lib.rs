//! Helpers for testing the relay without loading tool libraries.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all console output is
//!    captured by the test runner. All logs emitted with [`sampler_log`] will show up for test
//!    failures or when run with `--nocapture`.
//!  - Use [`RecordingDownstream`] in place of a loaded library. It records every forwarded call
//!    together with the number of fences issued before it on the calling thread.
//!  - Register [`record_fence`] as the fence function. Fences are recorded per thread, so tests
//!    running in parallel do not observe each other.
//!  - Use [`capture_logs`] to assert on log lines. It only sees events of the calling thread.
//!
//! # Example
//!
//! ```no_run
//! #[test]
//! fn my_test() {
//!     sampler_test::setup();
//!
//!     sampler_log::debug!("hello, world!");
//! }
//! ```

use std::cell::RefCell;
use std::ffi::CStr;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use sampler_chain::Downstream;
use sampler_common::EventKind;

/// Setup the test environment.
///
///  - Initializes logs: The logger only captures logs from this crate and mutes all other logs.
pub fn setup() {
    sampler_log::init_test!();
}

/// Writes log output into a shared buffer.
#[derive(Clone, Debug, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs the closure and returns the messages it logged on this thread, one per line.
///
/// Lines contain the message and fields without timestamps, levels or targets.
pub fn capture_logs<F: FnOnce()>(f: F) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let output = buffer.0.lock();
    String::from_utf8_lossy(&output).into_owned()
}

thread_local! {
    static FENCES: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };
}

/// A fence function that records the device on the calling thread.
pub unsafe extern "C" fn record_fence(device_id: u32) {
    FENCES.with_borrow_mut(|fences| fences.push(device_id));
}

/// Returns the number of fences recorded on the calling thread.
pub fn fence_count() -> usize {
    FENCES.with_borrow(Vec::len)
}

/// Returns and clears the devices of all fences recorded on the calling thread.
pub fn take_fences() -> Vec<u32> {
    FENCES.take()
}

/// A call received by the [`RecordingDownstream`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    /// A forwarded begin-event.
    Begin {
        /// The kind of the event.
        kind: EventKind,
        /// The kernel name.
        name: String,
        /// The device identifier passed by the host.
        device_id: u32,
        /// The identifier returned to the relay.
        inner_id: u64,
        /// The number of fences on this thread before the call.
        fences: usize,
    },
    /// A forwarded end-event.
    End {
        /// The kind of the event.
        kind: EventKind,
        /// The identifier passed by the relay.
        inner_id: u64,
        /// The number of fences on this thread before the call.
        fences: usize,
    },
    /// A forwarded finalize.
    Finalize,
}

/// Identifiers handed out by the [`RecordingDownstream`] start here.
pub const FIRST_INNER_ID: u64 = 1000;

#[derive(Debug)]
struct State {
    calls: Vec<Call>,
    next_inner_id: u64,
}

/// A [`Downstream`] that records all calls and hands out increasing identifiers.
#[derive(Debug)]
pub struct RecordingDownstream {
    begin: [bool; EventKind::ALL.len()],
    end: [bool; EventKind::ALL.len()],
    finalize: bool,
    state: Mutex<State>,
}

impl RecordingDownstream {
    /// Creates a downstream that provides all callbacks.
    pub fn new() -> Self {
        Self {
            begin: [true; EventKind::ALL.len()],
            end: [true; EventKind::ALL.len()],
            finalize: true,
            state: Mutex::new(State {
                calls: Vec::new(),
                next_inner_id: FIRST_INNER_ID,
            }),
        }
    }

    /// Removes the begin callback of the given kind.
    pub fn without_begin(mut self, kind: EventKind) -> Self {
        self.begin[kind.index()] = false;
        self
    }

    /// Removes the end callback of the given kind.
    pub fn without_end(mut self, kind: EventKind) -> Self {
        self.end[kind.index()] = false;
        self
    }

    /// Removes the finalize callback.
    pub fn without_finalize(mut self) -> Self {
        self.finalize = false;
        self
    }

    /// Returns all calls received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Returns the number of forwarded begin-events.
    pub fn begin_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::Begin { .. }))
            .count()
    }

    /// Returns the number of forwarded end-events.
    pub fn end_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::End { .. }))
            .count()
    }
}

impl Default for RecordingDownstream {
    fn default() -> Self {
        Self::new()
    }
}

impl Downstream for RecordingDownstream {
    fn has_begin(&self, kind: EventKind) -> bool {
        self.begin[kind.index()]
    }

    fn has_end(&self, kind: EventKind) -> bool {
        self.end[kind.index()]
    }

    fn begin(&self, kind: EventKind, name: &CStr, device_id: u32) -> Option<u64> {
        if !self.has_begin(kind) {
            return None;
        }

        let mut state = self.state.lock();
        let inner_id = state.next_inner_id;
        state.next_inner_id += 1;
        state.calls.push(Call::Begin {
            kind,
            name: name.to_string_lossy().into_owned(),
            device_id,
            inner_id,
            fences: fence_count(),
        });

        Some(inner_id)
    }

    fn end(&self, kind: EventKind, inner_id: u64) -> bool {
        if !self.has_end(kind) {
            return false;
        }

        self.state.lock().calls.push(Call::End {
            kind,
            inner_id,
            fences: fence_count(),
        });
        true
    }

    fn finalize(&self) -> bool {
        if !self.finalize {
            return false;
        }

        self.state.lock().calls.push(Call::Finalize);
        true
    }
}
