use std::ffi::CStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use sampler_chain::Downstream;
use sampler_common::{DeviceId, EventKind};
use sampler_config::Config;
use sampler_sampling::{CorrespondenceTable, EndLookup, EventIds, Sampler, SamplingPolicy};

use crate::{FenceCoordinator, RelayError};

/// State shared by all threads, guarded by a single lock.
#[derive(Debug)]
struct RelayState {
    sampler: Sampler,
    table: CorrespondenceTable,
}

/// Relays sampled kernel events to the next tool of the chain.
///
/// The lock around the sampler and the correspondence table is never held while calling into the
/// downstream tool or the fence.
#[derive(Debug)]
pub struct Relay<D> {
    downstream: D,
    fence: Arc<FenceCoordinator>,
    global_fences: bool,
    ids: EventIds,
    state: Mutex<RelayState>,
    finalized: AtomicBool,
}

impl<D: Downstream> Relay<D> {
    /// Creates a relay forwarding to `downstream`.
    ///
    /// If `global_fences` is set, every forwarded event is preceded by a fence on
    /// [`DeviceId::GLOBAL`].
    pub fn new(
        downstream: D,
        sampler: Sampler,
        fence: Arc<FenceCoordinator>,
        global_fences: bool,
    ) -> Self {
        Self {
            downstream,
            fence,
            global_fences,
            ids: EventIds::new(),
            state: Mutex::new(RelayState {
                sampler,
                table: CorrespondenceTable::new(),
            }),
            finalized: AtomicBool::new(false),
        }
    }

    /// Creates a relay with the sampling policy, seed and fence setting of the configuration.
    pub fn from_config(downstream: D, config: &Config, fence: Arc<FenceCoordinator>) -> Self {
        let policy = SamplingPolicy::from_config(config);
        let sampler = Sampler::new(policy, config.seed);

        if config.global_fences {
            sampler_log::info!("tool-induced fences enabled around sampled kernels");
        }

        Self::new(downstream, sampler, fence, config.global_fences)
    }

    /// Returns the downstream tool.
    pub fn downstream(&self) -> &D {
        &self.downstream
    }

    /// Returns the number of forwarded begin-events still waiting for their end-event.
    pub fn pending(&self) -> usize {
        self.state.lock().table.len()
    }

    /// Handles a begin-event and returns the identifier for the host.
    ///
    /// Every begin-event receives a fresh identifier, whether it is forwarded or not.
    pub fn begin(&self, kind: EventKind, name: &CStr, device_id: u32) -> Result<u64, RelayError> {
        let outer_id = self.ids.next_id();

        if !self.state.lock().sampler.sample(kind) {
            return Ok(outer_id);
        }

        if !self.downstream.has_begin(kind) {
            sampler_log::trace!(outer_id, %kind, "sampled event has no begin callback");
            return Ok(outer_id);
        }

        sampler_log::info!("sample {outer_id} calling child-begin function...");
        self.fence()?;

        if let Some(inner_id) = self.downstream.begin(kind, name, device_id) {
            self.state.lock().table.insert(outer_id, kind, inner_id);
        }

        sampler_log::info!("sample {outer_id} finished with child-begin function.");
        Ok(outer_id)
    }

    /// Handles an end-event.
    ///
    /// The event is forwarded only if its begin-event was. Ends of events that were not forwarded,
    /// or that were already relayed, are ignored.
    pub fn end(&self, kind: EventKind, outer_id: u64) -> Result<(), RelayError> {
        let lookup = self.state.lock().table.take(outer_id, kind);

        let entry = match lookup {
            EndLookup::Forwarded(entry) => entry,
            EndLookup::Unknown => {
                sampler_log::trace!(outer_id, %kind, "ignoring end of event that was not sampled");
                return Ok(());
            }
            EndLookup::KindMismatch { recorded } => {
                sampler_log::warn!(
                    "ignoring end-{kind} of sample {outer_id}, which began as {recorded}"
                );
                return Ok(());
            }
        };

        if !self.downstream.has_end(kind) {
            sampler_log::debug!(outer_id, %kind, "next library has no end callback");
            return Ok(());
        }

        sampler_log::info!("sample {outer_id} calling child-end function...");
        self.fence()?;
        self.downstream.end(kind, entry.inner_id);
        sampler_log::info!("sample {outer_id} finished with child-end function.");

        Ok(())
    }

    /// Forwards the shutdown of the host runtime.
    ///
    /// Only the first call is forwarded. Returns `true` if the downstream tool was finalized.
    pub fn finalize(&self) -> bool {
        if self.finalized.swap(true, Ordering::AcqRel) {
            sampler_log::warn!("finalize called more than once, ignoring");
            return false;
        }

        let pending = self.pending();
        if pending > 0 {
            sampler_log::debug!(pending, "finalizing with unfinished sampled kernels");
        }

        let forwarded = self.downstream.finalize();
        if forwarded {
            sampler_log::info!("finalized child library");
        }

        forwarded
    }

    fn fence(&self) -> Result<(), RelayError> {
        if self.global_fences {
            self.fence.require_fence(DeviceId::GLOBAL)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sampler_test::{Call, FIRST_INNER_ID, RecordingDownstream};
    use similar_asserts::assert_eq;

    use super::*;

    fn relay(policy: SamplingPolicy, global_fences: bool) -> Relay<RecordingDownstream> {
        relay_with(RecordingDownstream::new(), policy, global_fences)
    }

    fn relay_with(
        downstream: RecordingDownstream,
        policy: SamplingPolicy,
        global_fences: bool,
    ) -> Relay<RecordingDownstream> {
        let fence = Arc::new(FenceCoordinator::new());
        fence.register(1, Some(sampler_test::record_fence));
        sampler_test::take_fences();
        Relay::new(downstream, Sampler::new(policy, Some(0)), fence, global_fences)
    }

    fn every(period: u64) -> SamplingPolicy {
        SamplingPolicy::new(period, 100.0)
    }

    /// Runs `count` begin/end pairs and returns the outer ids of the forwarded ones.
    fn run_pairs(relay: &Relay<RecordingDownstream>, kind: EventKind, count: usize) -> Vec<u64> {
        let mut forwarded = Vec::new();

        for _ in 0..count {
            let pending = relay.pending();
            let outer_id = relay.begin(kind, c"kernel", 0).unwrap();
            if relay.pending() > pending {
                forwarded.push(outer_id);
            }
            relay.end(kind, outer_id).unwrap();
        }

        forwarded
    }

    #[test]
    fn test_ids_start_at_one() {
        sampler_test::setup();
        let relay = relay(every(1), false);

        assert_eq!(relay.begin(EventKind::For, c"a", 0), Ok(1));
        assert_eq!(relay.begin(EventKind::Scan, c"b", 0), Ok(2));
        assert_eq!(relay.begin(EventKind::For, c"c", 0), Ok(3));
    }

    #[test]
    fn test_period_fifty_one() {
        sampler_test::setup();
        let relay = relay(every(51), false);

        assert_eq!(run_pairs(&relay, EventKind::For, 150), vec![51, 102]);
        assert_eq!(relay.downstream().begin_count(), 2);
        assert_eq!(relay.downstream().end_count(), 2);
        assert_eq!(relay.pending(), 0);
    }

    #[test]
    fn test_period_five() {
        sampler_test::setup();
        let relay = relay(every(5), false);

        assert_eq!(run_pairs(&relay, EventKind::Reduce, 15), vec![5, 10, 15]);
    }

    #[test]
    fn test_probability_hundred_and_zero() {
        sampler_test::setup();

        let all = relay(SamplingPolicy::new(1, 100.0), false);
        assert_eq!(run_pairs(&all, EventKind::Scan, 40).len(), 40);

        let none = relay(SamplingPolicy::new(1, 0.0), false);
        assert_eq!(run_pairs(&none, EventKind::Scan, 40).len(), 0);
        assert!(none.downstream().calls().is_empty());
    }

    #[test]
    fn test_round_trip() {
        sampler_test::setup();
        let relay = relay(every(1), false);

        let outer_id = relay.begin(EventKind::For, c"axpy", 7).unwrap();
        relay.end(EventKind::For, outer_id).unwrap();

        assert_eq!(
            relay.downstream().calls(),
            vec![
                Call::Begin {
                    kind: EventKind::For,
                    name: "axpy".to_owned(),
                    device_id: 7,
                    inner_id: FIRST_INNER_ID,
                    fences: 0,
                },
                Call::End {
                    kind: EventKind::For,
                    inner_id: FIRST_INNER_ID,
                    fences: 0,
                },
            ]
        );
    }

    #[test]
    fn test_second_end_is_noop() {
        sampler_test::setup();
        let relay = relay(every(1), false);

        let outer_id = relay.begin(EventKind::For, c"kernel", 0).unwrap();
        relay.end(EventKind::For, outer_id).unwrap();
        relay.end(EventKind::For, outer_id).unwrap();

        assert_eq!(relay.downstream().end_count(), 1);
        assert_eq!(relay.pending(), 0);
    }

    #[test]
    fn test_unknown_end_is_noop() {
        sampler_test::setup();
        let relay = relay(every(1), false);

        relay.end(EventKind::Scan, 42).unwrap();
        assert!(relay.downstream().calls().is_empty());
    }

    #[test]
    fn test_kind_mismatch_is_ignored() {
        sampler_test::setup();
        let relay = relay(every(1), false);

        let outer_id = relay.begin(EventKind::For, c"kernel", 0).unwrap();
        relay.end(EventKind::Reduce, outer_id).unwrap();
        assert_eq!(relay.downstream().end_count(), 0);
        assert_eq!(relay.pending(), 1);

        relay.end(EventKind::For, outer_id).unwrap();
        assert_eq!(relay.downstream().end_count(), 1);
    }

    #[test]
    fn test_missing_begin_never_forwards() {
        sampler_test::setup();
        let downstream = RecordingDownstream::new().without_begin(EventKind::Scan);
        let relay = relay_with(downstream, every(1), true);

        let outer_id = relay.begin(EventKind::Scan, c"kernel", 0).unwrap();
        relay.end(EventKind::Scan, outer_id).unwrap();

        assert!(relay.downstream().calls().is_empty());
        assert!(sampler_test::take_fences().is_empty());
    }

    #[test]
    fn test_missing_end_clears_entry() {
        sampler_test::setup();
        let downstream = RecordingDownstream::new().without_end(EventKind::Reduce);
        let relay = relay_with(downstream, every(1), false);

        let outer_id = relay.begin(EventKind::Reduce, c"kernel", 0).unwrap();
        assert_eq!(relay.pending(), 1);
        relay.end(EventKind::Reduce, outer_id).unwrap();

        assert_eq!(relay.pending(), 0);
        assert_eq!(relay.downstream().begin_count(), 1);
        assert_eq!(relay.downstream().end_count(), 0);
    }

    #[test]
    fn test_fences_are_symmetric() {
        sampler_test::setup();
        let relay = relay(every(2), true);

        for _ in 0..4 {
            let outer_id = relay.begin(EventKind::For, c"kernel", 5).unwrap();
            relay.end(EventKind::For, outer_id).unwrap();
        }

        // Two sampled kernels, each fenced before begin and before end.
        assert_eq!(sampler_test::take_fences(), vec![0, 0, 0, 0]);

        let fences: Vec<usize> = relay
            .downstream()
            .calls()
            .into_iter()
            .map(|call| match call {
                Call::Begin { fences, .. } | Call::End { fences, .. } => fences,
                Call::Finalize => 0,
            })
            .collect();
        assert_eq!(fences, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_fence_before_forward() {
        sampler_test::setup();
        let fence = Arc::new(FenceCoordinator::new());
        let relay = Relay::new(
            RecordingDownstream::new(),
            Sampler::new(every(1), Some(0)),
            fence,
            true,
        );

        let error = relay.begin(EventKind::For, c"kernel", 0).unwrap_err();
        assert_eq!(
            error,
            RelayError::FenceUnavailable {
                device: DeviceId::GLOBAL,
            }
        );
        assert!(relay.downstream().calls().is_empty());
    }

    #[test]
    fn test_unsampled_events_need_no_fence() {
        sampler_test::setup();
        let relay = Relay::new(
            RecordingDownstream::new(),
            Sampler::new(every(3), Some(0)),
            Arc::new(FenceCoordinator::new()),
            true,
        );

        let first = relay.begin(EventKind::For, c"kernel", 0).unwrap();
        relay.end(EventKind::For, first).unwrap();
        let second = relay.begin(EventKind::For, c"kernel", 0).unwrap();
        relay.end(EventKind::For, second).unwrap();

        assert!(relay.begin(EventKind::For, c"kernel", 0).is_err());
    }

    #[test]
    fn test_lifecycle_lines() {
        let relay = relay(every(2), false);

        let logs = sampler_test::capture_logs(|| {
            run_pairs(&relay, EventKind::For, 2);
        });

        let lines: Vec<&str> = logs
            .lines()
            .map(str::trim_start)
            .filter(|line| line.starts_with("sample "))
            .collect();
        assert_eq!(
            lines,
            [
                "sample 2 calling child-begin function...",
                "sample 2 finished with child-begin function.",
                "sample 2 calling child-end function...",
                "sample 2 finished with child-end function.",
            ]
        );
    }

    #[test]
    fn test_finalize_once() {
        sampler_test::setup();
        let relay = relay(every(1), false);

        assert!(relay.finalize());
        assert!(!relay.finalize());
        assert_eq!(relay.downstream().calls(), vec![Call::Finalize]);
    }

    #[test]
    fn test_finalize_without_callback() {
        sampler_test::setup();
        let downstream = RecordingDownstream::new().without_finalize();
        let relay = relay_with(downstream, every(1), false);

        assert!(!relay.finalize());
        assert!(relay.downstream().calls().is_empty());
    }

    #[test]
    fn test_from_config() {
        sampler_test::setup();
        let config = Config {
            skip: Some(1),
            seed: Some(3),
            global_fences: true,
            ..Config::default()
        };

        let fence = Arc::new(FenceCoordinator::new());
        fence.register(1, Some(sampler_test::record_fence));
        let relay = Relay::from_config(RecordingDownstream::new(), &config, fence);
        sampler_test::take_fences();

        assert_eq!(run_pairs(&relay, EventKind::For, 10).len(), 5);
        assert_eq!(sampler_test::take_fences().len(), 10);
    }

    #[test]
    fn test_concurrent_events() {
        sampler_test::setup();
        let relay = relay(every(1), false);

        std::thread::scope(|scope| {
            for kind in EventKind::ALL {
                let relay = &relay;
                scope.spawn(move || {
                    for _ in 0..200 {
                        let outer_id = relay.begin(kind, c"kernel", 0).unwrap();
                        relay.end(kind, outer_id).unwrap();
                    }
                });
            }
        });

        let calls = relay.downstream().calls();
        assert_eq!(relay.downstream().begin_count(), 600);
        assert_eq!(relay.downstream().end_count(), 600);
        assert_eq!(relay.pending(), 0);

        // Every forwarded end carries an inner id handed out by a forwarded begin of the same kind.
        for call in &calls {
            if let Call::End { kind, inner_id, .. } = call {
                assert!(calls.iter().any(|other| matches!(
                    other,
                    Call::Begin { kind: begin_kind, inner_id: begin_id, .. }
                        if begin_kind == kind && begin_id == inner_id
                )));
            }
        }
    }
}
