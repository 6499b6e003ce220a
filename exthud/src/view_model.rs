//! # Runtime Extensions Model
//!
//! Owns everything the runtime extensions list is computed from and
//! republishes the list whenever an input changes.
//!
//! ## Inputs
//!
//! - Descriptions: captured once at construction. Extensions without an
//!   entry point are dropped for the model's lifetime.
//! - Statuses and marketplace records: pulled from the host on every resolve.
//! - Trace: the last trace a profiling session produced, if any.
//!
//! ## Update Cycle
//!
//! ```text
//! HostEvent / trace published ──► refresh.trigger()
//!                                        │  (coalesced, ≤ 1 pending)
//! pump(now) ─────────────────────► refresh.poll() ──► resolve() ──► subscribers
//! ```
//!
//! The model is driven from a single loop. Published lists are immutable
//! `Arc` snapshots: a resolve swaps in a new one, it never edits an old one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use exthud_common::{ExtensionDescription, ProfileTrace};
use log::{debug, error, info, warn};

use crate::analysis::{resolve, MarketplaceIndex, RuntimeExtensionRecord, SegmentedTrace};
use crate::domain::{Micros, ProfilingError};
use crate::host::{ExtensionHost, HostEvent};
use crate::profiling::{
    CoalescedRefresh, ProfileSessionController, ProfilerBackend, ProfilingDriver, SessionEvent,
    SessionPhase,
};

/// Immutable published record list
pub type RecordList = Arc<[RuntimeExtensionRecord]>;

/// View model behind the runtime extensions list
pub struct RuntimeExtensionsModel<H: ExtensionHost, B: ProfilerBackend> {
    host: H,
    descriptions: Vec<ExtensionDescription>,
    driver: ProfilingDriver<B>,
    session: ProfileSessionController<B::Session>,
    refresh: CoalescedRefresh,

    trace: Option<Arc<ProfileTrace>>,
    segmented: Option<Arc<SegmentedTrace>>,
    records: RecordList,
    subscribers: Vec<Sender<RecordList>>,

    last_error: Option<ProfilingError>,
    resolve_count: u64,
}

impl<H: ExtensionHost, B: ProfilerBackend> RuntimeExtensionsModel<H, B> {
    /// Capture descriptions from `host` and resolve the initial list
    pub fn new(host: H, driver: ProfilingDriver<B>, refresh_delay: Duration) -> Self {
        let all = host.extension_descriptions();
        let total = all.len();
        let descriptions: Vec<ExtensionDescription> =
            all.into_iter().filter(|d| d.has_entry_point).collect();
        info!(
            "tracking {} extensions ({} without entry point skipped)",
            descriptions.len(),
            total - descriptions.len()
        );

        let mut model = Self {
            host,
            descriptions,
            driver,
            session: ProfileSessionController::new(),
            refresh: CoalescedRefresh::new(refresh_delay),
            trace: None,
            segmented: None,
            records: Arc::from(Vec::new()),
            subscribers: Vec::new(),
            last_error: None,
            resolve_count: 0,
        };
        model.resolve();
        model
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Recompute the list from the current inputs and notify subscribers
    pub fn resolve(&mut self) -> RecordList {
        let statuses = self.host.current_statuses();
        let marketplace = MarketplaceIndex::from_records(self.host.marketplace_records());
        let segmented = self.trace.as_deref().map(|t| Arc::new(SegmentedTrace::from_trace(t)));

        let records: RecordList =
            resolve(&self.descriptions, &marketplace, &statuses, segmented.as_deref()).into();

        self.segmented = segmented;
        self.records = Arc::clone(&records);
        self.resolve_count += 1;

        self.subscribers.retain(|tx| tx.send(Arc::clone(&records)).is_ok());
        debug!("resolve #{} published {} records", self.resolve_count, records.len());
        records
    }

    /// Current published list
    #[must_use]
    pub fn records(&self) -> RecordList {
        Arc::clone(&self.records)
    }

    /// Receive every list published from now on
    pub fn subscribe(&mut self) -> Receiver<RecordList> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    #[must_use]
    pub fn resolve_count(&self) -> u64 {
        self.resolve_count
    }

    /// Extensions tracked by this model (entry point present)
    #[must_use]
    pub fn descriptions(&self) -> &[ExtensionDescription] {
        &self.descriptions
    }

    // ------------------------------------------------------------------------
    // Change notifications
    // ------------------------------------------------------------------------

    /// The host reported a status change
    pub fn notify_statuses_changed(&mut self, now: Instant) {
        self.refresh.trigger(now);
    }

    /// Drain pending host events. Any event schedules a refresh.
    pub fn drain_host_events(&mut self, events: &Receiver<HostEvent>, now: Instant) {
        while let Ok(event) = events.try_recv() {
            debug!("host event: {event:?}");
            self.refresh.trigger(now);
        }
    }

    /// Make `trace` the active trace
    pub fn publish_trace(&mut self, trace: ProfileTrace, now: Instant) {
        if !trace.is_consistent() {
            warn!(
                "published trace deltas sum to {}us but it spans {}us",
                trace.delta_sum(),
                trace.duration()
            );
        }
        self.trace = Some(Arc::new(trace));
        self.refresh.trigger(now);
    }

    /// Drop the active trace
    pub fn clear_trace(&mut self, now: Instant) {
        if self.trace.take().is_some() {
            self.refresh.trigger(now);
        }
    }

    #[must_use]
    pub fn trace(&self) -> Option<Arc<ProfileTrace>> {
        self.trace.clone()
    }

    /// Segmentation of the active trace, as of the last resolve
    #[must_use]
    pub fn segmented_trace(&self) -> Option<Arc<SegmentedTrace>> {
        self.segmented.clone()
    }

    /// Duration of the trace behind the published list
    #[must_use]
    pub fn trace_duration(&self) -> Option<Micros> {
        self.segmented.as_ref().map(|s| s.duration())
    }

    // ------------------------------------------------------------------------
    // Profiling
    // ------------------------------------------------------------------------

    /// Start a profiling session (ignored unless idle)
    pub fn request_start(&mut self) {
        if let Some(request) = self.session.request_start() {
            self.last_error = None;
            self.driver.dispatch(request);
        }
    }

    /// Stop the running session (ignored unless running)
    pub fn request_stop(&mut self) {
        if let Some(request) = self.session.request_stop() {
            self.driver.dispatch(request);
        }
    }

    /// Start when idle, stop when running
    pub fn toggle_profiling(&mut self) {
        if let Some(request) = self.session.toggle() {
            if matches!(self.session.phase(), SessionPhase::Starting) {
                self.last_error = None;
            }
            self.driver.dispatch(request);
        }
    }

    #[must_use]
    pub fn session_phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// Most recent profiling failure, cleared by the next start
    #[must_use]
    pub fn last_error(&self) -> Option<&ProfilingError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    // ------------------------------------------------------------------------
    // Loop integration
    // ------------------------------------------------------------------------

    /// Apply finished profiling requests and run a due refresh.
    ///
    /// Returns `true` if a resolve happened.
    pub fn pump(&mut self, now: Instant) -> bool {
        while let Some(completion) = self.driver.try_completion() {
            match self.session.on_completion(completion) {
                SessionEvent::Started | SessionEvent::Ignored => {}
                SessionEvent::Stopped(trace) => self.publish_trace(trace, now),
                SessionEvent::Failed(err) => {
                    error!("profiling failed: {err}");
                    self.last_error = Some(err);
                }
            }
        }

        if self.refresh.poll(now) {
            self.resolve();
            true
        } else {
            false
        }
    }

    /// When the next refresh is due, if one is pending
    #[must_use]
    pub fn next_refresh(&self) -> Option<Instant> {
        self.refresh.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SnapshotHost;
    use crate::profiling::driver::tests::FakeBackend;
    use crate::snapshot::ExtensionSnapshot;
    use exthud_common::{
        ActivationTimes, ActivationTrigger, ExtensionId, ExtensionStatus, TraceDelta,
    };
    use tokio::runtime::Handle;

    const DELAY: Duration = Duration::from_millis(200);

    fn description(id: &str, has_entry_point: bool) -> ExtensionDescription {
        ExtensionDescription {
            identifier: ExtensionId::new(id),
            display_name: None,
            version: "0.1.0".to_string(),
            has_entry_point,
            repository_url: None,
            is_builtin: false,
        }
    }

    fn activated() -> ExtensionStatus {
        ExtensionStatus {
            activation: Some(ActivationTimes {
                trigger: ActivationTrigger::Event("onCommand:x".to_string()),
                startup: false,
                code_loading_time: 1,
                activate_call_time: 2,
                activate_resolved_time: 0,
                activated_by: None,
            }),
            messages: Vec::new(),
        }
    }

    fn snapshot(status_ids: &[&str]) -> ExtensionSnapshot {
        ExtensionSnapshot {
            descriptions: vec![
                description("A", true),
                description("B", true),
                description("C", true),
                description("themes.only", false),
            ],
            marketplace: Vec::new(),
            statuses: status_ids.iter().map(|id| (ExtensionId::new(*id), activated())).collect(),
        }
    }

    fn model(
        status_ids: &[&str],
        backend: FakeBackend,
    ) -> (RuntimeExtensionsModel<SnapshotHost, FakeBackend>, Receiver<HostEvent>) {
        let mut snap = snapshot(status_ids);
        snap.statuses.insert(ExtensionId::new("themes.only"), activated());
        let (host, events) = SnapshotHost::from_snapshot(snap);
        let driver = ProfilingDriver::new(backend, Handle::current());
        (RuntimeExtensionsModel::new(host, driver, DELAY), events)
    }

    /// Pump until the session leaves its current phase
    async fn settle(model: &mut RuntimeExtensionsModel<SnapshotHost, FakeBackend>) {
        let phase = model.session_phase();
        for _ in 0..500 {
            model.pump(Instant::now());
            if model.session_phase() != phase {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("session stuck in {phase:?}");
    }

    fn ids(records: &RecordList) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    #[tokio::test]
    async fn test_initial_resolve_filters_entry_point_and_status() {
        let (model, _events) = model(&["A", "C"], FakeBackend::default());
        assert_eq!(model.descriptions().len(), 3);
        assert_eq!(ids(&model.records()), vec!["A", "C"]);
        assert_eq!(model.resolve_count(), 1);
    }

    #[tokio::test]
    async fn test_status_burst_resolves_once() {
        let (mut model, events) = model(&["A"], FakeBackend::default());
        let updates = model.subscribe();
        let t0 = Instant::now();

        model.host_mut().replace(snapshot(&["A", "B"]));
        model.host_mut().replace(snapshot(&["A", "B", "C"]));
        model.drain_host_events(&events, t0);
        model.notify_statuses_changed(t0 + Duration::from_millis(50));

        assert!(!model.pump(t0 + Duration::from_millis(100)));
        assert!(model.pump(t0 + DELAY));
        assert!(!model.pump(t0 + DELAY * 2));

        let published = updates.try_recv().unwrap();
        assert_eq!(ids(&published), vec!["A", "B", "C"]);
        assert!(updates.try_recv().is_err());
        assert_eq!(model.resolve_count(), 2);
    }

    #[tokio::test]
    async fn test_profiling_publishes_sorted_records() {
        let (mut model, _events) = model(&["A", "B", "C"], FakeBackend::default());

        model.request_start();
        model.request_start();
        settle(&mut model).await;
        assert_eq!(model.session_phase(), SessionPhase::Running);

        model.request_stop();
        settle(&mut model).await;
        assert_eq!(model.session_phase(), SessionPhase::Idle);
        assert!(model.trace().is_some());

        let now = Instant::now();
        assert!(model.pump(now + DELAY));

        let records = model.records();
        // A=700, B=300, C never ran
        assert_eq!(ids(&records), vec!["A", "B", "C"]);
        assert_eq!(records[0].profile_time().0, 700);
        assert_eq!(records[2].profile_time().0, 0);
        assert!(model.segmented_trace().is_some());
        assert_eq!(model.trace_duration(), Some(Micros(1000)));
    }

    #[tokio::test]
    async fn test_failed_start_is_reported() {
        let backend = FakeBackend { fail_start: true, ..FakeBackend::default() };
        let (mut model, _events) = model(&["A"], backend);

        model.toggle_profiling();
        settle(&mut model).await;

        assert_eq!(model.session_phase(), SessionPhase::Idle);
        assert!(matches!(model.last_error(), Some(ProfilingError::StartFailed(_))));
        assert!(model.trace().is_none());
    }

    #[tokio::test]
    async fn test_published_lists_are_not_mutated() {
        let (mut model, _events) = model(&["A", "B"], FakeBackend::default());
        let before = model.records();

        let now = Instant::now();
        model.publish_trace(
            ProfileTrace {
                start_time: 0,
                end_time: 10,
                deltas: vec![TraceDelta::new("B", 10)],
            },
            now,
        );
        model.pump(now + DELAY);

        assert_eq!(ids(&before), vec!["A", "B"]);
        assert!(before.iter().all(|r| r.profile.is_none()));
        assert_eq!(ids(&model.records()), vec!["B", "A"]);

        model.clear_trace(now + DELAY);
        model.pump(now + DELAY * 2);
        assert_eq!(ids(&model.records()), vec!["A", "B"]);
    }
}
