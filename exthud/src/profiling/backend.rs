//! Profiling capability contract
//!
//! A backend knows how to start a profiling session inside the extension
//! host; the session it returns knows how to stop and hand back a trace.
//! How the host captures the trace is the backend's business.

use std::future::Future;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use exthud_common::ProfileTrace;
use log::info;

use crate::domain::{ProfilingError, SnapshotError};
use crate::snapshot::load_trace;

/// Starts profiling sessions in an extension host
pub trait ProfilerBackend: Send + Sync + 'static {
    type Session: ProfilerSession;

    fn start_profiling(
        &self,
    ) -> impl Future<Output = Result<Self::Session, ProfilingError>> + Send;
}

/// A running profiling session
pub trait ProfilerSession: Send + 'static {
    fn stop(self) -> impl Future<Output = Result<ProfileTrace, ProfilingError>> + Send;
}

/// Backend that replays a previously recorded trace
///
/// Each session returns the recorded deltas re-based onto the moment the
/// session started, so traces from different sessions never share a start
/// time.
#[derive(Debug, Clone)]
pub struct ReplayProfiler {
    recorded: Option<ProfileTrace>,
}

impl ReplayProfiler {
    #[must_use]
    pub fn new(recorded: Option<ProfileTrace>) -> Self {
        Self { recorded }
    }

    /// Load the recorded trace from a JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let trace = load_trace(path)?;
        info!("replay profiler loaded {} deltas", trace.deltas.len());
        Ok(Self::new(Some(trace)))
    }

    #[must_use]
    pub fn has_recording(&self) -> bool {
        self.recorded.is_some()
    }
}

impl ProfilerBackend for ReplayProfiler {
    type Session = ReplaySession;

    async fn start_profiling(&self) -> Result<ReplaySession, ProfilingError> {
        let Some(recorded) = self.recorded.clone() else {
            return Err(ProfilingError::NoTraceAvailable);
        };
        Ok(ReplaySession { recorded, started_at: now_micros(), started: Instant::now() })
    }
}

/// Session handle issued by [`ReplayProfiler`]
#[derive(Debug)]
pub struct ReplaySession {
    recorded: ProfileTrace,
    started_at: u64,
    started: Instant,
}

impl ProfilerSession for ReplaySession {
    async fn stop(self) -> Result<ProfileTrace, ProfilingError> {
        info!("replay session stopped after {:.1}s", self.started.elapsed().as_secs_f64());
        Ok(self.recorded.rebased(self.started_at))
    }
}

/// Wall clock in microseconds since the Unix epoch
fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use exthud_common::TraceDelta;

    #[tokio::test]
    async fn test_replay_without_recording_fails_to_start() {
        let profiler = ReplayProfiler::new(None);
        let result = profiler.start_profiling().await;
        assert!(matches!(result, Err(ProfilingError::NoTraceAvailable)));
    }

    #[tokio::test]
    async fn test_replay_rebases_recording() {
        let recorded = ProfileTrace {
            start_time: 10,
            end_time: 40,
            deltas: vec![TraceDelta::new("a", 20), TraceDelta::new("idle", 10)],
        };
        let profiler = ReplayProfiler::new(Some(recorded.clone()));
        let session = profiler.start_profiling().await.unwrap();
        let trace = session.stop().await.unwrap();

        assert_eq!(trace.deltas, recorded.deltas);
        assert_eq!(trace.duration(), 30);
        assert!(trace.start_time > recorded.start_time);
        assert!(trace.is_consistent());
    }
}
