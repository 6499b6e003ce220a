//! # Profiling Session Lifecycle
//!
//! ```text
//!   request_start()          Started(Ok)           request_stop()         Stopped(Ok)
//! Idle ──────────────► Starting ──────────► Running ──────────────► Stopping ──────────► Idle
//!   ▲                     │ Started(Err)                               │ Stopped(Err)
//!   └─────────────────────┴────────────────────────────────────────────┘
//! ```
//!
//! The controller is a plain state machine. It never performs I/O: a legal
//! request returns a [`ProfilerRequest`] for the caller to execute, and the
//! result comes back through [`ProfileSessionController::on_completion`].
//! Requests that arrive in the wrong state are ignored, which is what makes
//! double clicks and re-entrant commands harmless.
//!
//! The session handle lives inside [`SessionState::Running`], so it exists
//! exactly while a session is running and moves into the stop request the
//! moment a stop is accepted.

use exthud_common::ProfileTrace;
use log::{debug, info, warn};

use crate::domain::ProfilingError;

/// Session state. `Running` owns the live session handle.
#[derive(Debug)]
pub enum SessionState<S> {
    Idle,
    Starting,
    Running(S),
    Stopping,
}

/// Handle-free view of [`SessionState`] for display and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Starting,
    Running,
    Stopping,
}

impl SessionPhase {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SessionPhase::Idle => "IDLE",
            SessionPhase::Starting => "STARTING",
            SessionPhase::Running => "PROFILING",
            SessionPhase::Stopping => "STOPPING",
        }
    }
}

/// Outgoing request to the profiling capability
#[derive(Debug)]
pub enum ProfilerRequest<S> {
    Start,
    Stop(S),
}

/// Result of an outgoing request, delivered back to the controller
#[derive(Debug)]
pub enum ProfilingCompletion<S> {
    Started(Result<S, ProfilingError>),
    Stopped(Result<ProfileTrace, ProfilingError>),
}

/// What a completion meant for the session
#[derive(Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Session is now running
    Started,
    /// Session ended with a trace to publish
    Stopped(ProfileTrace),
    /// The attempt failed; the session is idle again
    Failed(ProfilingError),
    /// Completion did not match the current state
    Ignored,
}

/// Four-state profiling session controller
#[derive(Debug)]
pub struct ProfileSessionController<S> {
    state: SessionState<S>,
}

impl<S> Default for ProfileSessionController<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ProfileSessionController<S> {
    #[must_use]
    pub fn new() -> Self {
        Self { state: SessionState::Idle }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Starting => SessionPhase::Starting,
            SessionState::Running(_) => SessionPhase::Running,
            SessionState::Stopping => SessionPhase::Stopping,
        }
    }

    /// Number of requests issued and not yet completed (0 or 1)
    #[must_use]
    pub fn outstanding(&self) -> usize {
        match self.state {
            SessionState::Starting | SessionState::Stopping => 1,
            SessionState::Idle | SessionState::Running(_) => 0,
        }
    }

    /// Begin a session. Only legal in `Idle`; ignored otherwise.
    pub fn request_start(&mut self) -> Option<ProfilerRequest<S>> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Starting;
                info!("profiling: start requested");
                Some(ProfilerRequest::Start)
            }
            SessionState::Starting | SessionState::Running(_) | SessionState::Stopping => {
                debug!("profiling: start ignored in {:?}", self.phase());
                None
            }
        }
    }

    /// End the running session. Only legal in `Running`; ignored otherwise.
    ///
    /// The handle leaves the controller here, so it can never be stopped twice.
    pub fn request_stop(&mut self) -> Option<ProfilerRequest<S>> {
        match std::mem::replace(&mut self.state, SessionState::Stopping) {
            SessionState::Running(handle) => {
                info!("profiling: stop requested");
                Some(ProfilerRequest::Stop(handle))
            }
            previous @ (SessionState::Idle | SessionState::Starting | SessionState::Stopping) => {
                self.state = previous;
                debug!("profiling: stop ignored in {:?}", self.phase());
                None
            }
        }
    }

    /// Start when idle, stop when running, ignore while a request is in flight
    pub fn toggle(&mut self) -> Option<ProfilerRequest<S>> {
        match self.phase() {
            SessionPhase::Idle => self.request_start(),
            SessionPhase::Running => self.request_stop(),
            SessionPhase::Starting | SessionPhase::Stopping => None,
        }
    }

    /// Apply the result of an outgoing request
    pub fn on_completion(&mut self, completion: ProfilingCompletion<S>) -> SessionEvent {
        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        let (next, event) = match (state, completion) {
            (SessionState::Starting, ProfilingCompletion::Started(Ok(handle))) => {
                info!("profiling: session running");
                (SessionState::Running(handle), SessionEvent::Started)
            }
            (SessionState::Starting, ProfilingCompletion::Started(Err(err))) => {
                (SessionState::Idle, SessionEvent::Failed(err))
            }
            (SessionState::Stopping, ProfilingCompletion::Stopped(Ok(trace))) => {
                info!("profiling: session stopped with {} deltas", trace.deltas.len());
                (SessionState::Idle, SessionEvent::Stopped(trace))
            }
            (SessionState::Stopping, ProfilingCompletion::Stopped(Err(err))) => {
                (SessionState::Idle, SessionEvent::Failed(err))
            }
            (
                state @ (SessionState::Idle | SessionState::Running(_) | SessionState::Stopping),
                ProfilingCompletion::Started(_),
            )
            | (
                state @ (SessionState::Idle | SessionState::Starting | SessionState::Running(_)),
                ProfilingCompletion::Stopped(_),
            ) => {
                warn!("profiling: unexpected completion, session state unchanged");
                (state, SessionEvent::Ignored)
            }
        };
        self.state = next;
        event
    }
}
