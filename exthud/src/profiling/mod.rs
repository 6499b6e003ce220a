//! Profiling core modules
//!
//! - Session lifecycle state machine
//! - Backend contract and the replay backend
//! - Driver that runs backend calls on tokio
//! - Coalesced refresh trigger
//! - Headless display

pub mod backend;
pub mod driver;
pub mod event_display;
pub mod refresh;
pub mod session;

// Re-export common types
pub use backend::{ProfilerBackend, ProfilerSession, ReplayProfiler, ReplaySession};
pub use driver::ProfilingDriver;
pub use event_display::{display_records, display_session_phase, display_trace_summary};
pub use refresh::{CoalescedRefresh, DEFAULT_REFRESH_DELAY};
pub use session::{
    ProfileSessionController, ProfilerRequest, ProfilingCompletion, SessionEvent, SessionPhase,
    SessionState,
};
