//! # Profiling Driver
//!
//! Executes [`ProfilerRequest`]s on the tokio runtime and delivers the
//! results back to the owning loop through a channel:
//!
//! ```text
//! owning loop                       tokio runtime
//! ───────────                       ─────────────
//! controller.request_start() ─► dispatch() ─► spawn(backend.start_profiling())
//!                                                     │
//! controller.on_completion() ◄── try_completion() ◄───┘ (crossbeam channel)
//! ```
//!
//! All session state stays on the owning loop. Spawned tasks only run the
//! backend future and send its result. A task that panics still reports
//! back (as [`ProfilingError::TaskLost`]) so the session can return to idle.

use std::future::Future;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error};
use tokio::runtime::Handle;

use super::backend::{ProfilerBackend, ProfilerSession};
use super::session::{ProfilerRequest, ProfilingCompletion};
use crate::domain::ProfilingError;

type Completion<B> = ProfilingCompletion<<B as ProfilerBackend>::Session>;

/// Runs profiling requests for one backend
pub struct ProfilingDriver<B: ProfilerBackend> {
    backend: Arc<B>,
    runtime: Handle,
    completion_tx: Sender<Completion<B>>,
    completion_rx: Receiver<Completion<B>>,
}

impl<B: ProfilerBackend> ProfilingDriver<B> {
    /// Create a driver that spawns onto `runtime`
    pub fn new(backend: B, runtime: Handle) -> Self {
        let (completion_tx, completion_rx) = unbounded();
        Self { backend: Arc::new(backend), runtime, completion_tx, completion_rx }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Execute a request in the background
    pub fn dispatch(&self, request: ProfilerRequest<B::Session>) {
        match request {
            ProfilerRequest::Start => {
                debug!("dispatching start request");
                let backend = Arc::clone(&self.backend);
                self.spawn_reporting(
                    async move { ProfilingCompletion::Started(backend.start_profiling().await) },
                    || ProfilingCompletion::Started(Err(ProfilingError::TaskLost)),
                );
            }
            ProfilerRequest::Stop(session) => {
                debug!("dispatching stop request");
                self.spawn_reporting(
                    async move { ProfilingCompletion::Stopped(session.stop().await) },
                    || ProfilingCompletion::Stopped(Err(ProfilingError::TaskLost)),
                );
            }
        }
    }

    /// Next finished request, if any (never blocks)
    #[must_use]
    pub fn try_completion(&self) -> Option<Completion<B>> {
        self.completion_rx.try_recv().ok()
    }

    fn spawn_reporting<F, L>(&self, work: F, lost: L)
    where
        F: Future<Output = Completion<B>> + Send + 'static,
        L: FnOnce() -> Completion<B> + Send + 'static,
    {
        let tx = self.completion_tx.clone();
        let task = self.runtime.spawn(work);
        self.runtime.spawn(async move {
            let completion = match task.await {
                Ok(completion) => completion,
                Err(err) => {
                    error!("profiling task failed: {err}");
                    lost()
                }
            };
            // Receiver gone means the owning loop has shut down
            let _ = tx.send(completion);
        });
    }
}
