//! # exthud - Main Entry Point
//!
//! Supports two operational modes:
//! - **Live TUI** (`exthud snapshot.json`): interactive list, `P` to profile
//! - **Headless** (`--headless [--profile-secs N]`): print the list and exit
//!
//! Profiling replays the trace given with `--trace`; without one, sessions
//! fail to start and the error is shown.

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::Receiver;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

use exthud::cli::Args;
use exthud::domain::{ExportError, Micros, SnapshotError};
use exthud::export::save_profile;
use exthud::host::{HostEvent, SnapshotHost};
use exthud::profiling::{
    display_records, display_session_phase, display_trace_summary, ProfilingDriver,
    ReplayProfiler, SessionPhase,
};
use exthud::tui;
use exthud::view_model::RuntimeExtensionsModel;

type Model = RuntimeExtensionsModel<SnapshotHost, ReplayProfiler>;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

/// Export target used by the TUI when `--export` is not given
const DEFAULT_EXPORT_PATH: &str = "exthud-profile.json";

const HEADLESS_TICK: Duration = Duration::from_millis(50);

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

/// Unreadable input files are usage errors; everything else is a plain failure
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.chain().any(|cause| cause.downcast_ref::<SnapshotError>().is_some()) {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let args = Args::parse();
    let quiet = args.quiet;

    let (host, host_events) = SnapshotHost::open(&args.snapshot)?;
    let backend = match args.trace {
        Some(ref path) => ReplayProfiler::from_file(path)?,
        None => ReplayProfiler::new(None),
    };
    if !backend.has_recording() {
        info!("no recorded trace given; profiling sessions will fail to start");
    }

    let driver = ProfilingDriver::new(backend, Handle::current());
    let model = RuntimeExtensionsModel::new(host, driver, Duration::from_millis(args.refresh_ms));

    if !quiet {
        eprintln!("exthud v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("snapshot: {}", args.snapshot.display());
    }

    let model = if args.headless {
        run_headless(model, &host_events, args.profile_secs, quiet).await?
    } else {
        // The TUI blocks on terminal input; keep it off the runtime workers
        let export_path = args.export.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH));
        let handle = tokio::task::spawn_blocking(move || {
            let mut model = model;
            tui::run_live(&mut model, &host_events, &export_path).map(|()| model)
        });
        handle.await.context("TUI thread panicked")??
    };

    if let Some(ref path) = args.export {
        export_on_exit(&model, path, quiet)?;
    }

    Ok(())
}

/// Optionally profile for `profile_secs`, then print the list once
async fn run_headless(
    mut model: Model,
    host_events: &Receiver<HostEvent>,
    profile_secs: u64,
    quiet: bool,
) -> Result<Model> {
    if profile_secs > 0 {
        profile_for(&mut model, host_events, Duration::from_secs(profile_secs), quiet).await?;
    }

    // Flush anything still waiting on the coalescing window
    model.drain_host_events(host_events, Instant::now());
    let records = model.resolve();
    let segmented = model.segmented_trace();

    display_records(&records, segmented.as_ref().map(|s| s.duration()));
    if let Some(segmented) = segmented {
        display_trace_summary(segmented.duration(), segmented.extension_time());
    }
    Ok(model)
}

/// Run one profiling session of roughly `duration`. Ctrl+C stops it early.
async fn profile_for(
    model: &mut Model,
    host_events: &Receiver<HostEvent>,
    duration: Duration,
    quiet: bool,
) -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    model.request_start();
    let mut phase = model.session_phase();
    if !quiet {
        display_session_phase(phase);
    }

    let mut stop_at = Instant::now() + duration;
    let mut interrupted = false;
    loop {
        let now = Instant::now();
        model.drain_host_events(host_events, now);
        model.pump(now);

        let current = model.session_phase();
        if current != phase {
            phase = current;
            if !quiet {
                display_session_phase(phase);
            }
        }
        match phase {
            SessionPhase::Running if now >= stop_at => model.request_stop(),
            SessionPhase::Idle => break,
            SessionPhase::Running | SessionPhase::Starting | SessionPhase::Stopping => {}
        }

        tokio::select! {
            () = tokio::time::sleep(HEADLESS_TICK) => {}
            result = &mut ctrl_c, if !interrupted => {
                result.context("Failed to listen for Ctrl+C")?;
                interrupted = true;
                stop_at = Instant::now();
            }
        }
    }

    if let Some(err) = model.last_error() {
        return Err(err.clone()).context("Profiling session failed");
    }
    if let Some(trace) = model.trace() {
        info!(
            "profiled {} across {} deltas",
            Micros(trace.duration()),
            trace.deltas.len()
        );
    }
    Ok(())
}

fn export_on_exit(model: &Model, path: &Path, quiet: bool) -> Result<()> {
    match save_profile(path, model.trace().as_deref(), &model.records()) {
        Ok(()) => {
            if !quiet {
                println!("saved: {}", path.display());
            }
            Ok(())
        }
        Err(ExportError::NoProfile) => {
            warn!("--export given but no profiling session completed; nothing saved");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to export profile to {}", path.display())),
    }
}
