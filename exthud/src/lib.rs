//! # exthud - Runtime Extensions Profiler
//!
//! exthud shows which extensions an extension host has activated, how long
//! each activation took, and, after a profiling session, how much of the
//! host's CPU time each extension occupied. The list is sorted by cost.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Extension Host                           │
//! │   descriptions · marketplace · statuses · profiling capability  │
//! └──────────────┬────────────────────────────────┬─────────────────┘
//!                │ snapshots + HostEvents         │ start / stop
//!                ▼                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      exthud (This Crate)                        │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │   Refresh    │──▶│   Resolver   │──▶│     TUI      │        │
//! │  │ (coalesced)  │   │ (3-way join) │   │  / headless  │        │
//! │  └──────────────┘   └──────────────┘   └──────────────┘        │
//! │         ▲                  ▲                                    │
//! │         │           ┌──────────────┐                            │
//! │         │           │  Segmenter   │                            │
//! │         │           └──────────────┘                            │
//! │         │                  ▲ trace                              │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │   Session    │──▶│    Driver    │   │    Export    │        │
//! │  │ (4 states)   │   │   (tokio)    │   │ (trace.json) │        │
//! │  └──────────────┘   └──────────────┘   └──────────────┘        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! ### Core Pipeline Modules
//!
//! - [`analysis`]: the record resolver (descriptions × marketplace × status ×
//!   trace) and the trace segmenter
//! - [`profiling`]: session state machine, backend contract, tokio driver,
//!   coalesced refresh trigger, headless display
//! - [`view_model`]: owns the inputs and publishes the record list
//! - [`host`]: extension host contract and the snapshot-file host
//!
//! ### UI and Data Modules
//!
//! - [`tui`]: live terminal list
//! - [`export`]: Chrome Trace Event Format export of a session
//! - [`snapshot`]: snapshot and trace files
//! - [`describe`]: human-readable summaries shared by all outputs
//! - [`cli`]: command-line arguments
//! - [`domain`]: time newtypes and error types
//!
//! ## Typical Usage
//!
//! ```bash
//! # Browse activation times
//! exthud snapshot.json
//!
//! # Replay a recorded trace when profiling, save it on exit
//! exthud snapshot.json --trace recorded.json --export profile.json
//! ```

pub mod analysis;
pub mod cli;
pub mod describe;
pub mod domain;
pub mod export;
pub mod host;
pub mod profiling;
pub mod snapshot;
pub mod tui;
pub mod view_model;
