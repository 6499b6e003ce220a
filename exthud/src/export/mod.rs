//! Profile export functionality
//!
//! This module saves a profiling session for offline analysis. Traces are
//! written in Chrome Trace Event Format for visualization in Perfetto or
//! chrome://tracing, with the raw trace and per-extension totals attached.

pub mod chrome_trace;

pub use chrome_trace::ProfileExporter;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use exthud_common::ProfileTrace;
use log::info;

use crate::analysis::RuntimeExtensionRecord;
use crate::domain::ExportError;

/// Write `trace` to `path` as a Chrome trace
///
/// # Errors
/// Returns [`ExportError::NoProfile`] when there is no trace, or an error if
/// the file cannot be written
pub fn save_profile(
    path: &Path,
    trace: Option<&ProfileTrace>,
    records: &[RuntimeExtensionRecord],
) -> Result<(), ExportError> {
    let trace = trace.ok_or(ExportError::NoProfile)?;
    let writer = BufWriter::new(File::create(path)?);
    ProfileExporter::new(trace, records).export(writer)?;
    info!("saved profile to {}", path.display());
    Ok(())
}
