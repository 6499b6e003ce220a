//! Snapshot files for offline and replay use
//!
//! A snapshot captures everything an extension host reports about its
//! extensions at one moment:
//!
//! ```json
//! {
//!   "descriptions": [{ "identifier": "pub.ext", "version": "1.0.0", "hasEntryPoint": true }],
//!   "marketplace":  [{ "identifier": "pub.ext", "displayName": "Ext", "installSource": "user" }],
//!   "statuses":     { "pub.ext": { "activation": { "trigger": "*", "startup": true,
//!                                                  "codeLoadingTime": 3, "activateCallTime": 9 } } }
//! }
//! ```
//!
//! Trace files hold a single [`ProfileTrace`].

use std::path::Path;

use exthud_common::{ExtensionDescription, MarketplaceInfo, ProfileTrace};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::analysis::StatusMap;
use crate::domain::SnapshotError;

/// Everything a host reports, as written to disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionSnapshot {
    #[serde(default)]
    pub descriptions: Vec<ExtensionDescription>,
    #[serde(default)]
    pub marketplace: Vec<MarketplaceInfo>,
    #[serde(default)]
    pub statuses: StatusMap,
}

impl ExtensionSnapshot {
    /// Parse a snapshot file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid snapshot
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let content = read(path.as_ref())?;
        serde_json::from_str(&content).map_err(|error| SnapshotError::ParseFailed {
            path: path.as_ref().display().to_string(),
            error,
        })
    }
}

/// Parse a trace file
///
/// Traces whose deltas do not add up to their duration are accepted with a
/// warning; segment boundaries will drift.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a valid trace
pub fn load_trace(path: impl AsRef<Path>) -> Result<ProfileTrace, SnapshotError> {
    let path = path.as_ref();
    let content = read(path)?;
    let trace: ProfileTrace = serde_json::from_str(&content).map_err(|error| {
        SnapshotError::ParseFailed { path: path.display().to_string(), error }
    })?;

    if !trace.is_consistent() {
        warn!(
            "trace {} deltas sum to {}us but it spans {}us",
            path.display(),
            trace.delta_sum(),
            trace.duration()
        );
    }
    Ok(trace)
}

fn read(path: &Path) -> Result<String, SnapshotError> {
    std::fs::read_to_string(path)
        .map_err(|error| SnapshotError::ReadFailed { path: path.display().to_string(), error })
}
