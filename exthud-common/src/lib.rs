//! # Shared Data Structures (Extension Host ↔ Viewer)
//!
//! Defines the snapshot types exchanged between an extension host and the
//! runtime extensions viewer. The host produces them; `exthud` only reads
//! them. With the `serde` feature every type (de)serializes with camelCase
//! field names so snapshots can be written by any host.
//!
//! ## Key Types
//!
//! - [`ExtensionId`] - Case-insensitive extension identifier
//! - [`ExtensionDescription`] - Static description of an installed extension
//! - [`MarketplaceInfo`] - Gallery metadata (display name, icon, install source)
//! - [`ExtensionStatus`] - Live activation outcome and diagnostic messages
//! - [`ProfileTrace`] - Flat time-delta partition of a profiling window
//!
//! ## Time Units
//!
//! Activation durations are milliseconds. Trace timestamps and deltas are
//! microseconds.

use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Trace Label Sentinels
// ============================================================================

/// Trace label for time the host spent waiting for work
pub const IDLE_LABEL: &str = "idle";

/// Trace label for time spent in the host itself (not attributable to an extension)
pub const SELF_LABEL: &str = "self";

/// Returns true if `label` is a non-extension trace label
#[must_use]
pub fn is_sentinel_label(label: &str) -> bool {
    label == IDLE_LABEL || label == SELF_LABEL
}

// ============================================================================
// Extension Identity
// ============================================================================

/// Extension identifier (`publisher.name`)
///
/// Comparison and hashing ignore ASCII case, matching how hosts treat
/// identifiers. The original spelling is kept for display.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub struct ExtensionId(String);

impl ExtensionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Original spelling
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized lookup key
    #[must_use]
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Returns true if this identifier names the given trace label
    #[must_use]
    pub fn matches_label(&self, label: &str) -> bool {
        self.0.eq_ignore_ascii_case(label)
    }
}

impl PartialEq for ExtensionId {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for ExtensionId {}

impl Hash for ExtensionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ExtensionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ExtensionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<ExtensionId> for String {
    fn from(id: ExtensionId) -> Self {
        id.0
    }
}

// ============================================================================
// Static Descriptions
// ============================================================================

/// Static description of an installed extension
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ExtensionDescription {
    pub identifier: ExtensionId,
    pub display_name: Option<String>,
    pub version: String,
    /// Whether the manifest declares an entry point (`main`/`browser`)
    #[cfg_attr(feature = "serde", serde(default))]
    pub has_entry_point: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub repository_url: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_builtin: bool,
}

impl ExtensionDescription {
    /// Display name, falling back to the identifier
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or_else(|| self.identifier.as_str())
    }
}

/// Where an installed extension came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum InstallSource {
    /// Shipped with the host
    BuiltIn,
    /// Installed by the user
    #[default]
    User,
}

/// Marketplace metadata for an extension
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MarketplaceInfo {
    pub identifier: ExtensionId,
    pub display_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub icon_url: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub icon_url_fallback: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub install_source: InstallSource,
}

// ============================================================================
// Live Status
// ============================================================================

/// What caused an extension to activate
///
/// Parsed from the host's activation event string. Parsing never fails:
/// unknown events become [`ActivationTrigger::Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum ActivationTrigger {
    /// `*`
    Startup,
    /// `onStartupFinished`
    StartupFinished,
    /// `workspaceContains:<glob>`
    WorkspaceContains(String),
    /// `workspaceContainsTimeout:<glob>` (the search took too long)
    WorkspaceContainsTimeout(String),
    /// `onLanguage:<id>`
    OnLanguage(String),
    /// Any other activation event, verbatim
    Event(String),
}

impl ActivationTrigger {
    #[must_use]
    pub fn parse(event: &str) -> Self {
        if event == "*" {
            return Self::Startup;
        }
        if event == "onStartupFinished" {
            return Self::StartupFinished;
        }
        if let Some(glob) = event.strip_prefix("workspaceContainsTimeout:") {
            return Self::WorkspaceContainsTimeout(glob.to_string());
        }
        if let Some(glob) = event.strip_prefix("workspaceContains:") {
            return Self::WorkspaceContains(glob.to_string());
        }
        if let Some(language) = event.strip_prefix("onLanguage:") {
            return Self::OnLanguage(language.to_string());
        }
        Self::Event(event.to_string())
    }
}

impl fmt::Display for ActivationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => f.write_str("*"),
            Self::StartupFinished => f.write_str("onStartupFinished"),
            Self::WorkspaceContains(glob) => write!(f, "workspaceContains:{glob}"),
            Self::WorkspaceContainsTimeout(glob) => write!(f, "workspaceContainsTimeout:{glob}"),
            Self::OnLanguage(language) => write!(f, "onLanguage:{language}"),
            Self::Event(event) => f.write_str(event),
        }
    }
}

impl From<String> for ActivationTrigger {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ActivationTrigger> for String {
    fn from(trigger: ActivationTrigger) -> Self {
        trigger.to_string()
    }
}

/// Activation timings reported by the host (milliseconds)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ActivationTimes {
    pub trigger: ActivationTrigger,
    /// Activated while the host process was starting up
    pub startup: bool,
    pub code_loading_time: u64,
    pub activate_call_time: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub activate_resolved_time: u64,
    /// Extension whose activation caused this one, if not the extension itself
    #[cfg_attr(feature = "serde", serde(default))]
    pub activated_by: Option<ExtensionId>,
}

impl ActivationTimes {
    /// Time from starting to load code until `activate()` returned
    #[must_use]
    pub fn activation_time(&self) -> u64 {
        self.code_loading_time.saturating_add(self.activate_call_time)
    }
}

/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Diagnostic message attached to an extension's status
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusMessage {
    pub severity: Severity,
    pub message: String,
}

/// Live status of one extension
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ExtensionStatus {
    /// `None` if the extension never activated
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation: Option<ActivationTimes>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub messages: Vec<StatusMessage>,
}

// ============================================================================
// Profile Trace
// ============================================================================

/// One labeled slice of a profiling window
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceDelta {
    /// Extension identifier, or one of the sentinel labels
    pub label: String,
    /// Duration in microseconds
    pub delta: u64,
}

impl TraceDelta {
    pub fn new(label: impl Into<String>, delta: u64) -> Self {
        Self { label: label.into(), delta }
    }
}

/// Flat profiling trace: a running partition of `[start_time, end_time)`
///
/// Hosts guarantee that the deltas sum to `end_time - start_time`. Nothing
/// in this crate enforces it; [`ProfileTrace::is_consistent`] lets callers
/// check.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ProfileTrace {
    pub start_time: u64,
    pub end_time: u64,
    pub deltas: Vec<TraceDelta>,
}

impl ProfileTrace {
    #[must_use]
    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    #[must_use]
    pub fn delta_sum(&self) -> u64 {
        self.deltas.iter().fold(0u64, |acc, d| acc.saturating_add(d.delta))
    }

    /// Deltas sum exactly to the trace duration
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.end_time >= self.start_time && self.delta_sum() == self.duration()
    }

    /// Same deltas, shifted so the trace begins at `start_time`
    #[must_use]
    pub fn rebased(&self, start_time: u64) -> Self {
        Self {
            start_time,
            end_time: start_time.saturating_add(self.duration()),
            deltas: self.deltas.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_extension_id_ignores_case() {
        let a = ExtensionId::new("Publisher.Ext");
        let b = ExtensionId::new("publisher.ext");
        assert_eq!(a, b);
        assert_eq!(a.key(), "publisher.ext");
        assert_eq!(a.to_string(), "Publisher.Ext");

        let mut map = HashMap::new();
        map.insert(a, 1);
        assert_eq!(map.get(&b), Some(&1));
    }

    #[test]
    fn test_activation_trigger_parse() {
        assert_eq!(ActivationTrigger::parse("*"), ActivationTrigger::Startup);
        assert_eq!(
            ActivationTrigger::parse("onStartupFinished"),
            ActivationTrigger::StartupFinished
        );
        assert_eq!(
            ActivationTrigger::parse("workspaceContains:**/Cargo.toml"),
            ActivationTrigger::WorkspaceContains("**/Cargo.toml".to_string())
        );
        assert_eq!(
            ActivationTrigger::parse("workspaceContainsTimeout:**/*.py"),
            ActivationTrigger::WorkspaceContainsTimeout("**/*.py".to_string())
        );
        assert_eq!(
            ActivationTrigger::parse("onLanguage:rust"),
            ActivationTrigger::OnLanguage("rust".to_string())
        );
        assert_eq!(
            ActivationTrigger::parse("onCommand:foo.bar"),
            ActivationTrigger::Event("onCommand:foo.bar".to_string())
        );
    }

    #[test]
    fn test_activation_trigger_display_restores_event() {
        for event in ["*", "onStartupFinished", "workspaceContains:a/b", "onLanguage:go", "onView:x"] {
            assert_eq!(ActivationTrigger::parse(event).to_string(), event);
        }
    }

    #[test]
    fn test_trace_consistency() {
        let trace = ProfileTrace {
            start_time: 1000,
            end_time: 2000,
            deltas: vec![TraceDelta::new("a", 500), TraceDelta::new(IDLE_LABEL, 500)],
        };
        assert!(trace.is_consistent());
        assert_eq!(trace.duration(), 1000);

        let short = ProfileTrace { end_time: 2500, ..trace.clone() };
        assert!(!short.is_consistent());
    }

    #[test]
    fn test_trace_rebased_keeps_duration() {
        let trace = ProfileTrace {
            start_time: 1000,
            end_time: 1300,
            deltas: vec![TraceDelta::new("a", 300)],
        };
        let moved = trace.rebased(50);
        assert_eq!(moved.start_time, 50);
        assert_eq!(moved.end_time, 350);
        assert!(moved.is_consistent());
    }

    #[test]
    fn test_sentinel_labels() {
        assert!(is_sentinel_label(IDLE_LABEL));
        assert!(is_sentinel_label(SELF_LABEL));
        assert!(!is_sentinel_label("pub.ext"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_status_deserializes_from_host_json() {
        let json = r#"{
            "activation": {
                "trigger": "onLanguage:rust",
                "startup": false,
                "codeLoadingTime": 12,
                "activateCallTime": 30
            },
            "messages": [{ "severity": "warning", "message": "deprecated API" }]
        }"#;
        let status: ExtensionStatus = serde_json::from_str(json).unwrap();
        let activation = status.activation.unwrap();
        assert_eq!(activation.trigger, ActivationTrigger::OnLanguage("rust".to_string()));
        assert_eq!(activation.activation_time(), 42);
        assert_eq!(activation.activate_resolved_time, 0);
        assert_eq!(status.messages[0].severity, Severity::Warning);
    }
}
