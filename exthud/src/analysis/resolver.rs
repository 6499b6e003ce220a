//! Record resolution: the three-way join behind the runtime extensions list.
//!
//! Inputs arrive from independent sources and change independently:
//!
//! ```text
//! descriptions (once) ──┐
//! marketplace index ────┼──► resolve() ──► Vec<RuntimeExtensionRecord> (sorted)
//! status map ───────────┤
//! segmented trace? ─────┘
//! ```
//!
//! # Null handling
//!
//! - No status, or a status without activation times → no row.
//! - No marketplace entry → `marketplace: None`. Renderers show blanks.
//! - No trace → `profile: None` for every row.
//! - Trace present but extension absent from it → empty segments, zero total.
//!
//! # Ordering
//!
//! Without a trace the rows keep description order. With a trace they are
//! ordered by total profile time (descending) with `original_index` as the
//! tie-break, so the result never depends on sort stability or on hash map
//! iteration order.

use std::cmp::Ordering;
use std::collections::HashMap;

use exthud_common::{
    ActivationTimes, ExtensionDescription, ExtensionId, ExtensionStatus, MarketplaceInfo,
    StatusMessage,
};
use log::debug;

use super::segmenter::{ProfileSegments, SegmentedTrace};
use crate::domain::Micros;

/// Live statuses keyed by extension identifier
pub type StatusMap = HashMap<ExtensionId, ExtensionStatus>;

/// Marketplace metadata keyed by extension identifier
///
/// A missing entry means "not loaded yet" and is never an error.
#[derive(Debug, Clone, Default)]
pub struct MarketplaceIndex {
    by_id: HashMap<ExtensionId, MarketplaceInfo>,
}

impl MarketplaceIndex {
    /// Index records by identifier. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = MarketplaceInfo>) -> Self {
        let by_id = records.into_iter().map(|info| (info.identifier.clone(), info)).collect();
        Self { by_id }
    }

    #[must_use]
    pub fn get(&self, id: &ExtensionId) -> Option<&MarketplaceInfo> {
        self.by_id.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// One row of the runtime extensions list
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeExtensionRecord {
    /// Position among activated extensions before sorting (tie-break only)
    pub original_index: usize,
    pub description: ExtensionDescription,
    pub marketplace: Option<MarketplaceInfo>,
    pub activation: ActivationTimes,
    pub messages: Vec<StatusMessage>,
    /// `None` when no trace is active
    pub profile: Option<ProfileSegments>,
}

impl RuntimeExtensionRecord {
    #[must_use]
    pub fn id(&self) -> &ExtensionId {
        &self.description.identifier
    }

    /// Marketplace display name, then manifest display name, then identifier
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.marketplace
            .as_ref()
            .map(|m| m.display_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.description.label())
    }

    /// Profile total, zero when no trace is active
    #[must_use]
    pub fn profile_time(&self) -> Micros {
        self.profile.as_ref().map_or(Micros(0), |p| p.total_time)
    }
}

/// Join descriptions with statuses, marketplace info and an optional trace.
///
/// Output length never exceeds `descriptions.len()`, and every record has an
/// activated status.
#[must_use]
pub fn resolve(
    descriptions: &[ExtensionDescription],
    marketplace: &MarketplaceIndex,
    statuses: &StatusMap,
    trace: Option<&SegmentedTrace>,
) -> Vec<RuntimeExtensionRecord> {
    let mut records: Vec<RuntimeExtensionRecord> = descriptions
        .iter()
        .filter_map(|description| {
            let status = statuses.get(&description.identifier)?;
            let activation = status.activation.clone()?;
            Some((description, activation, status.messages.clone()))
        })
        .enumerate()
        .map(|(original_index, (description, activation, messages))| RuntimeExtensionRecord {
            original_index,
            description: description.clone(),
            marketplace: marketplace.get(&description.identifier).cloned(),
            activation,
            messages,
            profile: trace.map(|t| t.segments_for(&description.identifier)),
        })
        .collect();

    if trace.is_some() {
        sort_by_profile_time(&mut records);
    }

    debug!(
        "resolved {} of {} extensions (profiled: {})",
        records.len(),
        descriptions.len(),
        trace.is_some()
    );
    records
}

/// Total order used when a trace is active
#[must_use]
pub fn compare_by_profile_time(a: &RuntimeExtensionRecord, b: &RuntimeExtensionRecord) -> Ordering {
    b.profile_time()
        .cmp(&a.profile_time())
        .then_with(|| a.original_index.cmp(&b.original_index))
}

/// Sort records by descending profile time, then ascending original index
pub fn sort_by_profile_time(records: &mut [RuntimeExtensionRecord]) {
    records.sort_unstable_by(compare_by_profile_time);
}

#[cfg(test)]
mod tests {
    use super::*;
    use exthud_common::{ActivationTrigger, InstallSource, ProfileTrace, TraceDelta, IDLE_LABEL};

    fn description(id: &str) -> ExtensionDescription {
        ExtensionDescription {
            identifier: ExtensionId::new(id),
            display_name: None,
            version: "1.0.0".to_string(),
            has_entry_point: true,
            repository_url: None,
            is_builtin: false,
        }
    }

    fn activated() -> ExtensionStatus {
        ExtensionStatus {
            activation: Some(ActivationTimes {
                trigger: ActivationTrigger::Startup,
                startup: true,
                code_loading_time: 5,
                activate_call_time: 10,
                activate_resolved_time: 0,
                activated_by: None,
            }),
            messages: Vec::new(),
        }
    }

    fn statuses(ids: &[&str]) -> StatusMap {
        ids.iter().map(|id| (ExtensionId::new(*id), activated())).collect()
    }

    fn segmented(deltas: &[(&str, u64)]) -> SegmentedTrace {
        let deltas: Vec<TraceDelta> = deltas.iter().map(|(l, d)| TraceDelta::new(*l, *d)).collect();
        let sum: u64 = deltas.iter().map(|d| d.delta).sum();
        SegmentedTrace::from_trace(&ProfileTrace { start_time: 1000, end_time: 1000 + sum, deltas })
    }

    fn ids(records: &[RuntimeExtensionRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id().as_str()).collect()
    }

    #[test]
    fn test_extensions_without_status_are_dropped() {
        let descriptions = vec![description("A"), description("B"), description("C")];
        let records =
            resolve(&descriptions, &MarketplaceIndex::default(), &statuses(&["A", "C"]), None);

        assert_eq!(ids(&records), vec!["A", "C"]);
        assert_eq!(records[0].original_index, 0);
        assert_eq!(records[1].original_index, 1);
        assert!(records.iter().all(|r| r.profile.is_none()));
    }

    #[test]
    fn test_status_without_activation_is_dropped() {
        let descriptions = vec![description("A"), description("B")];
        let mut map = statuses(&["A"]);
        map.insert(ExtensionId::new("B"), ExtensionStatus::default());

        let records = resolve(&descriptions, &MarketplaceIndex::default(), &map, None);
        assert_eq!(ids(&records), vec!["A"]);
    }

    #[test]
    fn test_trace_orders_by_total_time() {
        let descriptions = vec![description("B"), description("A")];
        let trace = segmented(&[("A", 500), ("B", 300), ("A", 200)]);
        let records = resolve(
            &descriptions,
            &MarketplaceIndex::default(),
            &statuses(&["A", "B"]),
            Some(&trace),
        );

        assert_eq!(ids(&records), vec!["A", "B"]);
        assert_eq!(records[0].profile_time(), Micros(700));
        assert_eq!(records[0].original_index, 1);
        assert_eq!(records[1].profile_time(), Micros(300));
    }

    #[test]
    fn test_ties_break_on_original_index() {
        let descriptions = vec![description("C"), description("B"), description("A")];
        // Nobody ran: every total is zero
        let trace = segmented(&[(IDLE_LABEL, 100)]);
        let records = resolve(
            &descriptions,
            &MarketplaceIndex::default(),
            &statuses(&["A", "B", "C"]),
            Some(&trace),
        );

        assert_eq!(ids(&records), vec!["C", "B", "A"]);
        assert!(records.iter().all(|r| r.profile.as_ref().is_some_and(|p| p.segments.is_empty())));
    }

    #[test]
    fn test_sort_is_total_and_idempotent() {
        let descriptions: Vec<_> = ["a", "b", "c", "d", "e"].iter().map(|id| description(id)).collect();
        let trace = segmented(&[("c", 5), ("a", 9), ("e", 5), ("b", 9), (IDLE_LABEL, 1)]);
        let mut records = resolve(
            &descriptions,
            &MarketplaceIndex::default(),
            &statuses(&["a", "b", "c", "d", "e"]),
            Some(&trace),
        );

        assert_eq!(ids(&records), vec!["a", "b", "c", "e", "d"]);
        for pair in records.windows(2) {
            assert_eq!(compare_by_profile_time(&pair[0], &pair[1]), Ordering::Less);
        }

        let before = records.clone();
        sort_by_profile_time(&mut records);
        assert_eq!(records, before);

        records.reverse();
        sort_by_profile_time(&mut records);
        assert_eq!(records, before);
    }

    #[test]
    fn test_order_ignores_map_insertion_order() {
        let descriptions: Vec<_> = (0..20).map(|i| description(&format!("ext.{i}"))).collect();
        let forward: StatusMap =
            (0..20).map(|i| (ExtensionId::new(format!("ext.{i}")), activated())).collect();
        let backward: StatusMap =
            (0..20).rev().map(|i| (ExtensionId::new(format!("ext.{i}")), activated())).collect();

        let a = resolve(&descriptions, &MarketplaceIndex::default(), &forward, None);
        let b = resolve(&descriptions, &MarketplaceIndex::default(), &backward, None);

        assert_eq!(a, b);
        let expected: Vec<String> = (0..20).map(|i| format!("ext.{i}")).collect();
        assert_eq!(ids(&a), expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_marketplace_attached_when_present() {
        let descriptions = vec![description("A"), description("B")];
        let marketplace = MarketplaceIndex::from_records([MarketplaceInfo {
            identifier: ExtensionId::new("a"),
            display_name: "Extension A".to_string(),
            icon_url: Some("https://example.invalid/a.png".to_string()),
            icon_url_fallback: None,
            install_source: InstallSource::User,
        }]);

        let records = resolve(&descriptions, &marketplace, &statuses(&["A", "B"]), None);
        assert_eq!(records[0].display_name(), "Extension A");
        assert!(records[1].marketplace.is_none());
        assert_eq!(records[1].display_name(), "B");
    }

    #[test]
    fn test_output_bounded_by_descriptions() {
        let descriptions = vec![description("A")];
        let records = resolve(
            &descriptions,
            &MarketplaceIndex::default(),
            &statuses(&["A", "B", "C"]),
            None,
        );
        assert_eq!(records.len(), 1);
    }
}
