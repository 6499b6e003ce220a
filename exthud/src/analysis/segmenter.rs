//! Trace segmentation: flat time deltas → per-extension occupied time.
//!
//! A [`ProfileTrace`] is a running partition of the profiling window: each
//! delta says "the next N microseconds belonged to this label". Walking the
//! deltas with a cursor turns that into absolute intervals per label.
//!
//! ```text
//! start=1000  [(A,500) (B,300) (A,200)]
//!
//!   1000      1500     1800   2000
//!    |---A-----|---B----|--A---|
//!
//! A → [1000,1500) [1800,2000)   total 700
//! B → [1500,1800)               total 300
//! ```
//!
//! # Malformed traces
//!
//! Deltas that do not sum to `end_time - start_time` are not rejected. The
//! last interval simply ends wherever the cursor lands. Cursor arithmetic
//! saturates so no input can panic.

use std::collections::HashMap;

use exthud_common::{is_sentinel_label, ExtensionId, ProfileTrace};

use crate::domain::Micros;

/// One contiguous interval `[start, end)` in trace time (microseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: u64,
    pub end: u64,
}

impl Segment {
    #[must_use]
    pub fn len(self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Every interval one label occupied, plus the total
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileSegments {
    /// Ordered by start, non-overlapping
    pub segments: Vec<Segment>,
    pub total_time: Micros,
}

impl ProfileSegments {
    fn from_segments(segments: Vec<Segment>) -> Self {
        // Summed from the intervals, not from the deltas
        let total = segments.iter().fold(0u64, |acc, s| acc.saturating_add(s.len()));
        Self { segments, total_time: Micros(total) }
    }
}

/// Segmenter output for a whole trace
#[derive(Debug, Clone, Default)]
pub struct SegmentedTrace {
    by_label: HashMap<String, ProfileSegments>,
    duration: Micros,
}

impl SegmentedTrace {
    /// Segment a trace
    #[must_use]
    pub fn from_trace(trace: &ProfileTrace) -> Self {
        let mut intervals: HashMap<String, Vec<Segment>> = HashMap::new();
        let mut cursor = trace.start_time;

        for delta in &trace.deltas {
            let end = cursor.saturating_add(delta.delta);
            intervals
                .entry(normalize_label(&delta.label))
                .or_default()
                .push(Segment { start: cursor, end });
            cursor = end;
        }

        let by_label = intervals
            .into_iter()
            .map(|(label, segments)| (label, ProfileSegments::from_segments(segments)))
            .collect();

        Self { by_label, duration: Micros(trace.duration()) }
    }

    /// Segments for an extension (empty if it never ran during the trace)
    #[must_use]
    pub fn segments_for(&self, id: &ExtensionId) -> ProfileSegments {
        self.by_label.get(&id.key()).cloned().unwrap_or_default()
    }

    /// Segments for a raw trace label, including the sentinels
    #[must_use]
    pub fn segments_for_label(&self, label: &str) -> Option<&ProfileSegments> {
        self.by_label.get(&normalize_label(label))
    }

    /// Total time for a raw trace label (zero if absent)
    #[must_use]
    pub fn total_time(&self, label: &str) -> Micros {
        self.segments_for_label(label).map_or(Micros(0), |s| s.total_time)
    }

    /// Labels that appear in the trace
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.by_label.keys().map(String::as_str)
    }

    /// Nominal trace duration (`end_time - start_time`)
    #[must_use]
    pub fn duration(&self) -> Micros {
        self.duration
    }

    /// Sum of every interval across all labels
    #[must_use]
    pub fn occupied_time(&self) -> Micros {
        Micros(self.by_label.values().map(|s| s.total_time.0).sum())
    }

    /// Sum of intervals attributed to extensions (sentinels excluded)
    #[must_use]
    pub fn extension_time(&self) -> Micros {
        Micros(
            self.by_label
                .iter()
                .filter(|(label, _)| !is_sentinel_label(label))
                .map(|(_, s)| s.total_time.0)
                .sum(),
        )
    }
}

/// Trace labels are extension identifiers, which compare without case
fn normalize_label(label: &str) -> String {
    label.to_ascii_lowercase()
}
