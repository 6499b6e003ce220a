//! Chrome Trace Event Format export of a profiling session
//!
//! Each extension gets its own track (`tid`), and every segment becomes a
//! complete (`"X"`) event. Sentinel time (`idle`, `self`) is exported on
//! tracks of its own so the timeline shows the whole window.

use std::collections::HashMap;
use std::io::Write;

use exthud_common::{is_sentinel_label, ProfileTrace};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::analysis::{RuntimeExtensionRecord, SegmentedTrace};
use crate::domain::ExportError;

/// Chrome Trace Event
/// Spec: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU/preview
#[derive(Debug, Clone, Serialize)]
struct ChromeTraceEvent {
    /// Extension display name or sentinel label
    name: String,
    /// "extension" or "host"
    cat: &'static str,
    /// "X" = complete, "M" = metadata
    ph: &'static str,
    /// Microseconds since the trace started
    ts: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    dur: Option<u64>,
    pid: u32,
    tid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<HashMap<String, JsonValue>>,
}

/// Per-extension totals carried alongside the timeline
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtensionSummary {
    id: String,
    name: String,
    total_time: u64,
    segments: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OtherData<'a> {
    trace: &'a ProfileTrace,
    extensions: Vec<ExtensionSummary>,
}

/// Chrome Trace Format container
#[derive(Debug, Serialize)]
struct ChromeTrace<'a> {
    #[serde(rename = "traceEvents")]
    trace_events: Vec<ChromeTraceEvent>,
    #[serde(rename = "displayTimeUnit")]
    display_time_unit: &'static str,
    #[serde(rename = "otherData")]
    other_data: OtherData<'a>,
}

const PROCESS_ID: u32 = 1;

/// Writes a profiling session as a Chrome trace
pub struct ProfileExporter<'a> {
    trace: &'a ProfileTrace,
    records: &'a [RuntimeExtensionRecord],
}

impl<'a> ProfileExporter<'a> {
    /// `records` supplies display names and the order of the tracks
    #[must_use]
    pub fn new(trace: &'a ProfileTrace, records: &'a [RuntimeExtensionRecord]) -> Self {
        Self { trace, records }
    }

    /// Serialize to `writer`
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails
    pub fn export(&self, mut writer: impl Write) -> Result<(), ExportError> {
        let segmented = SegmentedTrace::from_trace(self.trace);
        let start = self.trace.start_time;
        let mut events = Vec::new();

        // One track per extension row, then one per remaining label
        let mut tracks: Vec<(String, String)> = self
            .records
            .iter()
            .map(|r| (r.id().key(), r.display_name().to_string()))
            .collect();
        let mut extra: Vec<String> = segmented
            .labels()
            .filter(|label| !tracks.iter().any(|(key, _)| key == label))
            .map(str::to_string)
            .collect();
        extra.sort();
        tracks.extend(extra.into_iter().map(|label| (label.clone(), label)));

        for (index, (label, name)) in tracks.iter().enumerate() {
            let tid = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let cat = if is_sentinel_label(label) { "host" } else { "extension" };

            let mut meta = HashMap::new();
            meta.insert("name".to_string(), JsonValue::from(name.as_str()));
            events.push(ChromeTraceEvent {
                name: "thread_name".to_string(),
                cat,
                ph: "M",
                ts: 0,
                dur: None,
                pid: PROCESS_ID,
                tid,
                args: Some(meta),
            });

            let Some(profile) = segmented.segments_for_label(label) else {
                continue;
            };
            for segment in profile.segments.iter().filter(|s| !s.is_empty()) {
                events.push(ChromeTraceEvent {
                    name: name.clone(),
                    cat,
                    ph: "X",
                    ts: segment.start.saturating_sub(start),
                    dur: Some(segment.len()),
                    pid: PROCESS_ID,
                    tid,
                    args: None,
                });
            }
        }

        let extensions = self
            .records
            .iter()
            .map(|r| {
                let profile = segmented.segments_for(r.id());
                ExtensionSummary {
                    id: r.id().to_string(),
                    name: r.display_name().to_string(),
                    total_time: profile.total_time.0,
                    segments: profile.segments.len(),
                }
            })
            .collect();

        let output = ChromeTrace {
            trace_events: events,
            display_time_unit: "ms",
            other_data: OtherData { trace: self.trace, extensions },
        };

        serde_json::to_writer_pretty(&mut writer, &output)?;
        writer.flush()?;
        Ok(())
    }
}
