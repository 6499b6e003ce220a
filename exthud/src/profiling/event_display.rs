//! Headless output: the runtime extensions list as a plain table

// Column widths are display-only
#![allow(clippy::cast_precision_loss)]

use crate::analysis::RuntimeExtensionRecord;
use crate::describe::{activation_summary, messages_summary, profile_summary};
use crate::domain::Micros;

use super::session::SessionPhase;

/// Print the record list, one extension per line
pub fn display_records(records: &[RuntimeExtensionRecord], trace_duration: Option<Micros>) {
    if records.is_empty() {
        println!("no activated extensions");
        return;
    }

    let name_width = records.iter().map(|r| r.display_name().len()).max().unwrap_or(0).min(40);
    for record in records {
        let mut line = format!(
            "{:<name_width$}  {:<10}  {:<28}",
            truncate(record.display_name(), name_width),
            record.description.version,
            activation_summary(&record.activation),
        );
        if let Some(duration) = trace_duration {
            let profile = profile_summary(record, duration).unwrap_or_default();
            line.push_str(&format!("  {profile:<20}"));
        }
        let messages = messages_summary(&record.messages);
        if !messages.is_empty() {
            line.push_str(&format!("  [{messages}]"));
        }
        println!("{}", line.trim_end());
    }
}

/// Print a session phase change
pub fn display_session_phase(phase: SessionPhase) {
    println!("[PROFILE] {}", phase.label());
}

/// Print a one-line summary of the active trace
pub fn display_trace_summary(duration: Micros, extension_time: Micros) {
    println!(
        "[TRACE] {duration} profiled, {extension_time} in extensions ({:.1}%)",
        extension_time.percentage_of(duration)
    );
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}
