//! Human-readable descriptions of runtime extension records
//!
//! Shared by the TUI and headless output so both say the same thing.

use exthud_common::{ActivationTimes, ActivationTrigger, Severity, StatusMessage};

use crate::analysis::RuntimeExtensionRecord;
use crate::domain::{Micros, Millis};

/// "Startup activation: 12ms" or "Activation: 12ms"
#[must_use]
pub fn activation_summary(activation: &ActivationTimes) -> String {
    let time = Millis(activation.activation_time());
    if activation.startup {
        format!("Startup activation: {time}")
    } else {
        format!("Activation: {time}")
    }
}

/// Why the extension activated, in words
#[must_use]
pub fn trigger_description(activation: &ActivationTimes) -> String {
    let by = activation
        .activated_by
        .as_ref()
        .map_or_else(|| "itself".to_string(), ToString::to_string);
    match &activation.trigger {
        ActivationTrigger::Startup => format!("Activated by {by} on start-up"),
        ActivationTrigger::StartupFinished => format!("Activated by {by} after start-up finished"),
        ActivationTrigger::WorkspaceContains(glob) => {
            format!("Activated by {by} because a file matching {glob} exists in the workspace")
        }
        ActivationTrigger::WorkspaceContainsTimeout(glob) => format!(
            "Activated by {by} because searching for {glob} took too long"
        ),
        ActivationTrigger::OnLanguage(language) => {
            format!("Activated by {by} because a {language} file was opened")
        }
        ActivationTrigger::Event(event) => format!("Activated by {by} on {event}"),
    }
}

/// Profile total with its share of the trace: "12.50ms (41.2%)"
#[must_use]
pub fn profile_summary(record: &RuntimeExtensionRecord, trace_duration: Micros) -> Option<String> {
    let profile = record.profile.as_ref()?;
    let share = profile.total_time.percentage_of(trace_duration);
    Some(format!("{} ({share:.1}%)", profile.total_time))
}

/// Count of messages at or above `severity`
#[must_use]
pub fn count_messages(messages: &[StatusMessage], severity: Severity) -> usize {
    messages.iter().filter(|m| m.severity >= severity).count()
}

/// Short message tally, e.g. "2 errors, 1 warning"; empty when there are none
#[must_use]
pub fn messages_summary(messages: &[StatusMessage]) -> String {
    let errors = messages.iter().filter(|m| m.severity == Severity::Error).count();
    let warnings = messages.iter().filter(|m| m.severity == Severity::Warning).count();
    let mut parts = Vec::new();
    if errors > 0 {
        parts.push(plural(errors, "error"));
    }
    if warnings > 0 {
        parts.push(plural(warnings, "warning"));
    }
    parts.join(", ")
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exthud_common::ExtensionId;

    fn activation(trigger: &str, startup: bool) -> ActivationTimes {
        ActivationTimes {
            trigger: ActivationTrigger::parse(trigger),
            startup,
            code_loading_time: 20,
            activate_call_time: 22,
            activate_resolved_time: 3,
            activated_by: None,
        }
    }

    #[test]
    fn test_activation_summary() {
        assert_eq!(activation_summary(&activation("*", true)), "Startup activation: 42ms");
        assert_eq!(activation_summary(&activation("onView:x", false)), "Activation: 42ms");
    }

    #[test]
    fn test_trigger_description() {
        assert_eq!(
            trigger_description(&activation("onLanguage:rust", false)),
            "Activated by itself because a rust file was opened"
        );
        let mut by_other = activation("onCommand:go", false);
        by_other.activated_by = Some(ExtensionId::new("pub.parent"));
        assert_eq!(trigger_description(&by_other), "Activated by pub.parent on onCommand:go");
    }

    #[test]
    fn test_messages_summary() {
        let messages = vec![
            StatusMessage { severity: Severity::Error, message: "boom".to_string() },
            StatusMessage { severity: Severity::Warning, message: "hmm".to_string() },
            StatusMessage { severity: Severity::Warning, message: "hmm".to_string() },
            StatusMessage { severity: Severity::Info, message: "fyi".to_string() },
        ];
        assert_eq!(messages_summary(&messages), "1 error, 2 warnings");
        assert_eq!(count_messages(&messages, Severity::Warning), 3);
        assert_eq!(messages_summary(&[]), "");
    }
}
