//! Runtime extensions list view

use exthud_common::ExtensionId;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use super::theme::{share_bar, share_marker, CAUTION_AMBER, CRITICAL_RED, HUD_GREEN, INFO_DIM};
use crate::analysis::RuntimeExtensionRecord;
use crate::describe::{activation_summary, messages_summary, trigger_description};
use crate::domain::Micros;
use crate::view_model::RecordList;

const SEL_LEFT: &str = "<";
const SEL_RIGHT: &str = ">";
const BAR_WIDTH: usize = 10;

fn truncate_for_display(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

/// Keep the selected row inside the visible window
fn visible_scroll_offset(selected: usize, current_offset: usize, visible_count: usize) -> usize {
    if selected >= current_offset + visible_count {
        selected.saturating_sub(visible_count - 1)
    } else {
        current_offset.min(selected)
    }
}

/// Rows that fit in `area` (2 lines per row, minus borders)
fn visible_item_count(area: Rect, total_items: usize) -> usize {
    let available_height = area.height.saturating_sub(2) as usize;
    (available_height / 2).max(1).min(total_items.max(1))
}

/// The list of activated extensions.
///
/// Records are replaced wholesale whenever the model publishes a new list.
/// The selection follows the selected extension, not its row number, so a
/// re-sort after profiling keeps the same extension highlighted.
pub struct ExtensionListView {
    records: RecordList,
    trace_duration: Option<Micros>,
    selected_index: usize,
    scroll_offset: usize,
}

impl ExtensionListView {
    #[must_use]
    pub fn new(records: RecordList, trace_duration: Option<Micros>) -> Self {
        Self { records, trace_duration, selected_index: 0, scroll_offset: 0 }
    }

    /// Swap in a newly published list
    pub fn set_records(&mut self, records: RecordList, trace_duration: Option<Micros>) {
        let selected: Option<ExtensionId> = self.selected().map(|r| r.id().clone());
        self.records = records;
        self.trace_duration = trace_duration;
        self.selected_index = selected
            .and_then(|id| self.records.iter().position(|r| *r.id() == id))
            .unwrap_or_else(|| self.selected_index.min(self.records.len().saturating_sub(1)));
    }

    #[must_use]
    pub fn records(&self) -> &[RuntimeExtensionRecord] {
        &self.records
    }

    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    #[must_use]
    pub fn selected(&self) -> Option<&RuntimeExtensionRecord> {
        self.records.get(self.selected_index)
    }

    pub fn scroll_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
        self.scroll_offset = self.scroll_offset.min(self.selected_index);
    }

    pub fn scroll_down(&mut self) {
        self.selected_index = (self.selected_index + 1).min(self.records.len().saturating_sub(1));
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let display_count = visible_item_count(area, self.records.len());
        self.scroll_offset =
            visible_scroll_offset(self.selected_index, self.scroll_offset, display_count);

        let max_name_len = (area.width as usize).saturating_sub(50).clamp(12, 48);
        let mut lines = Vec::with_capacity(display_count * 2);
        for (display_idx, record) in
            self.records.iter().skip(self.scroll_offset).take(display_count).enumerate()
        {
            let is_selected = self.scroll_offset + display_idx == self.selected_index;
            lines.push(self.render_main_line(record, is_selected, max_name_len));
            lines.push(render_detail_line(record));
        }
        if self.records.is_empty() {
            lines.push(Line::from(Span::styled(
                "  No extensions have activated yet",
                Style::default().fg(INFO_DIM),
            )));
        }

        let title = format!("[ RUNTIME EXTENSIONS {} ]", self.records.len());
        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Plain)
                .title(title)
                .border_style(Style::default().fg(HUD_GREEN)),
        );
        f.render_widget(paragraph, area);
    }

    /// `< 🟢 Name  1.2.3  Activation: 42ms  12.00ms [██░░] 20.0% >`
    fn render_main_line(
        &self,
        record: &RuntimeExtensionRecord,
        is_selected: bool,
        max_name_len: usize,
    ) -> Line<'static> {
        let share = self
            .trace_duration
            .zip(record.profile.as_ref())
            .map(|(duration, profile)| {
                (profile.total_time, profile.total_time.percentage_of(duration))
            });
        let (marker, color) = share.map_or(("  ", HUD_GREEN), |(_, pct)| share_marker(pct));
        let (sel_l, sel_r) = if is_selected { (SEL_LEFT, SEL_RIGHT) } else { (" ", " ") };
        let name_style = if is_selected {
            Style::default().fg(color).add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(color)
        };

        let name = truncate_for_display(record.display_name(), max_name_len);
        let mut spans = vec![
            Span::styled(sel_l, Style::default().fg(CAUTION_AMBER)),
            Span::styled(marker, Style::default().fg(color)),
            Span::raw(" "),
            Span::styled(format!("{name:<max_name_len$}"), name_style),
            Span::styled(
                format!(" {:<10}", record.description.version),
                Style::default().fg(INFO_DIM),
            ),
            Span::styled(
                format!(" {:<26}", activation_summary(&record.activation)),
                Style::default().fg(HUD_GREEN),
            ),
        ];
        if let Some((total, pct)) = share {
            spans.push(Span::styled(
                format!(" {:>9} {} {pct:>5.1}%", total.to_string(), share_bar(pct, BAR_WIDTH)),
                Style::default().fg(color),
            ));
        }
        spans.push(Span::styled(sel_r, Style::default().fg(CAUTION_AMBER)));
        Line::from(spans)
    }
}

/// Second line: trigger, messages, built-in marker
fn render_detail_line(record: &RuntimeExtensionRecord) -> Line<'static> {
    let mut spans = vec![
        Span::raw("     "),
        Span::styled(trigger_description(&record.activation), Style::default().fg(INFO_DIM)),
    ];
    let messages = messages_summary(&record.messages);
    if !messages.is_empty() {
        spans.push(Span::styled(format!("  [{messages}]"), Style::default().fg(CRITICAL_RED)));
    }
    if record.description.is_builtin {
        spans.push(Span::styled("  built-in", Style::default().fg(INFO_DIM)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exthud_common::{ActivationTimes, ActivationTrigger, ExtensionDescription};
    use std::sync::Arc;

    fn record(id: &str, original_index: usize) -> RuntimeExtensionRecord {
        RuntimeExtensionRecord {
            original_index,
            description: ExtensionDescription {
                identifier: ExtensionId::new(id),
                display_name: None,
                version: "1.0.0".to_string(),
                has_entry_point: true,
                repository_url: None,
                is_builtin: false,
            },
            marketplace: None,
            activation: ActivationTimes {
                trigger: ActivationTrigger::Startup,
                startup: true,
                code_loading_time: 1,
                activate_call_time: 1,
                activate_resolved_time: 0,
                activated_by: None,
            },
            messages: Vec::new(),
            profile: None,
        }
    }

    fn list(ids: &[&str]) -> RecordList {
        ids.iter().enumerate().map(|(i, id)| record(id, i)).collect::<Vec<_>>().into()
    }

    #[test]
    fn test_selection_follows_extension_across_reorder() {
        let mut view = ExtensionListView::new(list(&["a", "b", "c"]), None);
        view.scroll_down();
        assert_eq!(view.selected().unwrap().id().as_str(), "b");

        view.set_records(list(&["c", "a", "b"]), Some(Micros(10)));
        assert_eq!(view.selected_index(), 2);
        assert_eq!(view.selected().unwrap().id().as_str(), "b");
    }

    #[test]
    fn test_selection_clamped_when_extension_disappears() {
        let mut view = ExtensionListView::new(list(&["a", "b", "c"]), None);
        view.scroll_down();
        view.scroll_down();
        view.set_records(list(&["a"]), None);
        assert_eq!(view.selected_index(), 0);

        view.set_records(Arc::from(Vec::new()), None);
        assert!(view.selected().is_none());
        view.scroll_down();
        view.scroll_up();
        assert_eq!(view.selected_index(), 0);
    }

    #[test]
    fn test_scroll_down_stops_at_last_row() {
        let mut view = ExtensionListView::new(list(&["a", "b"]), None);
        for _ in 0..5 {
            view.scroll_down();
        }
        assert_eq!(view.selected_index(), 1);
    }

    #[test]
    fn test_visible_scroll_offset() {
        assert_eq!(visible_scroll_offset(0, 0, 5), 0);
        assert_eq!(visible_scroll_offset(7, 0, 5), 3);
        assert_eq!(visible_scroll_offset(2, 3, 5), 2);
    }

    #[test]
    fn test_truncate_for_display() {
        assert_eq!(truncate_for_display("short", 10), "short");
        assert_eq!(truncate_for_display("a-very-long-name", 8), "a-ver...");
    }
}
