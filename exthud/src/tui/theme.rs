//! TUI color theme
//!
//! HUD-inspired color scheme for the terminal interface

use exthud_common::Severity;
use ratatui::style::Color;

pub const HUD_GREEN: Color = Color::Rgb(0, 255, 0);
pub const CRITICAL_RED: Color = Color::Rgb(255, 0, 0);
pub const CAUTION_AMBER: Color = Color::Rgb(255, 191, 0);
pub const INFO_DIM: Color = Color::Rgb(0, 180, 0);
pub const BACKGROUND: Color = Color::Rgb(0, 20, 0);

/// Marker and color for a record's share of the trace
/// - Above 40%: Critical (Red)
/// - Above 20%: Caution (Amber)
/// - Otherwise: Normal (Green)
#[must_use]
pub fn share_marker(percentage: f64) -> (&'static str, Color) {
    if percentage > 40.0 {
        ("🔴", CRITICAL_RED)
    } else if percentage > 20.0 {
        ("🟡", CAUTION_AMBER)
    } else {
        ("🟢", HUD_GREEN)
    }
}

#[must_use]
pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => CRITICAL_RED,
        Severity::Warning => CAUTION_AMBER,
        Severity::Info => INFO_DIM,
    }
}

/// Fixed-width bar, e.g. `[███░░░░░░░]`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn share_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}
