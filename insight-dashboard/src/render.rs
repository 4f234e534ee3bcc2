//! Terminal rendering
//!
//! Turns a [`DashboardState`] into one text frame: stat cards, the level
//! distribution, the errors-by-minute chart and the live log table. Every
//! function here is pure and returns a `String`.

use std::fmt::Write;

use colored::*;
use insight_core::aggregate::DashboardState;
use insight_core::aggregate::snapshot::NormalizedRecord;
use insight_core::domain::log::LogLevel;
use insight_core::domain::stats::{AggregateStats, ErrorHistogram, HISTOGRAM_BUCKETS};

const CHART_HEIGHT: u64 = 6;
const BAR_WIDTH: usize = 30;
const MESSAGE_WIDTH: usize = 60;

/// Render a full dashboard frame
pub fn frame(state: &DashboardState, server_url: &str, rows: usize) -> String {
    let mut out = String::new();

    let updated = match state.computed_at {
        Some(at) => format!("updated {}", at.format("%H:%M:%S")),
        None => "waiting for first snapshot...".to_string(),
    };
    let _ = writeln!(
        out,
        "{} {} {}",
        "Insight".bold().cyan(),
        server_url.dimmed(),
        updated.dimmed()
    );
    out.push('\n');

    out.push_str(&stat_cards(&state.stats));
    out.push('\n');
    out.push_str(&level_distribution(&state.stats));
    out.push('\n');
    out.push_str(&error_chart(&state.stats.errors_by_minute));
    out.push('\n');
    out.push_str(&log_table(state.snapshot.records(), rows));

    out
}

/// One line of headline counters
pub fn stat_cards(stats: &AggregateStats) -> String {
    let mut line = format!(
        "  Total {}   {} {}   {} {}   {} {}",
        stats.total.to_string().bold(),
        "Errors".red(),
        stats.error_count.to_string().bold(),
        "Warnings".yellow(),
        stats.warn_count.to_string().bold(),
        "Info".green(),
        stats.info_count.to_string().bold(),
    );

    let unknown = stats.unknown_count();
    if unknown > 0 {
        let _ = write!(line, "   {} {}", "Other".dimmed(), unknown);
    }

    line.push('\n');
    line
}

/// Horizontal bars of the level split
pub fn level_distribution(stats: &AggregateStats) -> String {
    let mut out = format!("{}\n", "Level distribution".bold());

    let rows = [
        ("ERROR", stats.error_count),
        ("WARN", stats.warn_count),
        ("INFO", stats.info_count),
    ];

    for (label, count) in rows {
        let _ = writeln!(
            out,
            "  {:<5} {:<width$} {:>5.1}%",
            colorize_level(label),
            bar(count, stats.total),
            percent(count, stats.total),
            width = BAR_WIDTH
        );
    }

    out
}

/// Column chart over the 60 clock-minute buckets
///
/// Each column is one minute; the axis below labels every tenth minute.
pub fn error_chart(histogram: &ErrorHistogram) -> String {
    let mut out = format!(
        "{} {}\n",
        "Errors by minute".bold(),
        format!("(last hour, {} total)", histogram.total()).dimmed()
    );

    let buckets = histogram.dense();
    let peak = buckets.iter().copied().max().unwrap_or(0);

    if peak == 0 {
        out.push_str(&format!("  {}\n", "no errors in the last hour".dimmed()));
    } else {
        for level in (1..=CHART_HEIGHT).rev() {
            let row: String = buckets
                .iter()
                .map(|&count| if column_height(count, peak) >= level { '█' } else { ' ' })
                .collect();
            let _ = writeln!(out, "  │{}", row.red());
        }
    }

    let _ = writeln!(out, "  └{}", "─".repeat(HISTOGRAM_BUCKETS));
    let _ = writeln!(out, "   {}", axis_labels());

    out
}

/// Newest-first table of the first `rows` records
pub fn log_table(records: &[NormalizedRecord], rows: usize) -> String {
    let mut out = format!("{}\n", "Live logs".bold());

    if records.is_empty() {
        let _ = writeln!(out, "  {}", "No logs yet.".yellow());
        return out;
    }

    let _ = writeln!(
        out,
        "  {:<8}  {:<5}  {:<24}  {}",
        "TIME".dimmed(),
        "LEVEL".dimmed(),
        "SERVICE".dimmed(),
        "MESSAGE".dimmed()
    );

    for record in records.iter().take(rows) {
        let time = record
            .timestamp
            .map(|ts| ts.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string());
        let level = record.level.as_ref().map(LogLevel::as_str).unwrap_or("-");
        let service = record.document.field_str("service").unwrap_or("-");
        let message = record.document.field_str("message").unwrap_or("");

        let _ = writeln!(
            out,
            "  {:<8}  {:<5}  {:<24}  {}",
            time,
            colorize_level(level),
            truncate(service, 24),
            truncate(message, MESSAGE_WIDTH)
        );
    }

    if records.len() > rows {
        let _ = writeln!(
            out,
            "  {}",
            format!("... {} more", records.len() - rows).dimmed()
        );
    }

    out
}

/// Colorize a level name for display
pub fn colorize_level(level: &str) -> ColoredString {
    match level {
        "ERROR" => level.red().bold(),
        "WARN" => level.yellow(),
        "INFO" => level.green(),
        _ => level.dimmed(),
    }
}

fn axis_labels() -> String {
    (0..HISTOGRAM_BUCKETS)
        .step_by(10)
        .map(|minute| format!("{:<10}", ErrorHistogram::label(minute as u8)))
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Rows a column fills; any non-zero count gets at least one
fn column_height(count: u64, peak: u64) -> u64 {
    if count == 0 || peak == 0 {
        return 0;
    }
    (count * CHART_HEIGHT).div_ceil(peak)
}

fn bar(count: u64, total: u64) -> String {
    if total == 0 {
        return String::new();
    }
    let filled = (count as usize * BAR_WIDTH) / total as usize;
    "■".repeat(filled)
}

fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 * 100.0 / total as f64
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}
