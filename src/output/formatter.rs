use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use super::theme::{Rgb, ThemeColors};
use crate::data::IndicatorTable;
use crate::scoring::{IndicatorSchema, Polarity, RankedRecord, ScoredTable, ScoringError};

const BAR_WIDTH: usize = 20;
const MAX_NAME_WIDTH: usize = 24;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Scores are shown rounded to three decimals
pub fn format_score(score: f64) -> String {
    format!("{:.3}", score)
}

/// Medal for the podium ranks, empty otherwise
pub fn rank_badge(rank: usize) -> &'static str {
    match rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "",
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

fn paint(text: &str, color: Rgb, use_colors: bool) -> String {
    if use_colors {
        text.truecolor(color.0, color.1, color.2).to_string()
    } else {
        text.to_string()
    }
}

/// Horizontal bar proportional to `fraction` of `width` cells.
fn render_bar(fraction: f64, width: usize, fill: Rgb, colors: &ThemeColors, use_colors: bool) -> String {
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    let filled = (fraction * width as f64).round() as usize;
    let full = "█".repeat(filled);
    let empty = "░".repeat(width - filled);
    format!(
        "{}{}",
        paint(&full, fill, use_colors),
        paint(&empty, colors.bar_empty, use_colors)
    )
}

fn name_width(scored: &ScoredTable) -> usize {
    let longest = scored
        .records
        .iter()
        .map(|r| r.record.id.chars().count())
        .max()
        .unwrap_or(0)
        .max(8);
    let cap = match get_terminal_width() {
        // rank(4) + badge(3) + score(7) + bar + separators
        Some(width) if width > BAR_WIDTH + 30 => (width - BAR_WIDTH - 20).min(MAX_NAME_WIDTH),
        Some(_) => 12,
        None => longest,
    };
    longest.min(cap)
}

/// Ranking table: rank, badge, district, score and a score bar, best first.
pub fn format_ranked_table(scored: &ScoredTable, colors: &ThemeColors, use_colors: bool) -> String {
    if scored.is_empty() {
        return "No districts found.".to_string();
    }

    let width = name_width(scored);
    let max_score = scored.max_score().unwrap_or(0.0);

    let header = format!("{:>4}    {}  {:>7}", "Rank", pad("District", width), "Score");
    let mut lines = vec![if use_colors {
        paint(&header, colors.header, true).bold().to_string()
    } else {
        header
    }];

    for ranked in scored.by_rank() {
        let score = ranked.record.environmental_score;
        let fill = colors.score_color(score, max_score);
        let name = pad(&truncate_name(&ranked.record.id, width), width);
        let fraction = if max_score > 0.0 { score / max_score } else { 0.0 };
        let bar = render_bar(fraction, BAR_WIDTH, fill, colors, use_colors);
        let badge = rank_badge(ranked.rank);
        // Medals render two cells wide
        let badge_cell = if badge.is_empty() { "  ".to_string() } else { badge.to_string() };
        let score_str = format!("{:>7}", format_score(score));

        if use_colors {
            lines.push(format!(
                "{:>4}. {}  {}  {}  {}",
                ranked.rank.dimmed(),
                badge_cell,
                name,
                score_str.bold(),
                bar
            ));
        } else {
            lines.push(format!(
                "{:>4}. {}  {}  {}  {}",
                ranked.rank, badge_cell, name, score_str, bar
            ));
        }
    }

    lines.join("\n")
}

/// "Top 3" summary lines
pub fn format_podium(scored: &ScoredTable, use_colors: bool) -> String {
    let mut lines = vec!["Top 3 districts:".to_string()];
    for ranked in scored.by_rank().into_iter().take(3) {
        let name = if use_colors {
            ranked.record.id.bold().to_string()
        } else {
            ranked.record.id.clone()
        };
        lines.push(format!(
            "  {} {} - score {}",
            rank_badge(ranked.rank),
            name,
            format_score(ranked.record.environmental_score)
        ));
    }
    lines.join("\n")
}

/// Tab-separated values for scripting
/// Columns: rank, district, score (no headers, no colors)
pub fn format_tsv(scored: &ScoredTable) -> String {
    scored
        .by_rank()
        .iter()
        .map(|r| format!("{}\t{}\t{}", r.rank, r.record.id, format_score(r.record.environmental_score)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    key: &'a str,
    columns: &'a [String],
    records: Vec<&'a RankedRecord>,
    warnings: Vec<String>,
}

/// Full ranked table as JSON, best first, with any collected warnings.
pub fn format_json(scored: &ScoredTable, warnings: Vec<String>) -> serde_json::Result<String> {
    let report = JsonReport {
        key: &scored.key,
        columns: &scored.columns,
        records: scored.by_rank(),
        warnings,
    };
    serde_json::to_string_pretty(&report)
}

/// Profile of one district: raw and normalized value per indicator.
pub fn format_profile(
    id: &str,
    raw: &IndicatorTable,
    scored: &ScoredTable,
    schema: &IndicatorSchema,
    colors: &ThemeColors,
    use_colors: bool,
) -> Result<String, ScoringError> {
    let ranked = scored
        .get(id)
        .ok_or_else(|| ScoringError::UnknownEntity(id.to_string()))?;

    let title = format!(
        "{} {}  rank {} of {}  score {}",
        ranked.record.id,
        rank_badge(ranked.rank),
        ranked.rank,
        scored.len(),
        format_score(ranked.record.environmental_score)
    );
    let mut lines = vec![if use_colors {
        title.bold().to_string()
    } else {
        title
    }];

    let width = scored.columns.iter().map(|c| c.chars().count()).max().unwrap_or(0);
    for (column, normalized) in scored.columns.iter().zip(&ranked.record.values) {
        let raw_value = raw.value(id, column)?.unwrap_or(f64::NAN);
        let polarity = match schema.polarity(column) {
            Some(Polarity::Good) => "good",
            Some(Polarity::Bad) => "bad ",
            None => "    ",
        };
        let bar = render_bar(
            *normalized,
            BAR_WIDTH / 2,
            colors.palette.color_at(*normalized),
            colors,
            use_colors,
        );
        lines.push(format!(
            "  {}  {}  {:>12.4}  {:>6.3}  {}",
            pad(column, width),
            paint(polarity, colors.muted, use_colors),
            raw_value,
            normalized,
            bar
        ));
    }

    Ok(lines.join("\n"))
}

/// Normalized profiles of several districts side by side (the radar chart's
/// data). Unknown districts are listed as missing.
pub fn format_comparison(
    ids: &[String],
    scored: &ScoredTable,
    colors: &ThemeColors,
    use_colors: bool,
) -> String {
    let found: Vec<&RankedRecord> = ids.iter().filter_map(|id| scored.get(id)).collect();
    if found.is_empty() {
        return "No matching districts.".to_string();
    }

    let label_width = scored.columns.iter().map(|c| c.chars().count()).max().unwrap_or(0);
    let cell = 12;

    let mut header = pad("", label_width);
    for r in &found {
        header.push_str(&format!("  {:>cell$}", truncate_name(&r.record.id, cell), cell = cell));
    }
    let mut lines = vec![if use_colors {
        paint(&header, colors.header, true).bold().to_string()
    } else {
        header
    }];

    for (c, column) in scored.columns.iter().enumerate() {
        let mut line = pad(column, label_width);
        for r in &found {
            let value = r.record.values.get(c).copied().unwrap_or(f64::NAN);
            let text = format!("{:>cell$.3}", value, cell = cell);
            line.push_str("  ");
            line.push_str(&paint(&text, colors.palette.color_at(value), use_colors));
        }
        lines.push(line);
    }

    let mut footer = pad("score", label_width);
    for r in &found {
        footer.push_str(&format!("  {:>cell$.3}", r.record.environmental_score, cell = cell));
    }
    lines.push(footer);

    let missing: Vec<&str> = ids
        .iter()
        .filter(|id| scored.get(id).is_none())
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        lines.push(format!("Not found: {}", missing.join(", ")));
    }

    lines.join("\n")
}

/// Raw values of one column for every district, largest first, shaded along
/// the palette.
pub fn format_parameter_table(
    raw: &IndicatorTable,
    column: &str,
    colors: &ThemeColors,
    use_colors: bool,
) -> Result<String, ScoringError> {
    let view = raw.column(column)?;
    let mut entries: Vec<(&str, f64)> = view.entries().collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    let (lo, hi) = view.min_max().unwrap_or((0.0, 0.0));

    let width = entries
        .iter()
        .map(|(id, _)| id.chars().count())
        .max()
        .unwrap_or(0)
        .max(raw.key.chars().count());

    let header = format!("{}  {:>14}", pad(&raw.key, width), truncate_name(column, 14));
    let mut lines = vec![if use_colors {
        paint(&header, colors.header, true).bold().to_string()
    } else {
        header
    }];

    for (id, value) in entries {
        let text = format!("{:>14.4}", value);
        lines.push(format!(
            "{}  {}",
            pad(id, width),
            paint(&text, colors.palette.color_for(value, lo, hi), use_colors)
        ));
    }

    Ok(lines.join("\n"))
}
