//! Pure projection of a `FinalResult` into display strings.

use chrono::{DateTime, Utc};
use roulette_core::protocol::{FinalResult, Stats, Timing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Star {
    Full,
    Half,
    Empty,
}

impl Star {
    pub fn glyph(self) -> &'static str {
        match self {
            Star::Full => "★",
            Star::Half => "⯪",
            Star::Empty => "☆",
        }
    }
}

/// Five stars for a 0–5 rating in half units. `None` hides the row.
pub fn stars(rating: Option<f64>) -> Option<[Star; 5]> {
    let rating = rating.filter(|r| *r > 0.0)?;
    let mut row = [Star::Empty; 5];
    for (i, star) in row.iter_mut().enumerate() {
        let step = (i + 1) as f64;
        *star = if rating >= step {
            Star::Full
        } else if rating >= step - 0.5 {
            Star::Half
        } else {
            Star::Empty
        };
    }
    Some(row)
}

pub fn rating_text(rating: f64) -> String {
    format!("{:.2}", rating)
}

/// `1234567` → `"1,234,567"`.
pub fn format_pool(total: u64) -> String {
    let digits = total.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `"<year> from <list title>"`; the year is omitted when unknown.
pub fn byline(result: &FinalResult) -> String {
    match result.movie.year.as_deref() {
        Some(year) => format!("{} from {}", year, result.list.title),
        None => format!("from {}", result.list.title),
    }
}

pub fn probability_text(stats: &Stats) -> String {
    format!("{}%", stats.probability)
}

pub fn timing_lines(timing: &Timing) -> Vec<(&'static str, String)> {
    vec![
        ("metadata", format!("{} ms", timing.metadata_ms)),
        ("select", format!("{} ms", timing.select_ms)),
        ("details", format!("{} ms", timing.details_ms)),
        ("total", format!("{} ms", timing.total_ms)),
    ]
}

/// History timestamps: "Just now", "5m ago", "3h ago", else "Mar 4".
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    if secs < 60 {
        "Just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        then.with_timezone(&chrono::Local).format("%b %-d").to_string()
    }
}

/// Last-result cache backing the stats view.
#[derive(Debug, Clone, PartialEq)]
pub struct LastResult {
    pub movie: String,
    pub slug: Option<String>,
    pub rating: Option<f64>,
    pub stats: Stats,
}

impl From<&FinalResult> for LastResult {
    fn from(result: &FinalResult) -> Self {
        Self {
            movie: result.movie.name.clone(),
            slug: result.movie.slug.clone(),
            rating: result.movie.rating,
            stats: result.stats.clone(),
        }
    }
}
