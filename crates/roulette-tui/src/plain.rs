//! Headless mode: one pick, progress on stderr, the film on stdout.

use anyhow::bail;
use tracing::warn;

use roulette_core::orchestrator::{Orchestrator, RunEvent, RunOutcome, RunSink, NO_URLS};
use roulette_core::progress::RETRYING_MESSAGE;
use roulette_core::{FinalResult, Store};

use crate::render::{byline, format_pool, probability_text, rating_text, stars, timing_lines};

struct StderrSink;

impl RunSink for StderrSink {
    fn emit(&self, event: RunEvent) {
        if let Some(line) = describe(&event) {
            eprintln!("{}", line);
        }
    }
}

/// Progress ticks are too chatty for a log line; everything else gets one.
fn describe(event: &RunEvent) -> Option<String> {
    match event {
        RunEvent::Started { urls, .. } => Some(format!("picking from {} list(s)…", urls.len())),
        RunEvent::Phase { message, .. } => Some(message.to_string()),
        RunEvent::Retrying {
            attempt,
            max_retries,
            ..
        } => Some(format!("{} ({}/{})", RETRYING_MESSAGE, attempt, max_retries)),
        RunEvent::Settling { .. } => Some("found one".to_string()),
        RunEvent::Progress { .. } | RunEvent::Resumed { .. } | RunEvent::Finished { .. } => None,
    }
}

fn summary(result: &FinalResult) -> Vec<String> {
    let movie = &result.movie;
    let mut lines = vec![movie.name.clone(), byline(result)];
    if let Some(row) = stars(movie.rating) {
        let glyphs: String = row.iter().map(|s| s.glyph()).collect();
        let value = movie.rating.map(rating_text).unwrap_or_default();
        lines.push(format!("{} {}", glyphs, value));
    }
    lines.push(movie.url.clone());
    lines.push(format!(
        "pool {} films · odds {}",
        format_pool(result.stats.total_pool),
        probability_text(&result.stats)
    ));
    if let Some(timing) = result.stats.timing.as_ref() {
        let parts: Vec<String> = timing_lines(timing)
            .into_iter()
            .map(|(label, value)| format!("{} {}", label, value))
            .collect();
        lines.push(parts.join(" · "));
    }
    lines
}

pub async fn run(orchestrator: &Orchestrator, store: &dyn Store, urls: Vec<String>) -> anyhow::Result<()> {
    if urls.is_empty() {
        bail!(NO_URLS);
    }
    match orchestrator.run(1, urls.clone(), &StderrSink).await {
        RunOutcome::Success(result) => {
            for line in summary(&result) {
                println!("{}", line);
            }
            if let Err(e) = store.record_success(&result, &urls) {
                warn!("could not save pick: {:#}", e);
            }
            Ok(())
        }
        RunOutcome::Failed(error) => bail!("{}", error.display_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_core::protocol::{ListInfo, Movie, Stats};

    #[test]
    fn progress_ticks_stay_quiet() {
        assert_eq!(describe(&RunEvent::Progress { run: 1, percent: 12.0 }), None);
        assert_eq!(
            describe(&RunEvent::Retrying {
                run: 1,
                attempt: 2,
                max_retries: 3
            })
            .as_deref(),
            Some(format!("{} (2/3)", RETRYING_MESSAGE).as_str())
        );
    }

    #[test]
    fn summary_lists_film_stars_and_odds() {
        let result = FinalResult {
            movie: Movie {
                name: "Heat".to_string(),
                year: Some("1995".to_string()),
                url: "https://letterboxd.com/film/heat/".to_string(),
                rating: Some(4.5),
                poster: None,
                slug: Some("heat".to_string()),
            },
            list: ListInfo {
                title: "Crime".to_string(),
                url: None,
                extra: Default::default(),
            },
            stats: Stats {
                total_pool: 1_000_000,
                probability: "0.0001".to_string(),
                timing: None,
            },
        };
        let lines = summary(&result);
        assert_eq!(lines[0], "Heat");
        assert_eq!(lines[1], "1995 from Crime");
        assert_eq!(lines[2], "★★★★⯪ 4.50");
        assert_eq!(lines[4], "pool 1,000,000 films · odds 0.0001%");
        assert_eq!(lines.len(), 5);
    }
}
