//! Wire types for the picker backend and the client-side `FinalResult`.
//!
//! The backend is loose about scalar types (years and ratings show up as
//! numbers or strings depending on the endpoint), so the movie fields go
//! through lenient deserializers rather than failing the whole pick.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Requests ──────────────────────────────────────────────────────────────────

/// Body of `POST /api` and `POST /api/metadata`.
#[derive(Debug, Clone, Serialize)]
pub struct UrlsRequest<'a> {
    pub urls: &'a [String],
}

/// Body of `POST /api/select`.
#[derive(Debug, Clone, Serialize)]
pub struct SelectRequest<'a> {
    pub lists: &'a [Value],
    pub total: u64,
}

/// Body of `POST /api/details`.
#[derive(Debug, Clone, Serialize)]
pub struct DetailsRequest<'a> {
    pub slug: &'a str,
}

// ── Responses ─────────────────────────────────────────────────────────────────

/// Step 1: aggregate pool size plus the per-list breakdown. The breakdown is
/// opaque to the client and handed back verbatim to `select`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataResult {
    #[serde(default)]
    pub lists: Vec<Value>,
    #[serde(default)]
    pub total: u64,
}

/// Step 2: which list won and the slug of the entry drawn from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub list: ListInfo,
    pub meta: EntryMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub slug: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Step 3: full detail for the chosen entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailResult {
    pub movie: Movie,
}

/// Error body shape shared by every endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// ── Shared payload pieces ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MovieWire")]
pub struct Movie {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub url: String,
    /// 0–5 in half units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// `Movie` as the backend sends it. The legacy endpoint reports the rating
/// as a star string (`"★★★½"`) under `stars`, sometimes next to `rating`.
#[derive(Deserialize)]
struct MovieWire {
    name: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    year: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default, deserialize_with = "de_opt_rating")]
    rating: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_rating")]
    stars: Option<f64>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    slug: Option<String>,
}

impl From<MovieWire> for Movie {
    fn from(wire: MovieWire) -> Self {
        Self {
            name: wire.name,
            year: wire.year,
            url: wire.url,
            rating: wire.rating.or(wire.stars),
            poster: wire.poster,
            slug: wire.slug,
        }
    }
}

/// Client-measured wall time of each multi-step phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub metadata_ms: u64,
    pub select_ms: u64,
    pub details_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_pool: u64,
    #[serde(deserialize_with = "de_text")]
    pub probability: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

/// What the client renders and persists, regardless of protocol variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub movie: Movie,
    pub list: ListInfo,
    pub stats: Stats,
}

impl FinalResult {
    /// Assemble the multi-step outcome. Probability and timing are computed
    /// here, never taken from the server.
    pub fn assemble(
        metadata: &MetadataResult,
        selection: SelectionResult,
        details: DetailResult,
        timing: Timing,
    ) -> Self {
        let mut movie = details.movie;
        if movie.slug.is_none() {
            movie.slug = Some(selection.meta.slug);
        }
        Self {
            movie,
            list: selection.list,
            stats: Stats {
                total_pool: metadata.total,
                probability: format_probability(metadata.total),
                timing: Some(timing),
            },
        }
    }
}

/// `(1/total)*100`, four decimals below 0.01%, two otherwise.
pub fn format_probability(total: u64) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    let probability = 100.0 / total as f64;
    if probability < 0.01 {
        format!("{:.4}", probability)
    } else {
        format!("{:.2}", probability)
    }
}

/// Parse a rating out of a star string such as `"★★★½"`.
pub fn parse_star_rating(text: &str) -> Option<f64> {
    let mut rating = 0.0;
    let mut seen = false;
    for c in text.trim().chars() {
        match c {
            '★' => {
                rating += 1.0;
                seen = true;
            }
            '½' => {
                rating += 0.5;
                seen = true;
            }
            _ => {}
        }
    }
    seen.then_some(rating)
}

// ── Lenient deserializers ─────────────────────────────────────────────────────

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_text(value).ok_or_else(|| serde::de::Error::custom("expected string or number"))
}

fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_text))
}

fn de_opt_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let rating = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .or_else(|| parse_star_rating(&s)),
        _ => None,
    };
    Ok(rating.filter(|r| r.is_finite()).map(|r| r.clamp(0.0, 5.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn probability_uses_four_decimals_below_one_hundredth() {
        assert_eq!(format_probability(1_000_000), "0.0001");
        assert_eq!(format_probability(20), "5.00");
        assert_eq!(format_probability(1), "100.00");
        assert_eq!(format_probability(10_000), "0.01");
        assert_eq!(format_probability(0), "0.00");
    }

    #[test]
    fn movie_accepts_numeric_and_string_scalars() {
        let movie: Movie = serde_json::from_value(json!({
            "name": "Paris, Texas",
            "year": 1984,
            "url": "https://letterboxd.com/film/paris-texas/",
            "rating": "4.25",
            "slug": "paris-texas"
        }))
        .unwrap();
        assert_eq!(movie.year.as_deref(), Some("1984"));
        assert_eq!(movie.rating, Some(4.25));
        assert!(movie.poster.is_none());
    }

    #[test]
    fn legacy_star_strings_become_ratings() {
        let movie: Movie = serde_json::from_value(json!({
            "name": "Stalker",
            "url": "https://letterboxd.com/film/stalker/",
            "stars": "★★★★½"
        }))
        .unwrap();
        assert_eq!(movie.rating, Some(4.5));
        assert_eq!(parse_star_rating("no stars here"), None);
    }

    #[test]
    fn rating_and_stars_together_prefer_rating() {
        let movie: Movie = serde_json::from_value(json!({
            "name": "Stalker",
            "url": "https://letterboxd.com/film/stalker/",
            "rating": 4.2,
            "stars": "★★★★"
        }))
        .unwrap();
        assert_eq!(movie.rating, Some(4.2));

        let movie: Movie = serde_json::from_value(json!({
            "name": "Stalker",
            "url": "https://letterboxd.com/film/stalker/",
            "rating": null,
            "stars": "★★★★"
        }))
        .unwrap();
        assert_eq!(movie.rating, Some(4.0));
    }

    #[test]
    fn empty_year_and_rating_are_absent() {
        let movie: Movie = serde_json::from_value(json!({
            "name": "Untitled",
            "year": "",
            "url": "",
            "rating": null
        }))
        .unwrap();
        assert_eq!(movie.year, None);
        assert_eq!(movie.rating, None);
    }

    #[test]
    fn assemble_computes_stats_client_side() {
        let metadata = MetadataResult {
            lists: vec![json!({"title": "A", "count": 15}), json!({"title": "B", "count": 5})],
            total: 20,
        };
        let selection: SelectionResult = serde_json::from_value(json!({
            "list": {"title": "A", "url": "https://letterboxd.com/u/list/a/", "count": 15},
            "meta": {"slug": "heat", "page": 1}
        }))
        .unwrap();
        let details: DetailResult = serde_json::from_value(json!({
            "movie": {"name": "Heat", "year": "1995", "url": "https://letterboxd.com/film/heat/"}
        }))
        .unwrap();
        let timing = Timing {
            metadata_ms: 10,
            select_ms: 5,
            details_ms: 7,
            total_ms: 22,
        };

        let result = FinalResult::assemble(&metadata, selection, details, timing);
        assert_eq!(result.stats.total_pool, 20);
        assert_eq!(result.stats.probability, "5.00");
        assert_eq!(result.stats.timing, Some(timing));
        assert_eq!(result.movie.slug.as_deref(), Some("heat"));
        assert_eq!(result.list.extra.get("count"), Some(&json!(15)));
    }

    #[test]
    fn legacy_stats_probability_may_be_numeric() {
        let stats: Stats =
            serde_json::from_value(json!({"total_pool": 300, "probability": 0.33})).unwrap();
        assert_eq!(stats.probability, "0.33");
        assert_eq!(stats.timing, None);
    }
}
