//! Shareable links: a base address plus the list URLs in the query string.

use url::Url;

/// Query keys that may carry list URLs, in the order they are read.
pub const LINK_KEYS: [&str; 4] = ["url", "urls", "list", "lists"];

/// Extract list URLs from a shared link.
///
/// Keys are read in `LINK_KEYS` order (all `url` values before any `urls`
/// value, and so on). Each value may hold several comma-separated URLs.
/// Results are trimmed, de-duplicated and capped at `max`.
pub fn urls_from_link(link: &str, max: usize) -> anyhow::Result<Vec<String>> {
    let parsed = Url::parse(link.trim())?;
    let mut out: Vec<String> = Vec::new();
    for key in LINK_KEYS {
        for (_, value) in parsed.query_pairs().filter(|(k, _)| k == key) {
            for part in value.split(',') {
                let part = part.trim();
                if part.is_empty() || out.iter().any(|u| u == part) {
                    continue;
                }
                out.push(part.to_string());
            }
        }
    }
    out.truncate(max);
    Ok(out)
}

/// `<base>?urls=a,b`, replacing any query the base already had.
pub fn build_link(base: &str, urls: &[String]) -> anyhow::Result<String> {
    let mut link = Url::parse(base.trim())?;
    let joined = urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    link.set_query(None);
    link.query_pairs_mut().append_pair("urls", &joined);
    Ok(link.to_string())
}
