use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::{Result, TransformError};
use crate::model::{ClassifiedRow, NormalizedRow};

/// Builds the case-insensitive whole-word alternation for the branded
/// terms. Terms are trimmed and blank entries ignored; returns `None`
/// when no usable term remains, which disables the flag entirely.
pub(crate) fn branded_pattern(terms: &[String]) -> Result<Option<Regex>> {
    let cleaned: Vec<&str> = terms
        .iter()
        .map(|term| term.trim())
        .filter(|term| !term.is_empty())
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }

    let alternation = cleaned
        .iter()
        .map(|term| format!(r"\b{}\b", regex::escape(term)))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){alternation}"))
        .map(Some)
        .map_err(|source| TransformError::BrandedPattern { source })
}

/// Maps a URL to its segment: the last non-empty path component, with
/// anything from the first `.` on removed, or `"home"` when the path is
/// empty. Unparseable URLs fall back to treating the whole string as a
/// path, so the function is total.
pub fn extract_segment(url: &str) -> String {
    let raw = url.trim();
    let parsed_path = Url::parse(raw).ok().map(|parsed| parsed.path().to_string());
    let path = parsed_path.as_deref().unwrap_or(raw);

    let last = path.trim_matches('/').rsplit('/').next().unwrap_or("");
    if last.is_empty() {
        return "home".to_string();
    }
    match last.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => last.to_string(),
    }
}

/// Attaches the branded flag and URL segment to every row. The segment
/// is always computed; whether it reaches the combined output is an
/// export decision. Returns the rows plus whether a branded pattern was
/// in effect, so downstream layers shape their columns correctly even
/// for empty row sets.
pub fn classify(
    rows: Vec<NormalizedRow>,
    branded_terms: &[String],
) -> Result<(Vec<ClassifiedRow>, bool)> {
    let pattern = branded_pattern(branded_terms)?;
    let branded_applied = pattern.is_some();

    let mut classified = Vec::with_capacity(rows.len());
    let mut branded_count = 0usize;

    for row in rows {
        let branded = pattern.as_ref().map(|re| re.is_match(&row.keyword));
        if branded == Some(true) {
            branded_count += 1;
        }
        let segment = extract_segment(&row.url);

        classified.push(ClassifiedRow {
            keyword: row.keyword,
            position: row.position,
            search_volume: row.search_volume,
            keyword_intents: row.keyword_intents,
            url: row.url,
            traffic: row.traffic,
            date: row.date,
            branded,
            segment,
        });
    }

    debug!(
        rows = classified.len(),
        branded = branded_count,
        branded_applied,
        "classified rows"
    );

    Ok((classified, branded_applied))
}
