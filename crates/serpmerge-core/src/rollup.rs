use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::model::{ClassifiedRow, SegmentRollup};

/// Sample rows kept per segment for the keyword and URL lists.
const SAMPLE_LIMIT: usize = 3;

/// Occurrence band for the partial view: more than `PARTIAL_MIN`, at
/// most `PARTIAL_MAX` appearances across the full row set.
const PARTIAL_MIN: usize = 5;
const PARTIAL_MAX: usize = 50;

/// Rolls the classified rows up per segment and returns the full view
/// plus the partial view restricted to the mid-frequency band.
///
/// Two passes: the first fixes occurrence counts and traffic sums over
/// the whole population, the second picks the top-traffic sample rows
/// per segment. Partial rollups keep their full-population counts, so
/// the band filter and the reported occurrences always agree.
pub fn rollup_segments(rows: &[ClassifiedRow]) -> (Vec<SegmentRollup>, Vec<SegmentRollup>) {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    let mut traffic_sums: HashMap<&str, i64> = HashMap::new();
    for row in rows {
        *occurrences.entry(row.segment.as_str()).or_insert(0) += 1;
        *traffic_sums.entry(row.segment.as_str()).or_insert(0) += row.traffic;
    }

    // BTreeMap fixes the pre-sort order lexicographically, which is what
    // breaks ties between segments with equal traffic sums.
    let mut groups: BTreeMap<&str, Vec<&ClassifiedRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.segment.as_str()).or_default().push(row);
    }

    let mut full: Vec<SegmentRollup> = Vec::with_capacity(groups.len());
    for (segment, mut group) in groups {
        group.sort_by(|a, b| b.traffic.cmp(&a.traffic));
        full.push(SegmentRollup {
            segment: segment.to_string(),
            traffic: traffic_sums[segment],
            keywords: group
                .iter()
                .take(SAMPLE_LIMIT)
                .map(|row| row.keyword.clone())
                .collect(),
            urls: group
                .iter()
                .take(SAMPLE_LIMIT)
                .map(|row| row.url.clone())
                .collect(),
            occurrences: occurrences[segment],
        });
    }

    full.sort_by(|a, b| b.traffic.cmp(&a.traffic));

    let partial: Vec<SegmentRollup> = full
        .iter()
        .filter(|rollup| rollup.occurrences > PARTIAL_MIN && rollup.occurrences <= PARTIAL_MAX)
        .cloned()
        .collect();

    debug!(
        segments = full.len(),
        partial = partial.len(),
        "rolled up traffic by segment"
    );

    (full, partial)
}
