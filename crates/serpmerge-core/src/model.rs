use chrono::NaiveDate;

use crate::error::{Result, TransformError};

/// Columns every ranking report must carry, in the order the combined
/// output presents them.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Keyword",
    "Position",
    "Search Volume",
    "Keyword Intents",
    "URL",
    "Traffic",
    "Timestamp",
];

/// One uploaded ranking report: a display name for diagnostics plus the
/// raw CSV text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInput {
    pub name: String,
    pub contents: String,
}

impl TableInput {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// A single parsed report before merging: header plus raw string rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Which input a merged row came from, so later stages can name the
/// offending file and row in errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOrigin {
    pub input: String,
    /// 1-based data row within the source input, header excluded.
    pub row: usize,
}

/// A row inside the merged table. Cells align with
/// [`MergedTable::columns`]; `None` marks a column the source input did
/// not have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRow {
    pub origin: RowOrigin,
    pub cells: Vec<Option<String>>,
}

/// All parsed reports concatenated on the union of their columns, with
/// exact-duplicate rows removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedTable {
    pub columns: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

/// One row that survived the position filter, typed and renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub keyword: String,
    pub position: i64,
    pub search_volume: i64,
    pub keyword_intents: String,
    pub url: String,
    pub traffic: i64,
    /// Anchored to the 11th of the observation month; `None` when the
    /// source timestamp did not parse.
    pub date: Option<NaiveDate>,
}

/// A normalized row with the branded flag and URL segment attached.
/// `branded` is `None` exactly when no branded terms were supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRow {
    pub keyword: String,
    pub position: i64,
    pub search_volume: i64,
    pub keyword_intents: String,
    pub url: String,
    pub traffic: i64,
    pub date: Option<NaiveDate>,
    pub branded: Option<bool>,
    pub segment: String,
}

/// Per-segment traffic rollup with sample keywords and URLs.
/// `occurrences` always counts the segment over the full row set, also
/// when the rollup appears in the partial view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRollup {
    pub segment: String,
    pub traffic: i64,
    pub keywords: Vec<String>,
    pub urls: Vec<String>,
    pub occurrences: usize,
}

/// Caller-tunable knobs for one transform run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Highest ranking position to keep, inclusive.
    pub max_position: u32,
    /// Terms whose whole-word presence in a keyword marks it branded.
    /// Blank entries are ignored; an empty list disables the flag.
    pub branded_terms: Vec<String>,
    /// Carry the URL segment column into the combined output.
    pub include_segments: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            max_position: 11,
            branded_terms: Vec::new(),
            include_segments: false,
        }
    }
}

impl TransformOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_position < 1 || self.max_position > 100 {
            return Err(TransformError::MaxPositionOutOfRange {
                value: self.max_position,
            });
        }
        Ok(())
    }
}

/// Everything one transform run produces. Purely in-memory; rendering
/// and file IO live in the export layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Merged, filtered, classified rows in traffic-descending order.
    pub combined: Vec<ClassifiedRow>,
    /// Every segment, traffic-descending.
    pub full_segments: Vec<SegmentRollup>,
    /// Segments seen more than 5 and at most 50 times, same order.
    pub partial_segments: Vec<SegmentRollup>,
    /// Whether a usable branded term list was in effect.
    pub branded_applied: bool,
    /// Whether the combined output carries the segment column.
    pub include_segments: bool,
}
