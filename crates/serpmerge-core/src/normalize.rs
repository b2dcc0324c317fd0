use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{Result, TransformError};
use crate::model::{MergedRow, MergedTable, NormalizedRow, RowOrigin};

/// Resolved indices of the required source columns inside a merged table.
struct SourceColumns {
    keyword: usize,
    position: usize,
    search_volume: usize,
    keyword_intents: usize,
    url: usize,
    traffic: usize,
    timestamp: usize,
}

impl SourceColumns {
    fn locate(table: &MergedTable) -> Result<Self> {
        let find = |column: &'static str| {
            table
                .column_index(column)
                .ok_or_else(|| TransformError::MissingColumn {
                    input: "merged input".to_string(),
                    column,
                })
        };
        Ok(Self {
            keyword: find("Keyword")?,
            position: find("Position")?,
            search_volume: find("Search Volume")?,
            keyword_intents: find("Keyword Intents")?,
            url: find("URL")?,
            traffic: find("Traffic")?,
            timestamp: find("Timestamp")?,
        })
    }
}

/// Filters to rows at or above `max_position`, types the surviving
/// cells, and sorts by traffic descending. The sort is stable, so rows
/// with equal traffic keep their merged order.
///
/// Position is parsed for every row because the filter reads it; the
/// other numeric columns are only parsed for rows that survive, so a
/// malformed Traffic cell in a filtered-out row is never an error.
pub fn normalize(table: &MergedTable, max_position: u32) -> Result<Vec<NormalizedRow>> {
    let columns = SourceColumns::locate(table)?;
    let max_position = i64::from(max_position);

    let mut rows = Vec::new();
    let mut null_dates = 0usize;

    for row in &table.rows {
        let position_raw = required_cell(row, columns.position, "Position")?;
        let position = parse_required_int(&row.origin, "Position", position_raw)?;
        if position > max_position {
            continue;
        }

        let search_volume_raw = required_cell(row, columns.search_volume, "Search Volume")?;
        let search_volume = parse_required_int(&row.origin, "Search Volume", search_volume_raw)?;

        let traffic_raw = required_cell(row, columns.traffic, "Traffic")?;
        let traffic = parse_traffic(&row.origin, traffic_raw)?;

        let timestamp_raw = required_cell(row, columns.timestamp, "Timestamp")?;
        let date = parse_report_date(timestamp_raw).and_then(month_anchor);
        if date.is_none() {
            null_dates += 1;
        }

        rows.push(NormalizedRow {
            keyword: required_cell(row, columns.keyword, "Keyword")?.to_string(),
            position,
            search_volume,
            keyword_intents: required_cell(row, columns.keyword_intents, "Keyword Intents")?
                .to_string(),
            url: required_cell(row, columns.url, "URL")?.to_string(),
            traffic,
            date,
        });
    }

    rows.sort_by(|a, b| b.traffic.cmp(&a.traffic));

    debug!(
        kept = rows.len(),
        dropped = table.rows.len() - rows.len(),
        null_dates,
        max_position,
        "applied position filter and normalized rows"
    );

    Ok(rows)
}

fn required_cell<'a>(row: &'a MergedRow, index: usize, column: &'static str) -> Result<&'a str> {
    row.cells[index]
        .as_deref()
        .ok_or_else(|| TransformError::MissingValue {
            input: row.origin.input.clone(),
            row: row.origin.row,
            column,
        })
}

fn parse_required_int(origin: &RowOrigin, column: &'static str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| TransformError::InvalidInteger {
            input: origin.input.clone(),
            row: origin.row,
            column,
            value: value.to_string(),
        })
}

/// Traffic cells may carry thousands separators ("1,200"). Strips them
/// before parsing; the error reports the raw cell as seen in the file.
fn parse_traffic(origin: &RowOrigin, value: &str) -> Result<i64> {
    let cleaned = value.replace(',', "");
    let traffic =
        cleaned
            .trim()
            .parse::<i64>()
            .map_err(|_| TransformError::InvalidInteger {
                input: origin.input.clone(),
                row: origin.row,
                column: "Traffic",
                value: value.to_string(),
            })?;
    if traffic < 0 {
        return Err(TransformError::NegativeTraffic {
            input: origin.input.clone(),
            row: origin.row,
            value: traffic,
        });
    }
    Ok(traffic)
}

static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%b %d, %Y", "%d %b %Y"];

/// Best-effort parse across the timestamp shapes the ranking exports
/// use. Returns `None` rather than failing: an unreadable timestamp
/// only nulls the derived date.
pub(crate) fn parse_report_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    None
}

/// Anchors an observation date to the 11th of its month so exports
/// taken on different days of the same month land in one cohort.
pub(crate) fn month_anchor(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 11)
}
