use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::model::{SegmentRollup, TransformOutput};

/// Artifact names, shared by the CSV writers and the bundle.
pub const COMBINED_CSV: &str = "combined_output.csv";
pub const FULL_SEGMENT_CSV: &str = "full_segment_analysis.csv";
pub const PARTIAL_SEGMENT_CSV: &str = "partial_segment_analysis.csv";
pub const ARCHIVE_NAME: &str = "analysis_results.zip";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error while rendering output: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// One output rendered for display or CSV: a header plus rows of
/// display-formatted strings. Formatting decisions (thousands
/// separators, empty cells for null dates, JSON list cells) are made
/// here, never in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl OutputTable {
    /// Serializes the table as CSV with a header row. Cells containing
    /// commas or quotes are quoted per the usual CSV rules.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        let mut buffer = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            writer.write_record(&self.columns)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl TransformOutput {
    /// The combined rows rendered for export. The branded and segment
    /// columns appear exactly when the run enabled them, so an empty
    /// result still carries the right header.
    pub fn combined_table(&self) -> Result<OutputTable, ExportError> {
        let mut columns: Vec<String> = [
            "keyword",
            "position",
            "search_volume",
            "keyword_intents",
            "url",
            "traffic",
            "date",
        ]
        .iter()
        .map(|name| name.to_string())
        .collect();
        if self.branded_applied {
            columns.push("branded".to_string());
        }
        if self.include_segments {
            columns.push("segment".to_string());
        }

        let mut rows = Vec::with_capacity(self.combined.len());
        for row in &self.combined {
            let mut cells = vec![
                row.keyword.clone(),
                row.position.to_string(),
                row.search_volume.to_string(),
                row.keyword_intents.clone(),
                row.url.clone(),
                format_thousands(row.traffic),
                row.date
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ];
            if self.branded_applied {
                cells.push(row.branded.unwrap_or(false).to_string());
            }
            if self.include_segments {
                cells.push(row.segment.clone());
            }
            rows.push(cells);
        }

        Ok(OutputTable { columns, rows })
    }

    /// The full segment analysis rendered for export.
    pub fn full_segment_table(&self) -> Result<OutputTable, ExportError> {
        segment_table(&self.full_segments)
    }

    /// The partial segment analysis rendered for export.
    pub fn partial_segment_table(&self) -> Result<OutputTable, ExportError> {
        segment_table(&self.partial_segments)
    }
}

fn segment_table(rollups: &[SegmentRollup]) -> Result<OutputTable, ExportError> {
    let columns = ["segment", "traffic", "keyword", "url", "occurrences"]
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows = Vec::with_capacity(rollups.len());
    for rollup in rollups {
        rows.push(vec![
            rollup.segment.clone(),
            format_thousands(rollup.traffic),
            serde_json::to_string(&rollup.keywords)?,
            serde_json::to_string(&rollup.urls)?,
            rollup.occurrences.to_string(),
        ]);
    }

    Ok(OutputTable { columns, rows })
}

/// Bundles the three rendered CSVs into one deflate-compressed zip,
/// entirely in memory; callers decide where the bytes land.
pub fn bundle_archive(output: &TransformOutput) -> Result<Vec<u8>, ExportError> {
    let combined = output.combined_table()?.to_csv()?;
    let full = output.full_segment_table()?.to_csv()?;
    let partial = output.partial_segment_table()?.to_csv()?;

    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let mut zip = ZipWriter::new(&mut cursor);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(COMBINED_CSV, options)?;
        zip.write_all(combined.as_bytes())?;

        zip.start_file(FULL_SEGMENT_CSV, options)?;
        zip.write_all(full.as_bytes())?;

        zip.start_file(PARTIAL_SEGMENT_CSV, options)?;
        zip.write_all(partial.as_bytes())?;

        zip.finish()?;
    }
    Ok(buffer)
}

/// Inserts comma thousands separators for display ("1200" -> "1,200").
/// Display only: ordering is settled on the numeric values upstream.
pub(crate) fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
