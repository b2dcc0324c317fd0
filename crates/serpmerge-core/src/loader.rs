use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{Result, TransformError};
use crate::model::{MergedRow, MergedTable, RawTable, RowOrigin, TableInput, REQUIRED_COLUMNS};

/// Parses one report into a header plus raw string rows and verifies the
/// required columns are present. Extra columns are kept.
pub fn parse_table(input: &TableInput) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.contents.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|source| TransformError::Csv {
            input: input.name.clone(),
            source,
        })?
        .iter()
        .map(|field| field.to_string())
        .collect();

    for column in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| c == column) {
            return Err(TransformError::MissingColumn {
                input: input.name.clone(),
                column,
            });
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| TransformError::Csv {
            input: input.name.clone(),
            source,
        })?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }

    debug!(input = %input.name, rows = rows.len(), columns = columns.len(), "parsed report table");

    Ok(RawTable {
        name: input.name.clone(),
        columns,
        rows,
    })
}

/// Concatenates the reports on the union of their columns, in input
/// order, and drops exact-duplicate rows keeping the first occurrence.
pub fn merge_inputs(inputs: &[TableInput]) -> Result<MergedTable> {
    if inputs.is_empty() {
        return Err(TransformError::NoInput);
    }

    let mut tables = Vec::with_capacity(inputs.len());
    for input in inputs {
        tables.push(parse_table(input)?);
    }

    // Union schema in first-seen order so every row aligns to one column
    // list regardless of which input it came from.
    let mut columns: Vec<String> = Vec::new();
    for table in &tables {
        for column in &table.columns {
            if !columns.iter().any(|c| c == column) {
                columns.push(column.clone());
            }
        }
    }

    let mut seen: HashSet<Vec<Option<String>>> = HashSet::new();
    let mut rows: Vec<MergedRow> = Vec::new();
    let mut duplicates = 0usize;

    for table in &tables {
        let mapping: Vec<Option<usize>> = columns
            .iter()
            .map(|column| table.columns.iter().position(|c| c == column))
            .collect();

        for (row_index, row) in table.rows.iter().enumerate() {
            let cells: Vec<Option<String>> = mapping
                .iter()
                .map(|slot| slot.map(|index| row[index].clone()))
                .collect();

            // Duplicate detection compares cell content only, never the
            // origin, so identical rows across files collapse too.
            if !seen.insert(cells.clone()) {
                duplicates += 1;
                continue;
            }

            rows.push(MergedRow {
                origin: RowOrigin {
                    input: table.name.clone(),
                    row: row_index + 1,
                },
                cells,
            });
        }
    }

    info!(
        inputs = inputs.len(),
        rows = rows.len(),
        duplicates,
        "merged report tables"
    );

    Ok(MergedTable { columns, rows })
}
