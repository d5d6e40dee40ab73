use std::fs::File;
use std::io::Read;
use std::path::Path;

use ::csv::ReaderBuilder;
use log::{debug, info, warn};
use plate_core::{ErrorInfo, PlateError, PlateShape, WellMatrix};
use serde::{Deserialize, Serialize};

/// Column holding the well label in the reader's export.
pub const WELL_COLUMN: usize = 2;
/// Column holding the numeric reading in the reader's export.
pub const READING_COLUMN: usize = 3;
/// Exports with more data rows than this are read as 96-well plates.
const WELLS_24_MAX_ROWS: usize = 25;

/// A row that was dropped while parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number in the export, header included.
    pub line: usize,
    /// Why the row was dropped; always a `MalformedRow`.
    pub error: PlateError,
}

/// Readings of one export together with the rows that could not be used.
///
/// Wells without a reading are empty cells in `matrix`; persisted forms
/// write them as [`plate_core::NO_DATA`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPlate {
    /// Readings keyed by well.
    pub matrix: WellMatrix<f64>,
    /// Rows dropped during parsing.
    pub skipped: Vec<SkippedRow>,
}

/// Plate shape implied by the number of data rows in an export.
pub fn shape_for_data_rows(data_rows: usize) -> PlateShape {
    if data_rows > WELLS_24_MAX_ROWS {
        PlateShape::Wells96
    } else {
        PlateShape::Wells24
    }
}

fn malformed(line: usize, code: &str, message: impl Into<String>) -> SkippedRow {
    SkippedRow {
        line,
        error: PlateError::MalformedRow(
            ErrorInfo::new(code, message).with_context("line", line.to_string()),
        ),
    }
}

fn parse_record<S: AsRef<str>>(
    line: usize,
    record: &[S],
    matrix: &mut WellMatrix<f64>,
) -> Result<(), SkippedRow> {
    let label = record
        .get(WELL_COLUMN)
        .map(|cell| cell.as_ref().trim())
        .filter(|cell| !cell.is_empty())
        .ok_or_else(|| malformed(line, "csv.missing_well", "row has no well label"))?;
    let raw = record
        .get(READING_COLUMN)
        .map(|cell| cell.as_ref().trim())
        .unwrap_or_default();
    let reading = raw
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            let mut skipped = malformed(line, "csv.bad_reading", "reading is not a number");
            if let PlateError::MalformedRow(info) = &mut skipped.error {
                info.context.insert("well".into(), label.to_string());
                info.context.insert("reading".into(), raw.to_string());
            }
            skipped
        })?;
    let previous = matrix.set(label, reading).map_err(|err| {
        let mut skipped = malformed(line, "csv.bad_well", err.info().message.clone());
        if let PlateError::MalformedRow(info) = &mut skipped.error {
            info.context.insert("well".into(), label.to_string());
            info.context.insert("shape".into(), matrix.shape().to_string());
        }
        skipped
    })?;
    if previous.is_some() {
        debug!("line {line}: well {label} read twice, keeping the later reading");
    }
    Ok(())
}

/// Builds a well matrix from the rows of an export. The first row is a
/// header and is discarded; unusable rows are skipped and reported.
pub fn parse_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> ParsedPlate {
    let data_rows = rows.len().saturating_sub(1);
    let shape = shape_for_data_rows(data_rows);
    info!("export has {data_rows} data rows, reading as {shape} plate");
    let mut matrix = WellMatrix::empty(shape);
    let mut skipped = Vec::new();
    for (idx, row) in rows.iter().enumerate().skip(1) {
        if let Err(row) = parse_record(idx + 1, row, &mut matrix) {
            warn!("skipping export row: {}", row.error);
            skipped.push(row);
        }
    }
    ParsedPlate { matrix, skipped }
}

fn csv_error(code: &str, err: impl ToString) -> PlateError {
    PlateError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Reads a CSV export from `reader`. Only I/O and encoding failures are fatal.
pub fn parse_reader<R: Read>(reader: R) -> Result<ParsedPlate, PlateError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in csv.records() {
        let record = result.map_err(|err| csv_error("csv.read", err))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(parse_rows(&rows))
}

/// Reads a CSV export from disk.
pub fn parse_path(path: &Path) -> Result<ParsedPlate, PlateError> {
    let file = File::open(path).map_err(|err| {
        PlateError::Io(
            ErrorInfo::new("csv.open", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    parse_reader(file)
}
