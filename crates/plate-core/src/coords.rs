//! Conversion between alphanumeric well labels and zero-based coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, PlateError};

fn coordinate_error(code: &str, message: impl Into<String>) -> PlateError {
    PlateError::InvalidCoordinate(ErrorInfo::new(code, message))
}

/// Supported microplate geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlateShape {
    /// 4 rows by 6 columns.
    Wells24,
    /// 8 rows by 12 columns.
    Wells96,
}

impl PlateShape {
    /// Number of rows in the grid.
    pub const fn rows(self) -> usize {
        match self {
            PlateShape::Wells24 => 4,
            PlateShape::Wells96 => 8,
        }
    }

    /// Number of columns in the grid.
    pub const fn cols(self) -> usize {
        match self {
            PlateShape::Wells24 => 6,
            PlateShape::Wells96 => 12,
        }
    }

    /// Total number of wells.
    pub const fn well_count(self) -> usize {
        self.rows() * self.cols()
    }

    /// Selects a shape from its well count (24 or 96).
    pub fn from_well_count(count: usize) -> Result<Self, PlateError> {
        match count {
            24 => Ok(PlateShape::Wells24),
            96 => Ok(PlateShape::Wells96),
            other => Err(PlateError::OutOfBounds(
                ErrorInfo::new("coords.unsupported_size", "unsupported plate size")
                    .with_context("wells", other.to_string())
                    .with_hint("plates have either 24 or 96 wells"),
            )),
        }
    }

    /// Whether the well lies inside this shape.
    pub fn contains(self, well: Well) -> bool {
        well.row < self.rows() && well.col < self.cols()
    }

    /// Returns the well at `(row, col)` if it lies inside this shape.
    pub fn well(self, row: usize, col: usize) -> Result<Well, PlateError> {
        let well = Well::new(row, col);
        if self.contains(well) {
            Ok(well)
        } else {
            Err(PlateError::InvalidCoordinate(
                ErrorInfo::new("coords.out_of_range", "row/column outside plate shape")
                    .with_context("row", row.to_string())
                    .with_context("col", col.to_string())
                    .with_context("shape", self.to_string()),
            ))
        }
    }

    /// Renders `(row, col)` as an alphanumeric label such as `A1`.
    pub fn label(self, row: usize, col: usize) -> Result<String, PlateError> {
        self.well(row, col).map(|well| well.to_string())
    }

    /// Resolves a label such as `h12` to its coordinate. Case-insensitive.
    pub fn parse_label(self, label: &str) -> Result<Well, PlateError> {
        let trimmed = label.trim();
        let mut chars = trimmed.chars();
        let letter = chars
            .next()
            .filter(|ch| ch.is_ascii_alphabetic())
            .ok_or_else(|| {
                coordinate_error("coords.bad_label", "label must start with a row letter")
                    .with_label(trimmed)
            })?;
        let number: usize = chars.as_str().parse().map_err(|_| {
            coordinate_error("coords.bad_label", "label must end with a column number")
                .with_label(trimmed)
        })?;
        if number == 0 {
            return Err(
                coordinate_error("coords.bad_label", "column numbers start at 1").with_label(trimmed),
            );
        }
        let row = (letter.to_ascii_uppercase() as u8 - b'A') as usize;
        self.well(row, number - 1)
            .map_err(|_| {
                coordinate_error("coords.out_of_range", "label outside plate shape")
                    .with_label(trimmed)
            })
            .map_err(|err| err.with_shape(self))
    }

    /// Resolves every label in order. Fails on the first invalid label.
    pub fn parse_labels<I, S>(self, labels: I) -> Result<Vec<Well>, PlateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|label| self.parse_label(label.as_ref()))
            .collect()
    }

    /// Iterates over every well in row-major order.
    pub fn wells(self) -> impl Iterator<Item = Well> {
        let cols = self.cols();
        (0..self.well_count()).map(move |idx| Well::new(idx / cols, idx % cols))
    }

    /// Row-major index of a well inside this shape.
    pub fn index_of(self, well: Well) -> Result<usize, PlateError> {
        let well = self.well(well.row, well.col)?;
        Ok(well.row * self.cols() + well.col)
    }

    /// Well at the given row-major index.
    pub fn well_at(self, index: usize) -> Result<Well, PlateError> {
        if index >= self.well_count() {
            return Err(PlateError::OutOfBounds(
                ErrorInfo::new("coords.index", "well index outside plate shape")
                    .with_context("index", index.to_string())
                    .with_context("shape", self.to_string()),
            ));
        }
        Ok(Well::new(index / self.cols(), index % self.cols()))
    }
}

impl fmt::Display for PlateShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-well", self.well_count())
    }
}

trait CoordinateContext {
    fn with_label(self, label: &str) -> Self;
    fn with_shape(self, shape: PlateShape) -> Self;
}

impl CoordinateContext for PlateError {
    fn with_label(self, label: &str) -> Self {
        match self {
            PlateError::InvalidCoordinate(info) => {
                PlateError::InvalidCoordinate(info.with_context("label", label))
            }
            other => other,
        }
    }

    fn with_shape(self, shape: PlateShape) -> Self {
        match self {
            PlateError::InvalidCoordinate(info) => {
                PlateError::InvalidCoordinate(info.with_context("shape", shape.to_string()))
            }
            other => other,
        }
    }
}

/// A zero-based `(row, column)` position on a plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Well {
    /// Zero-based row index (`A` is 0).
    pub row: usize,
    /// Zero-based column index (`1` is 0).
    pub col: usize,
}

impl Well {
    /// Creates a coordinate without checking it against a shape.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Well {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = (b'A' + (self.row % 26) as u8) as char;
        write!(f, "{}{}", letter, self.col + 1)
    }
}

impl From<(usize, usize)> for Well {
    fn from((row, col): (usize, usize)) -> Self {
        Well::new(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_keeps_multi_digit_columns() {
        assert_eq!(PlateShape::Wells96.label(2, 9).unwrap(), "C10");
        assert_eq!(
            PlateShape::Wells96.parse_label(" c10 ").unwrap(),
            Well::new(2, 9)
        );
    }

    #[test]
    fn parse_label_rejects_zero_column() {
        let err = PlateShape::Wells96.parse_label("A0").unwrap_err();
        assert_eq!(err.info().code, "coords.bad_label");
    }
}
