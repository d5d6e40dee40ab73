//! Fixed-shape grid holding one optional value per well.

use serde::{Deserialize, Serialize};

use crate::coords::{PlateShape, Well};
use crate::errors::{ErrorInfo, PlateError};

/// Anything that can be resolved to a well on a given plate shape.
pub trait WellRef {
    /// Resolves the reference, validating it against `shape`.
    fn resolve(&self, shape: PlateShape) -> Result<Well, PlateError>;
}

impl WellRef for Well {
    fn resolve(&self, shape: PlateShape) -> Result<Well, PlateError> {
        shape.well(self.row, self.col)
    }
}

impl WellRef for (usize, usize) {
    fn resolve(&self, shape: PlateShape) -> Result<Well, PlateError> {
        Well::from(*self).resolve(shape)
    }
}

impl WellRef for &str {
    fn resolve(&self, shape: PlateShape) -> Result<Well, PlateError> {
        shape.parse_label(self)
    }
}

impl WellRef for String {
    fn resolve(&self, shape: PlateShape) -> Result<Well, PlateError> {
        shape.parse_label(self)
    }
}

fn out_of_bounds(err: PlateError) -> PlateError {
    match err {
        PlateError::InvalidCoordinate(info) => {
            PlateError::OutOfBounds(ErrorInfo { code: "matrix.out_of_bounds".into(), ..info })
        }
        other => other,
    }
}

/// A rectangular grid of wells. Empty cells are `None`, distinct from any
/// stored value (including zero). The shape is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawWellMatrix<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct WellMatrix<T> {
    shape: PlateShape,
    cells: Vec<Option<T>>,
}

#[derive(Deserialize)]
struct RawWellMatrix<T> {
    shape: PlateShape,
    cells: Vec<Option<T>>,
}

impl<T> TryFrom<RawWellMatrix<T>> for WellMatrix<T> {
    type Error = String;

    fn try_from(raw: RawWellMatrix<T>) -> Result<Self, Self::Error> {
        if raw.cells.len() != raw.shape.well_count() {
            return Err(format!(
                "{} matrix needs {} cells, got {}",
                raw.shape,
                raw.shape.well_count(),
                raw.cells.len()
            ));
        }
        Ok(Self {
            shape: raw.shape,
            cells: raw.cells,
        })
    }
}

impl<T> WellMatrix<T> {
    /// Creates a matrix with every cell empty.
    pub fn empty(shape: PlateShape) -> Self {
        let mut cells = Vec::with_capacity(shape.well_count());
        cells.resize_with(shape.well_count(), || None);
        Self { shape, cells }
    }

    /// Creates an empty matrix for a 24- or 96-well plate.
    pub fn with_well_count(count: usize) -> Result<Self, PlateError> {
        PlateShape::from_well_count(count).map(Self::empty)
    }

    /// Fills wells in row-major order from `values`; the remainder stays empty.
    ///
    /// Fails with `OutOfBounds` when `values` holds more items than the plate.
    pub fn from_row_major<I>(shape: PlateShape, values: I) -> Result<Self, PlateError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut matrix = Self::empty(shape);
        for (idx, value) in values.into_iter().enumerate() {
            let slot = matrix.cells.get_mut(idx).ok_or_else(|| {
                PlateError::OutOfBounds(
                    ErrorInfo::new("matrix.overflow", "more values than wells")
                        .with_context("shape", shape.to_string()),
                )
            })?;
            *slot = Some(value);
        }
        Ok(matrix)
    }

    /// Plate shape of the matrix.
    pub fn shape(&self) -> PlateShape {
        self.shape
    }

    /// Returns the value at a well, `None` when the cell was never set.
    pub fn get(&self, well: impl WellRef) -> Result<Option<&T>, PlateError> {
        let idx = self.index(&well)?;
        Ok(self.cells[idx].as_ref())
    }

    /// Stores a value, returning the previous one.
    pub fn set(&mut self, well: impl WellRef, value: T) -> Result<Option<T>, PlateError> {
        let idx = self.index(&well)?;
        Ok(self.cells[idx].replace(value))
    }

    /// Empties a cell, returning its previous value.
    pub fn clear(&mut self, well: impl WellRef) -> Result<Option<T>, PlateError> {
        let idx = self.index(&well)?;
        Ok(self.cells[idx].take())
    }

    /// Coordinates of all non-empty cells in row-major order.
    pub fn non_empty(&self) -> Vec<Well> {
        self.iter().map(|(well, _)| well).collect()
    }

    /// Coordinates of non-empty cells whose value satisfies `predicate`.
    pub fn select<F>(&self, mut predicate: F) -> Vec<Well>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter()
            .filter(|(_, value)| predicate(value))
            .map(|(well, _)| well)
            .collect()
    }

    /// Non-empty cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Well, &T)> + '_ {
        self.shape
            .wells()
            .zip(self.cells.iter())
            .filter_map(|(well, cell)| cell.as_ref().map(|value| (well, value)))
    }

    /// Number of non-empty cells.
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Whether every cell is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Applies `f` to every non-empty cell, keeping the shape.
    pub fn map<U, F>(&self, mut f: F) -> WellMatrix<U>
    where
        F: FnMut(&T) -> U,
    {
        WellMatrix {
            shape: self.shape,
            cells: self.cells.iter().map(|cell| cell.as_ref().map(&mut f)).collect(),
        }
    }

    fn index(&self, well: &impl WellRef) -> Result<usize, PlateError> {
        let well = well.resolve(self.shape).map_err(out_of_bounds)?;
        Ok(well.row * self.shape.cols() + well.col)
    }
}

impl<T: Clone> WellMatrix<T> {
    /// Row-by-row copy with empty cells replaced by `sentinel`.
    pub fn to_rows(&self, sentinel: T) -> Vec<Vec<T>> {
        self.cells
            .chunks(self.shape.cols())
            .map(|row| {
                row.iter()
                    .map(|cell| cell.clone().unwrap_or_else(|| sentinel.clone()))
                    .collect()
            })
            .collect()
    }

    /// Same as [`WellMatrix::to_rows`] but re-chunked to `cols` columns per row.
    pub fn to_rows_with_width(&self, sentinel: T, cols: usize) -> Vec<Vec<T>> {
        let flat: Vec<T> = self
            .cells
            .iter()
            .map(|cell| cell.clone().unwrap_or_else(|| sentinel.clone()))
            .collect();
        flat.chunks(cols.max(1)).map(|row| row.to_vec()).collect()
    }

    /// Builds a matrix from nested rows, treating values matching `is_empty`
    /// as empty cells.
    pub fn from_rows<F>(shape: PlateShape, rows: &[Vec<T>], is_empty: F) -> Result<Self, PlateError>
    where
        F: Fn(&T) -> bool,
    {
        if rows.len() > shape.rows() || rows.iter().any(|row| row.len() > shape.cols()) {
            return Err(PlateError::OutOfBounds(
                ErrorInfo::new("matrix.rows", "nested rows exceed plate shape")
                    .with_context("shape", shape.to_string())
                    .with_context("rows", rows.len().to_string()),
            ));
        }
        let mut matrix = Self::empty(shape);
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !is_empty(value) {
                    matrix.set(Well::new(r, c), value.clone())?;
                }
            }
        }
        Ok(matrix)
    }
}
