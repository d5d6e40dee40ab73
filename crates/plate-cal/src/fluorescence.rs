use log::{debug, info};
use plate_core::{round_to, ErrorInfo, PlateError, PlateShape, Well, WellMatrix};
use serde::{Deserialize, Serialize};

use crate::opts::CalibrationOpts;

/// Rows holding the fluorescein dilution series.
pub const SERIES_ROWS: std::ops::Range<usize> = 0..4;

/// Mean reading of one concentration of the dilution series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DilutionPoint {
    /// Fluorescein concentration in µM.
    pub concentration_um: f64,
    /// Mean of the replicate readings, unrounded.
    pub mean_reading: f64,
}

/// Least-squares fit of reading against concentration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardCurve {
    /// Slope, rounded to 3 places.
    pub slope: f64,
    /// Intercept, rounded to 3 places.
    pub intercept: f64,
    /// Coefficient of determination of the reported line, rounded to 4 places.
    pub r_squared: f64,
    /// Every point of the series, including those excluded from the fit.
    pub points: Vec<DilutionPoint>,
    /// Number of points inside the linear range.
    pub fitted_points: usize,
}

impl StandardCurve {
    /// Human readable trendline, e.g. `y = 3x + 10  (R^2 = 1)`.
    pub fn trendline(&self) -> String {
        format!(
            "y = {}x + {}  (R^2 = {})",
            self.slope, self.intercept, self.r_squared
        )
    }

    /// Concentration in µM corresponding to a fluorescence reading.
    pub fn concentration_um(&self, reading: f64) -> Result<f64, PlateError> {
        if self.slope == 0.0 {
            return Err(PlateError::DivisionByZero(ErrorInfo::new(
                "cal.flat_curve",
                "standard curve has zero slope",
            )));
        }
        Ok((reading - self.intercept) / self.slope)
    }
}

fn require_96(matrix: &WellMatrix<f64>) -> Result<(), PlateError> {
    if matrix.shape() != PlateShape::Wells96 {
        return Err(PlateError::OutOfBounds(
            ErrorInfo::new("cal.plate_shape", "calibration plates are 96-well")
                .with_context("shape", matrix.shape().to_string()),
        ));
    }
    Ok(())
}

/// Averages the four fluorescein replicates of every column. Column `j`
/// holds `starting_concentration_um / 2^j`.
///
/// Fails with `DivisionByZero` when a column has no readings.
pub fn dilution_series(
    matrix: &WellMatrix<f64>,
    opts: &CalibrationOpts,
) -> Result<Vec<DilutionPoint>, PlateError> {
    require_96(matrix)?;
    let mut points = Vec::with_capacity(matrix.shape().cols());
    for col in 0..matrix.shape().cols() {
        let concentration_um = opts.starting_concentration_um / 2f64.powi(col as i32);
        let mut readings = Vec::with_capacity(SERIES_ROWS.len());
        for row in SERIES_ROWS {
            if let Some(value) = matrix.get(Well::new(row, col))? {
                readings.push(*value);
            }
        }
        if readings.is_empty() {
            return Err(PlateError::DivisionByZero(
                ErrorInfo::new("cal.empty_bucket", "no fluorescein readings for concentration")
                    .with_context("concentration_um", concentration_um.to_string())
                    .with_context("column", (col + 1).to_string()),
            ));
        }
        let mean_reading = readings.iter().sum::<f64>() / readings.len() as f64;
        debug!("{concentration_um} uM: mean of {} readings = {mean_reading}", readings.len());
        points.push(DilutionPoint {
            concentration_um,
            mean_reading,
        });
    }
    Ok(points)
}

/// Fits the fluorescein standard curve using only concentrations below
/// `opts.linear_limit_um`.
pub fn fit_standard_curve(
    matrix: &WellMatrix<f64>,
    opts: &CalibrationOpts,
) -> Result<StandardCurve, PlateError> {
    fit_points(dilution_series(matrix, opts)?, opts)
}

/// Fits a standard curve through already averaged points.
pub fn fit_points(
    points: Vec<DilutionPoint>,
    opts: &CalibrationOpts,
) -> Result<StandardCurve, PlateError> {
    let fitted: Vec<(f64, f64)> = points
        .iter()
        .filter(|point| point.concentration_um < opts.linear_limit_um)
        .map(|point| (point.concentration_um, point.mean_reading))
        .collect();
    let undefined = |code: &str, message: &str| {
        PlateError::DivisionByZero(
            ErrorInfo::new(code, message)
                .with_context("fitted_points", fitted.len().to_string())
                .with_context("linear_limit_um", opts.linear_limit_um.to_string()),
        )
    };
    if fitted.len() < 2 {
        return Err(undefined(
            "cal.underdetermined",
            "fewer than two concentrations inside the linear range",
        ));
    }

    let n = fitted.len() as f64;
    let x_mean = fitted.iter().map(|(x, _)| x).sum::<f64>() / n;
    let y_mean = fitted.iter().map(|(_, y)| y).sum::<f64>() / n;
    let sxx: f64 = fitted.iter().map(|(x, _)| (x - x_mean).powi(2)).sum();
    let sxy: f64 = fitted
        .iter()
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();
    if sxx == 0.0 {
        return Err(undefined("cal.singular_fit", "concentrations do not vary"));
    }
    let slope = round_to(sxy / sxx, 3);
    let intercept = round_to(y_mean - (sxy / sxx) * x_mean, 3);

    let sst: f64 = fitted.iter().map(|(_, y)| (y - y_mean).powi(2)).sum();
    if sst == 0.0 {
        return Err(undefined("cal.flat_readings", "readings do not vary"));
    }
    let ssr: f64 = fitted
        .iter()
        .map(|(x, _)| (slope * x + intercept - y_mean).powi(2))
        .sum();

    let curve = StandardCurve {
        slope,
        intercept,
        r_squared: round_to(ssr / sst, 4),
        points,
        fitted_points: fitted.len(),
    };
    info!("fluorescein standard curve: {}", curve.trendline());
    Ok(curve)
}
