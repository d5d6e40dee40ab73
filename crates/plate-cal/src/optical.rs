use std::collections::BTreeMap;
use std::fmt;

use log::info;
use plate_core::{round_to, ErrorInfo, PlateError, PlateShape, Well, WellMatrix};
use serde::{Deserialize, Serialize};

use crate::opts::CalibrationOpts;

/// Row holding the diluted LUDOX reference.
pub const DILUTED_ROW: usize = 4;
/// Row holding the pure reagent blank.
pub const PURE_ROW: usize = 5;

/// Loading volume shared by four consecutive columns of the calibration plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VolumeBucket {
    /// Columns 1-4.
    #[serde(rename = "100")]
    Ul100,
    /// Columns 5-8.
    #[serde(rename = "200")]
    Ul200,
    /// Columns 9-12.
    #[serde(rename = "300")]
    Ul300,
}

impl VolumeBucket {
    /// Buckets in column order.
    pub const ALL: [VolumeBucket; 3] = [VolumeBucket::Ul100, VolumeBucket::Ul200, VolumeBucket::Ul300];

    /// Loading volume in µl.
    pub fn microliters(self) -> u32 {
        match self {
            VolumeBucket::Ul100 => 100,
            VolumeBucket::Ul200 => 200,
            VolumeBucket::Ul300 => 300,
        }
    }

    /// Zero-based columns belonging to the bucket.
    pub fn columns(self) -> std::ops::Range<usize> {
        match self {
            VolumeBucket::Ul100 => 0..4,
            VolumeBucket::Ul200 => 4..8,
            VolumeBucket::Ul300 => 8..12,
        }
    }

    /// Bucket a zero-based column falls into; columns past 7 load 300 µl.
    pub fn for_column(col: usize) -> Self {
        match col {
            0..=3 => VolumeBucket::Ul100,
            4..=7 => VolumeBucket::Ul200,
            _ => VolumeBucket::Ul300,
        }
    }

    /// Resolves a volume in µl to its bucket.
    pub fn from_microliters(volume: u32) -> Result<Self, PlateError> {
        VolumeBucket::ALL
            .into_iter()
            .find(|bucket| bucket.microliters() == volume)
            .ok_or_else(|| {
                PlateError::Serde(
                    ErrorInfo::new("cal.volume_bucket", "no calibration bucket for volume")
                        .with_context("volume_ul", volume.to_string())
                        .with_hint("calibrated volumes are 100, 200 and 300 µl"),
                )
            })
    }
}

impl fmt::Display for VolumeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.microliters())
    }
}

/// How an optical density correction factor is derived and applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OdForm {
    /// `round(diluted_mean - pure_mean, 5)`, applied as an additive offset.
    BlankSubtracted,
    /// `round(reference_od600 / pure_mean, 4)`, applied as a multiplier.
    #[default]
    ReferenceRatio,
}

/// Mean reading of one row within a volume bucket.
///
/// Fails with `DivisionByZero` when none of the bucket's wells in that row
/// carries a reading.
pub fn bucket_mean(
    matrix: &WellMatrix<f64>,
    row: usize,
    bucket: VolumeBucket,
) -> Result<f64, PlateError> {
    if matrix.shape() != PlateShape::Wells96 {
        return Err(PlateError::OutOfBounds(
            ErrorInfo::new("cal.plate_shape", "calibration plates are 96-well")
                .with_context("shape", matrix.shape().to_string()),
        ));
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for col in bucket.columns() {
        if let Some(value) = matrix.get(Well::new(row, col))? {
            sum += value;
            count += 1;
        }
    }
    if count == 0 {
        return Err(PlateError::DivisionByZero(
            ErrorInfo::new("cal.empty_bucket", "no readings in volume bucket")
                .with_context("bucket", bucket.to_string())
                .with_context("row", ((b'A' + row as u8) as char).to_string()),
        ));
    }
    Ok(sum / count as f64)
}

/// Blank-subtracted offsets per bucket: `round(diluted_mean - pure_mean, 5)`.
pub fn blank_subtracted(matrix: &WellMatrix<f64>) -> Result<BTreeMap<VolumeBucket, f64>, PlateError> {
    VolumeBucket::ALL
        .into_iter()
        .map(|bucket| {
            let diluted = bucket_mean(matrix, DILUTED_ROW, bucket)?;
            let pure = bucket_mean(matrix, PURE_ROW, bucket)?;
            Ok((bucket, round_to(diluted - pure, 5)))
        })
        .collect()
}

/// Multiplicative factors per bucket: `round(reference_od600 / pure_mean, 4)`.
pub fn reference_ratios(
    matrix: &WellMatrix<f64>,
    reference_od600: f64,
) -> Result<BTreeMap<VolumeBucket, f64>, PlateError> {
    VolumeBucket::ALL
        .into_iter()
        .map(|bucket| {
            let pure = bucket_mean(matrix, PURE_ROW, bucket)?;
            if pure == 0.0 {
                return Err(PlateError::DivisionByZero(
                    ErrorInfo::new("cal.zero_reference", "pure reagent mean is zero")
                        .with_context("bucket", bucket.to_string()),
                ));
            }
            Ok((bucket, round_to(reference_od600 / pure, 4)))
        })
        .collect()
}

/// Correction factors of one form, keyed by volume bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdCorrection {
    /// How the factors were derived.
    pub form: OdForm,
    /// Factor per bucket.
    pub factors: BTreeMap<VolumeBucket, f64>,
}

impl OdCorrection {
    /// Computes the correction selected by `opts.od_form`.
    pub fn from_plate(matrix: &WellMatrix<f64>, opts: &CalibrationOpts) -> Result<Self, PlateError> {
        let factors = match opts.od_form {
            OdForm::BlankSubtracted => blank_subtracted(matrix)?,
            OdForm::ReferenceRatio => reference_ratios(matrix, opts.reference_od600)?,
        };
        info!(
            "{:?} OD correction: {}",
            opts.od_form,
            factors
                .iter()
                .map(|(bucket, factor)| format!("{bucket}ul={factor}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self {
            form: opts.od_form,
            factors,
        })
    }

    /// Factor recorded for `bucket`.
    pub fn factor(&self, bucket: VolumeBucket) -> Result<f64, PlateError> {
        self.factors.get(&bucket).copied().ok_or_else(|| {
            PlateError::DivisionByZero(
                ErrorInfo::new("cal.missing_factor", "no correction factor for bucket")
                    .with_context("bucket", bucket.to_string()),
            )
        })
    }

    /// Corrects one reading taken at the bucket's volume.
    pub fn apply(&self, reading: f64, bucket: VolumeBucket) -> Result<f64, PlateError> {
        let factor = self.factor(bucket)?;
        Ok(match self.form {
            OdForm::BlankSubtracted => reading + factor,
            OdForm::ReferenceRatio => reading * factor,
        })
    }

    /// Corrects every reading of a matrix.
    pub fn apply_matrix(
        &self,
        readings: &WellMatrix<f64>,
        bucket: VolumeBucket,
    ) -> Result<WellMatrix<f64>, PlateError> {
        let factor = self.factor(bucket)?;
        Ok(readings.map(|reading| match self.form {
            OdForm::BlankSubtracted => reading + factor,
            OdForm::ReferenceRatio => reading * factor,
        }))
    }
}
