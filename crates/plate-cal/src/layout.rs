use plate_core::{PlateError, PlateShape, Well, WellMatrix};
use serde::{Deserialize, Serialize};

use crate::optical::{VolumeBucket, DILUTED_ROW, PURE_ROW};

/// PBS dispensed into every fluorescein well after the first column.
pub const PBS_VOLUME_UL: u32 = 100;
/// 50 µM fluorescein loaded into the first column before the serial dilution.
pub const FLUORESCEIN_SEED_UL: u32 = 200;

/// Reagent occupying a calibration plate well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalReagent {
    /// Fluorescein serial dilution, rows A-D.
    Fluorescein,
    /// LUDOX reference, row E.
    Ludox,
    /// Molecular grade water blank, row F.
    Water,
}

/// Reagent map of a fresh 96-well calibration plate. Rows G and H stay empty.
pub fn calibration_layout() -> Result<WellMatrix<CalReagent>, PlateError> {
    let mut layout = WellMatrix::empty(PlateShape::Wells96);
    for well in PlateShape::Wells96.wells() {
        let reagent = match well.row {
            0..=3 => CalReagent::Fluorescein,
            DILUTED_ROW => CalReagent::Ludox,
            PURE_ROW => CalReagent::Water,
            _ => continue,
        };
        layout.set(well, reagent)?;
    }
    Ok(layout)
}

/// LUDOX or water loaded into a zero-based column, in µl.
pub fn loading_volume_ul(col: usize) -> u32 {
    VolumeBucket::for_column(col).microliters()
}

/// Fluorescein wells that receive PBS before the serial dilution.
pub fn pbs_wells(layout: &WellMatrix<CalReagent>) -> Vec<Well> {
    layout
        .select(|reagent| *reagent == CalReagent::Fluorescein)
        .into_iter()
        .filter(|well| well.col != 0)
        .collect()
}

/// PBS to prepare for `wells` wells, in mL, with 100 µl spare.
pub fn pbs_required_ml(wells: usize) -> f64 {
    plate_core::round_to((wells as f64 + 1.0) * f64::from(PBS_VOLUME_UL) / 1000.0, 3)
}
