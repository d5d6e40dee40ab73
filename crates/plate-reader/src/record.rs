use log::info;
use plate_core::{AssociationStore, ErrorInfo, Owner, PlateError, PlateShape, WellMatrix, NO_DATA};
use serde_json::{json, Map, Value};

use crate::method::AssayMethod;

/// Key of a timepoint inside a measurement association, e.g. `2_hr`.
pub fn timepoint_key(timepoint: u32) -> String {
    format!("{timepoint}_hr")
}

fn experimental(method: AssayMethod) -> Result<(), PlateError> {
    if method.is_calibration() {
        return Err(PlateError::Serde(
            ErrorInfo::new(
                "record.calibration_method",
                "calibration reads are recorded by the calibration engine",
            )
            .with_context("method", method.as_str()),
        ));
    }
    Ok(())
}

/// Records the readings of one timepoint on `item`.
///
/// The readings are laid out as rows of the target collection; empty wells
/// are written as [`NO_DATA`]. Timepoints already stored under the same
/// association key are kept.
pub fn record_measurement(
    store: &mut dyn AssociationStore,
    item: Owner,
    method: AssayMethod,
    timepoint: u32,
    readings: &WellMatrix<f64>,
    collection: PlateShape,
) -> Result<(), PlateError> {
    experimental(method)?;
    let rows: Vec<Vec<f64>> = readings
        .to_rows_with_width(NO_DATA, collection.cols())
        .into_iter()
        .take(collection.rows())
        .collect();
    let key = method.association_key();
    let mut merged = match store.get(item, key)? {
        Some(Value::Object(existing)) => existing,
        Some(_) | None => Map::new(),
    };
    merged.insert(timepoint_key(timepoint), json!(rows));
    info!(
        "recorded {} {} readings for {item} at {}",
        readings.filled(),
        method,
        timepoint_key(timepoint)
    );
    store.put(item, key, Value::Object(merged))
}

/// Loads the readings recorded for `item` at `timepoint`, if any.
pub fn load_measurement(
    store: &dyn AssociationStore,
    item: Owner,
    method: AssayMethod,
    timepoint: u32,
    collection: PlateShape,
) -> Result<Option<WellMatrix<f64>>, PlateError> {
    experimental(method)?;
    let Some(value) = store.get(item, method.association_key())? else {
        return Ok(None);
    };
    let Some(entry) = value.get(timepoint_key(timepoint)) else {
        return Ok(None);
    };
    let rows: Vec<Vec<f64>> = plate_core::serde::from_json_value(entry.clone())?;
    WellMatrix::from_rows(collection, &rows, |value| *value == NO_DATA).map(Some)
}
