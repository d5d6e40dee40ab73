use log::info;
use plate_core::{AssociationStore, ErrorInfo, Owner, PlateError, WellMatrix, NO_DATA, NO_SAMPLE};
use serde_json::{json, Map, Value};

use crate::engine::SyncPlan;

/// Association key shared with later OD measurements.
pub const ACTUAL_OD_KEY: &str = "optical_density";
/// Entry holding the starting ODs of the output plate.
pub const ACTUAL_OD_ENTRY: &str = "0_hr_od";

/// Writes the plan's starting ODs onto the output plate, keeping any
/// timepoints already recorded under the same key.
pub fn record_actual_ods(
    store: &mut dyn AssociationStore,
    output: Owner,
    plan: &SyncPlan,
) -> Result<(), PlateError> {
    let mut merged = match store.get(output, ACTUAL_OD_KEY)? {
        Some(Value::Object(existing)) => existing,
        Some(_) | None => Map::new(),
    };
    merged.insert(ACTUAL_OD_ENTRY.to_string(), json!(plan.actual_od.to_rows(NO_DATA)));
    store.put(output, ACTUAL_OD_KEY, Value::Object(merged))?;
    info!("recorded {} starting ODs on {output}", plan.actual_od.filled());
    Ok(())
}

/// Sample id layout of the output plate with empty wells as [`NO_SAMPLE`].
///
/// Fails when a sample id does not fit the signed persisted form.
pub fn sample_id_rows(plan: &SyncPlan) -> Result<Vec<Vec<i64>>, PlateError> {
    let mut ids = WellMatrix::empty(plan.sample_ids.shape());
    for (well, id) in plan.sample_ids.iter() {
        let id = i64::try_from(*id).map_err(|_| {
            PlateError::Serde(
                ErrorInfo::new("sync.sample_id", "sample id too large to persist")
                    .with_context("well", well.to_string())
                    .with_context("sample_id", id.to_string()),
            )
        })?;
        ids.set(well, id)?;
    }
    Ok(ids.to_rows(NO_SAMPLE))
}
