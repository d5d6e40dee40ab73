use std::collections::BTreeMap;

use log::info;
use plate_core::{AssociationStore, ErrorInfo, Owner, PlateError};
use serde_json::{json, Map, Value};

use crate::fluorescence::{fit_points, DilutionPoint, StandardCurve};
use crate::optical::{OdCorrection, OdForm, VolumeBucket};
use crate::opts::CalibrationOpts;

/// Fluorescein calibration data on the calibration plate.
pub const FLUORESCENCE_KEY: &str = "cal_fluorescence";
/// LUDOX calibration data on the calibration plate.
pub const OPTICAL_DENSITY_KEY: &str = "cal_optical_density";
/// Trendline string on the calibration plate.
pub const PLATE_CURVE_KEY: &str = "Fluorescence Standard Curve";
/// Trendline string on each plan.
pub const PLAN_CURVE_KEY: &str = "Fluorescence_Standard_Curve";
/// Correction factors, nested on the plate and top-level on plans.
pub const CORRECTION_KEY: &str = "vol_to_correction_factor";
/// Correction form on each plan, next to [`CORRECTION_KEY`].
pub const PLAN_FORM_KEY: &str = "vol_to_correction_form";
const CONCENTRATION_KEY: &str = "uM_to_data";
const FORM_KEY: &str = "form";

fn record_error(code: &str, message: &str, owner: Owner) -> PlateError {
    PlateError::Serde(ErrorInfo::new(code, message).with_context("owner", owner.to_string()))
}

/// Persists a fluorescein calibration on the plate and its trendline on
/// every plan.
pub fn record_fluorescence(
    store: &mut dyn AssociationStore,
    plate: Owner,
    plans: &[Owner],
    curve: &StandardCurve,
) -> Result<(), PlateError> {
    let readings: Map<String, Value> = curve
        .points
        .iter()
        .map(|point| (format!("{:?}", point.concentration_um), json!(point.mean_reading)))
        .collect();
    store.put(plate, FLUORESCENCE_KEY, json!({ CONCENTRATION_KEY: readings }))?;
    let trendline = curve.trendline();
    store.put(plate, PLATE_CURVE_KEY, json!(trendline))?;
    for plan in plans {
        store.put(*plan, PLAN_CURVE_KEY, json!(trendline))?;
    }
    info!("recorded fluorescein calibration on {plate} and {} plan(s)", plans.len());
    Ok(())
}

/// Persists LUDOX correction factors on the plate and every plan.
pub fn record_od(
    store: &mut dyn AssociationStore,
    plate: Owner,
    plans: &[Owner],
    correction: &OdCorrection,
) -> Result<(), PlateError> {
    let factors = Value::Object(
        correction
            .factors
            .iter()
            .map(|(bucket, factor)| (bucket.to_string(), json!(factor)))
            .collect(),
    );
    let form = plate_core::serde::to_canonical_value(&correction.form)?;
    store.put(
        plate,
        OPTICAL_DENSITY_KEY,
        json!({ CORRECTION_KEY: factors.clone(), FORM_KEY: form }),
    )?;
    for plan in plans {
        store.put(*plan, CORRECTION_KEY, factors.clone())?;
        store.put(*plan, PLAN_FORM_KEY, form.clone())?;
    }
    info!("recorded {:?} OD correction on {plate} and {} plan(s)", correction.form, plans.len());
    Ok(())
}

fn parse_form(form: Option<Value>) -> Result<OdForm, PlateError> {
    match form {
        Some(form) => plate_core::serde::from_json_value(form),
        None => Ok(OdForm::ReferenceRatio),
    }
}

/// Loads correction factors recorded by [`record_od`].
///
/// Plates carry the correction form next to the factors, plans under
/// [`PLAN_FORM_KEY`]. Records without a form are read as reference ratios.
pub fn load_od_corrections(
    store: &dyn AssociationStore,
    owner: Owner,
) -> Result<Option<OdCorrection>, PlateError> {
    let (factors, form) = match owner {
        Owner::Item(_) => {
            let Some(record) = store.get(owner, OPTICAL_DENSITY_KEY)? else {
                return Ok(None);
            };
            let factors = record.get(CORRECTION_KEY).cloned().ok_or_else(|| {
                record_error("cal.record_shape", "calibration record has no factors", owner)
            })?;
            (factors, parse_form(record.get(FORM_KEY).cloned())?)
        }
        Owner::Plan(_) => match store.get(owner, CORRECTION_KEY)? {
            Some(factors) => (factors, parse_form(store.get(owner, PLAN_FORM_KEY)?)?),
            None => return Ok(None),
        },
    };
    let entries = factors
        .as_object()
        .ok_or_else(|| record_error("cal.record_shape", "correction factors are not a map", owner))?;
    let mut parsed = BTreeMap::new();
    for (volume, factor) in entries {
        let volume = volume.parse::<u32>().map_err(|_| {
            record_error("cal.record_shape", "volume key is not a number", owner)
        })?;
        let factor = factor.as_f64().ok_or_else(|| {
            record_error("cal.record_shape", "correction factor is not a number", owner)
        })?;
        parsed.insert(VolumeBucket::from_microliters(volume)?, factor);
    }
    Ok(Some(OdCorrection {
        form,
        factors: parsed,
    }))
}

/// Refits the standard curve stored on a calibration plate.
pub fn load_standard_curve(
    store: &dyn AssociationStore,
    plate: Owner,
    opts: &CalibrationOpts,
) -> Result<Option<StandardCurve>, PlateError> {
    let Some(record) = store.get(plate, FLUORESCENCE_KEY)? else {
        return Ok(None);
    };
    let readings = record
        .get(CONCENTRATION_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| record_error("cal.record_shape", "calibration record has no readings", plate))?;
    let mut points = Vec::with_capacity(readings.len());
    for (concentration, reading) in readings {
        let concentration_um = concentration.parse::<f64>().map_err(|_| {
            record_error("cal.record_shape", "concentration key is not a number", plate)
        })?;
        let mean_reading = reading.as_f64().ok_or_else(|| {
            record_error("cal.record_shape", "reading is not a number", plate)
        })?;
        points.push(DilutionPoint {
            concentration_um,
            mean_reading,
        });
    }
    points.sort_by(|a, b| b.concentration_um.total_cmp(&a.concentration_um));
    fit_points(points, opts).map(Some)
}
