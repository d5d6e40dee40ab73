#![deny(missing_docs)]
#![doc = "Calibration of plate reader readings against fluorescein and LUDOX reference plates."]

/// Calibration plate age policy.
pub mod age;
/// Fluorescein standard curve fitting.
pub mod fluorescence;
/// Reagent placement on the calibration plate.
pub mod layout;
/// Optical density correction factors.
pub mod optical;
/// Calibration options.
pub mod opts;
/// Calibration persistence records.
pub mod record;

pub use age::{expiry_date, is_expired, parse_created, DATE_FORMAT};
pub use fluorescence::{
    dilution_series, fit_points, fit_standard_curve, DilutionPoint, StandardCurve,
};
pub use layout::{
    calibration_layout, loading_volume_ul, pbs_required_ml, pbs_wells, CalReagent,
    FLUORESCEIN_SEED_UL, PBS_VOLUME_UL,
};
pub use optical::{
    blank_subtracted, bucket_mean, reference_ratios, OdCorrection, OdForm, VolumeBucket,
    DILUTED_ROW, PURE_ROW,
};
pub use opts::CalibrationOpts;
pub use record::{
    load_od_corrections, load_standard_curve, record_fluorescence, record_od, CORRECTION_KEY,
    FLUORESCENCE_KEY, OPTICAL_DENSITY_KEY, PLAN_CURVE_KEY, PLAN_FORM_KEY, PLATE_CURVE_KEY,
};
