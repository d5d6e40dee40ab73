use serde::{Deserialize, Serialize};

use crate::optical::OdForm;

/// Tunables of a calibration run, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationOpts {
    /// Which correction form is persisted as `vol_to_correction_factor`.
    #[serde(default)]
    pub od_form: OdForm,
    /// OD600 of the LUDOX reference measured on a reference spectrophotometer.
    #[serde(default = "default_reference_od600")]
    pub reference_od600: f64,
    /// Concentrations at or above this are outside the linear range of the reader.
    #[serde(default = "default_linear_limit_um")]
    pub linear_limit_um: f64,
    /// Fluorescein concentration in column 1 of the dilution series.
    #[serde(default = "default_starting_concentration_um")]
    pub starting_concentration_um: f64,
}

fn default_reference_od600() -> f64 {
    0.0425
}

fn default_linear_limit_um() -> f64 {
    25.0
}

fn default_starting_concentration_um() -> f64 {
    50.0
}

impl Default for CalibrationOpts {
    fn default() -> Self {
        Self {
            od_form: OdForm::default(),
            reference_od600: default_reference_od600(),
            linear_limit_um: default_linear_limit_um(),
            starting_concentration_um: default_starting_concentration_um(),
        }
    }
}
