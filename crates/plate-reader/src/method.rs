use std::fmt;
use std::str::FromStr;

use plate_core::{ErrorInfo, PlateError};
use serde::{Deserialize, Serialize};

/// Measurement exported from the plate reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssayMethod {
    /// Optical density at 600 nm of an experimental plate.
    Od,
    /// GFP fluorescence (485/20 excitation, 516/20 emission) of an experimental plate.
    Gfp,
    /// Optical density of the calibration plate.
    CalOd,
    /// Fluorescein fluorescence of the calibration plate.
    CalGfp,
}

impl AssayMethod {
    /// Every method in export order.
    pub const ALL: [AssayMethod; 4] = [
        AssayMethod::Od,
        AssayMethod::Gfp,
        AssayMethod::CalOd,
        AssayMethod::CalGfp,
    ];

    /// Short name used in upload names and association keys.
    pub fn as_str(self) -> &'static str {
        match self {
            AssayMethod::Od => "od",
            AssayMethod::Gfp => "gfp",
            AssayMethod::CalOd => "cal_od",
            AssayMethod::CalGfp => "cal_gfp",
        }
    }

    /// Data set label the reader software gives this read.
    pub fn data_type(self) -> &'static str {
        match self {
            AssayMethod::Od => "Blank Read 1:600",
            AssayMethod::Gfp => "Blank Read 2:485/20,516/20",
            AssayMethod::CalOd => "Read 1:600",
            AssayMethod::CalGfp => "Read 2:485/20,516/20",
        }
    }

    /// Human readable description.
    pub fn description(self) -> &'static str {
        match self {
            AssayMethod::Od => "Optical Density",
            AssayMethod::Gfp => "Fluorescence",
            AssayMethod::CalOd => "Calibration Optical Density",
            AssayMethod::CalGfp => "Calibration Fluorescence",
        }
    }

    /// Whether the reading comes from the calibration plate.
    pub fn is_calibration(self) -> bool {
        matches!(self, AssayMethod::CalOd | AssayMethod::CalGfp)
    }

    /// Whether the reading is a fluorescence read.
    pub fn is_fluorescence(self) -> bool {
        matches!(self, AssayMethod::Gfp | AssayMethod::CalGfp)
    }

    /// Association key the processed data is stored under.
    pub fn association_key(self) -> &'static str {
        match self {
            AssayMethod::Od => "optical_density",
            AssayMethod::Gfp => "gfp_fluorescence",
            AssayMethod::CalOd => "cal_optical_density",
            AssayMethod::CalGfp => "cal_fluorescence",
        }
    }
}

impl fmt::Display for AssayMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssayMethod {
    type Err = PlateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        AssayMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == lowered)
            .ok_or_else(|| {
                PlateError::Serde(
                    ErrorInfo::new("method.unknown", "unknown assay method")
                        .with_context("method", value)
                        .with_hint("expected one of od, gfp, cal_od, cal_gfp"),
                )
            })
    }
}

/// How an uploaded export should be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "method", rename_all = "snake_case")]
pub enum UploadKind {
    /// Calibration plate readings feeding the calibration engine.
    Calibration(AssayMethod),
    /// Experimental readings recorded against a timepoint.
    Measurement(AssayMethod),
}

impl UploadKind {
    /// Classifies an upload by its file name. Only `.csv` exports are
    /// accepted; names containing `cal` are calibration reads, and the
    /// assay is fluorescence when the name mentions `gfp`, optical density
    /// when it mentions `od`.
    pub fn classify(name: &str) -> Result<Self, PlateError> {
        let lowered = name.to_ascii_lowercase();
        let is_csv = lowered
            .rsplit_once('.')
            .map(|(_, ext)| ext == "csv")
            .unwrap_or(false);
        if !is_csv {
            return Err(PlateError::Serde(
                ErrorInfo::new("upload.extension", "uploads must be CSV exports")
                    .with_context("name", name),
            ));
        }
        let calibration = lowered.contains("cal");
        let fluorescence = if lowered.contains("gfp") {
            true
        } else if lowered.contains("od") {
            false
        } else {
            return Err(PlateError::Serde(
                ErrorInfo::new("upload.method", "upload name does not name an assay")
                    .with_context("name", name)
                    .with_hint("include `od` or `gfp` in the export name"),
            ));
        };
        Ok(match (calibration, fluorescence) {
            (true, true) => UploadKind::Calibration(AssayMethod::CalGfp),
            (true, false) => UploadKind::Calibration(AssayMethod::CalOd),
            (false, true) => UploadKind::Measurement(AssayMethod::Gfp),
            (false, false) => UploadKind::Measurement(AssayMethod::Od),
        })
    }

    /// Assay carried by the upload.
    pub fn method(self) -> AssayMethod {
        match self {
            UploadKind::Calibration(method) | UploadKind::Measurement(method) => method,
        }
    }
}
