use plate_core::{ErrorInfo, PlateError, PlateShape, Well};
use serde::{Deserialize, Serialize};

/// YAML-configurable parameters of a synchronization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Final ODs to dilute every culture to, in output order.
    #[serde(default = "default_target_ods")]
    pub target_ods: Vec<f64>,
    /// Volume of every output well, in mL.
    #[serde(default = "default_final_volume_ml")]
    pub final_volume_ml: f64,
    /// Wells per biological replicate group.
    #[serde(default = "default_bio_reps")]
    pub bio_reps: usize,
    /// Input row reserved for controls; never synchronized.
    #[serde(default = "default_control_row")]
    pub control_row: usize,
    /// What to do with culture volumes outside the output well volume.
    #[serde(default)]
    pub volume_policy: VolumePolicy,
    /// Control wells injected into the output plate; `null` disables them.
    #[serde(default = "default_controls")]
    pub controls: Option<ControlConfig>,
}

fn default_target_ods() -> Vec<f64> {
    vec![0.0003, 0.00015, 0.000075]
}

fn default_final_volume_ml() -> f64 {
    1.0
}

fn default_bio_reps() -> usize {
    3
}

fn default_control_row() -> usize {
    7
}

fn default_controls() -> Option<ControlConfig> {
    Some(ControlConfig::default())
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            target_ods: default_target_ods(),
            final_volume_ml: default_final_volume_ml(),
            bio_reps: default_bio_reps(),
            control_row: default_control_row(),
            volume_policy: VolumePolicy::default(),
            controls: default_controls(),
        }
    }
}

impl SyncConfig {
    /// Output well volume in µl.
    pub fn final_volume_ul(&self) -> f64 {
        self.final_volume_ml * 1000.0
    }

    /// Rejects configurations no plan can be built from.
    pub fn validate(&self) -> Result<(), PlateError> {
        let invalid = |message: &str| {
            PlateError::Serde(ErrorInfo::new("sync.config", message).with_hint(
                "check target_ods, final_volume_ml and bio_reps in the run configuration",
            ))
        };
        if self.bio_reps == 0 {
            return Err(invalid("bio_reps must be at least 1"));
        }
        if self.target_ods.is_empty() {
            return Err(invalid("at least one target OD is required"));
        }
        if self
            .target_ods
            .iter()
            .any(|od| !od.is_finite() || *od <= 0.0)
        {
            return Err(invalid("target ODs must be positive"));
        }
        if !self.final_volume_ml.is_finite() || self.final_volume_ml <= 0.0 {
            return Err(invalid("final_volume_ml must be positive"));
        }
        if let Some(controls) = &self.controls {
            controls.wells(PlateShape::Wells96)?;
        }
        Ok(())
    }
}

/// Handling of culture volumes outside `[0, final volume]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumePolicy {
    /// Keep the volume and list the well in the plan.
    #[default]
    Flag,
    /// Abort the run with `VolumeOutOfRange`.
    Reject,
}

/// Placement and identity of the fixed control wells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Sample ids recognised as wild type on the input plate.
    #[serde(default = "default_wt_sample_ids")]
    pub wt_sample_ids: Vec<u64>,
    /// Sample id written into the wild-type control wells.
    #[serde(default = "default_wt_control_sample_id")]
    pub wt_control_sample_id: u64,
    /// Output wells receiving wild-type cultures.
    #[serde(default = "default_wt_control_wells")]
    pub wt_control_wells: Vec<String>,
    /// Well holding the GFP control on both input and output plates.
    #[serde(default = "default_gfp_control_well")]
    pub gfp_control_well: String,
    /// Sample id written into the GFP control well.
    #[serde(default = "default_gfp_control_sample_id")]
    pub gfp_control_sample_id: u64,
    /// Final OD of the GFP control.
    #[serde(default = "default_gfp_target_od")]
    pub gfp_target_od: f64,
}

fn default_wt_sample_ids() -> Vec<u64> {
    vec![30, 22544, 22801]
}

fn default_wt_control_sample_id() -> u64 {
    22544
}

fn default_wt_control_wells() -> Vec<String> {
    vec!["H7".to_string(), "H8".to_string()]
}

fn default_gfp_control_well() -> String {
    "H9".to_string()
}

fn default_gfp_control_sample_id() -> u64 {
    6390
}

fn default_gfp_target_od() -> f64 {
    0.0003
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            wt_sample_ids: default_wt_sample_ids(),
            wt_control_sample_id: default_wt_control_sample_id(),
            wt_control_wells: default_wt_control_wells(),
            gfp_control_well: default_gfp_control_well(),
            gfp_control_sample_id: default_gfp_control_sample_id(),
            gfp_target_od: default_gfp_target_od(),
        }
    }
}

/// Control wells resolved against a plate shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlWells {
    /// Wild-type control destinations.
    pub wt: Vec<Well>,
    /// GFP control source and destination.
    pub gfp: Well,
}

impl ControlConfig {
    /// Resolves the configured labels.
    pub fn wells(&self, shape: PlateShape) -> Result<ControlWells, PlateError> {
        Ok(ControlWells {
            wt: shape.parse_labels(&self.wt_control_wells)?,
            gfp: shape.parse_label(&self.gfp_control_well)?,
        })
    }
}
