#![deny(missing_docs)]
#![doc = "Synchronization of input cultures to target optical densities on a 96 deep-well plate."]

/// Run configuration.
pub mod config;
/// Fixed control wells.
pub mod controls;
/// Plan construction.
pub mod engine;
/// Associations written for the output plate.
pub mod record;

pub use config::{ControlConfig, ControlWells, SyncConfig, VolumePolicy};
pub use controls::{
    find_wild_type, gfp_control_volumes, inject_controls, ControlKind, ControlPlacement,
};
pub use engine::{
    actual_od, culture_volume_ul, diluent_volume_ul, group_means, select_wells, synchronize,
    InputCorrection, PlanRow, ReplicateGroup, SyncInputs, SyncPlan, TargetVolumes, OUTPUT_SHAPE,
};
pub use record::{record_actual_ods, sample_id_rows, ACTUAL_OD_ENTRY, ACTUAL_OD_KEY};
