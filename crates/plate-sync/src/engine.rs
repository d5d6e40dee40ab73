use log::{debug, info, warn};
use plate_cal::{OdCorrection, VolumeBucket};
use plate_core::{
    round_to, stable_hash_string, ErrorInfo, PlateError, PlateShape, Well, WellMatrix,
};
use serde::{Deserialize, Serialize};

use crate::config::{SyncConfig, VolumePolicy};
use crate::controls::{inject_controls, ControlPlacement};

/// Output plates are 96 deep-well blocks.
pub const OUTPUT_SHAPE: PlateShape = PlateShape::Wells96;
/// Cultures are diluted 1:10 before transfer; volumes also convert mL to µl.
const DILUTION_TO_UL: f64 = 10_000.0;

/// A calibration applied to the input ODs before planning.
#[derive(Debug, Clone, PartialEq)]
pub struct InputCorrection {
    /// Factors from a prior LUDOX calibration.
    pub correction: OdCorrection,
    /// Volume the input plate was read at.
    pub bucket: VolumeBucket,
}

/// Measurements of the input plate.
#[derive(Debug, Clone, Copy)]
pub struct SyncInputs<'a> {
    /// Sample id of every occupied input well.
    pub samples: &'a WellMatrix<u64>,
    /// OD600 readings of the input plate.
    pub ods: &'a WellMatrix<f64>,
    /// Optional correction applied to `ods`.
    pub correction: Option<&'a InputCorrection>,
}

/// Consecutive selected wells averaged together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateGroup {
    /// Member wells in selection order.
    pub wells: Vec<Well>,
    /// Mean OD of the members.
    pub mean_od: f64,
}

/// Volumes for every replicate group at one target OD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetVolumes {
    /// Target OD.
    pub target_od: f64,
    /// Culture volume per group, µl.
    pub culture_ul: Vec<f64>,
    /// Diluent volume per group, µl.
    pub diluent_ul: Vec<f64>,
}

/// Everything needed to fill and inoculate the output plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Target ODs in output order.
    pub targets: Vec<f64>,
    /// Output well volume, mL.
    pub final_volume_ml: f64,
    /// Wells per replicate group.
    pub bio_reps: usize,
    /// Synchronized input wells in row-major order.
    pub selected: Vec<Well>,
    /// Replicate groups over `selected`.
    pub groups: Vec<ReplicateGroup>,
    /// Per-target group volumes.
    pub volumes: Vec<TargetVolumes>,
    /// Culture to transfer into each output well, µl.
    pub culture_ul: WellMatrix<f64>,
    /// Diluent to pre-fill each output well with, µl.
    pub diluent_ul: WellMatrix<f64>,
    /// Sample id of each output well.
    pub sample_ids: WellMatrix<u64>,
    /// Input well each output well is inoculated from.
    pub sources: WellMatrix<Well>,
    /// OD each output well starts at, computed before controls are placed.
    pub actual_od: WellMatrix<f64>,
    /// Control wells written over the expansion.
    pub controls: Vec<ControlPlacement>,
    /// Output wells whose culture volume lies outside the well volume.
    pub out_of_range: Vec<Well>,
    /// Recoverable problems found while planning.
    pub warnings: Vec<PlateError>,
}

/// One output well, as written to the run table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRow {
    /// Output well label.
    pub well: String,
    /// Input well label.
    pub source: String,
    /// Sample id.
    pub sample_id: u64,
    /// Culture volume, µl.
    pub culture_ul: f64,
    /// Diluent volume, µl.
    pub diluent_ul: f64,
    /// Starting OD, absent for control wells.
    pub actual_od: Option<f64>,
}

/// Culture volume bringing a culture at `mean_od` to `target_od` in
/// `final_volume_ml`. Zero when the culture has no measurable OD.
pub fn culture_volume_ul(target_od: f64, final_volume_ml: f64, mean_od: f64) -> f64 {
    if mean_od == 0.0 {
        return 0.0;
    }
    (target_od * final_volume_ml / mean_od) * DILUTION_TO_UL
}

/// Diluent topping `culture_ul` up to the well volume, whole µl.
pub fn diluent_volume_ul(culture_ul: f64, final_volume_ul: f64) -> f64 {
    if culture_ul == 0.0 {
        return 0.0;
    }
    (final_volume_ul - culture_ul).round()
}

/// Starting OD of a well inoculated with `culture_ul` of a culture at `input_od`.
pub fn actual_od(input_od: f64, culture_ul: f64, final_volume_ml: f64) -> f64 {
    round_to((input_od * (culture_ul / 1000.0)) / final_volume_ml, 6)
}

/// Occupied input wells outside the control row, row-major.
pub fn select_wells(samples: &WellMatrix<u64>, control_row: usize) -> Vec<Well> {
    samples
        .non_empty()
        .into_iter()
        .filter(|well| well.row != control_row)
        .collect()
}

/// Partitions `selected` into consecutive groups of `bio_reps` and averages
/// their readings. A short final group is averaged over its members and
/// reported as a warning.
pub fn group_means(
    selected: &[Well],
    readings: &[f64],
    bio_reps: usize,
) -> (Vec<ReplicateGroup>, Option<PlateError>) {
    let groups: Vec<ReplicateGroup> = selected
        .chunks(bio_reps.max(1))
        .zip(readings.chunks(bio_reps.max(1)))
        .map(|(wells, ods)| ReplicateGroup {
            wells: wells.to_vec(),
            mean_od: ods.iter().sum::<f64>() / ods.len() as f64,
        })
        .collect();
    let remainder = selected.len() % bio_reps.max(1);
    let warning = (remainder != 0).then(|| {
        PlateError::UnresolvedReplicateGrouping(
            ErrorInfo::new("sync.short_group", "last replicate group is short")
                .with_context("selected", selected.len().to_string())
                .with_context("bio_reps", bio_reps.to_string())
                .with_context("last_group", remainder.to_string()),
        )
    });
    (groups, warning)
}

fn corrected_ods(inputs: &SyncInputs<'_>) -> Result<WellMatrix<f64>, PlateError> {
    match inputs.correction {
        Some(applied) => applied.correction.apply_matrix(inputs.ods, applied.bucket),
        None => Ok(inputs.ods.clone()),
    }
}

pub(crate) fn reading_at(ods: &WellMatrix<f64>, well: Well) -> Result<f64, PlateError> {
    ods.get(well)?.copied().ok_or_else(|| {
        PlateError::DivisionByZero(
            ErrorInfo::new("sync.missing_od", "culture well has no OD reading")
                .with_context("well", well.to_string()),
        )
    })
}

pub(crate) fn check_volume(
    plan: &mut SyncPlan,
    policy: VolumePolicy,
    well: Well,
    culture_ul: f64,
) -> Result<(), PlateError> {
    let limit = plan.final_volume_ml * 1000.0;
    if (0.0..=limit).contains(&culture_ul) {
        return Ok(());
    }
    let info = ErrorInfo::new("sync.volume_out_of_range", "culture volume exceeds the well")
        .with_context("well", well.to_string())
        .with_context("culture_ul", culture_ul.to_string())
        .with_context("limit_ul", limit.to_string());
    match policy {
        VolumePolicy::Reject => Err(PlateError::VolumeOutOfRange(
            info.with_hint("use a denser input culture or a lower target OD"),
        )),
        VolumePolicy::Flag => {
            warn!("{well}: culture volume {culture_ul:.1} µl outside 0-{limit} µl");
            plan.out_of_range.push(well);
            Ok(())
        }
    }
}

/// Builds the synchronization plan for one input plate.
pub fn synchronize(inputs: SyncInputs<'_>, config: &SyncConfig) -> Result<SyncPlan, PlateError> {
    config.validate()?;
    if inputs.samples.shape() != inputs.ods.shape() {
        return Err(PlateError::OutOfBounds(
            ErrorInfo::new("sync.shape_mismatch", "sample and OD matrices differ in shape")
                .with_context("samples", inputs.samples.shape().to_string())
                .with_context("ods", inputs.ods.shape().to_string()),
        ));
    }
    if let Some(controls) = &config.controls {
        let shape = inputs.samples.shape();
        if !shape.contains(controls.wells(OUTPUT_SHAPE)?.gfp) {
            return Err(PlateError::OutOfBounds(
                ErrorInfo::new("sync.control_shape", "GFP control well is not on the input plate")
                    .with_context("well", controls.gfp_control_well.clone())
                    .with_context("input", shape.to_string())
                    .with_hint("set `controls: null` or place the GFP control on the input plate"),
            ));
        }
    }
    let ods = corrected_ods(&inputs)?;
    let selected = select_wells(inputs.samples, config.control_row);
    let readings = selected
        .iter()
        .map(|well| reading_at(&ods, *well))
        .collect::<Result<Vec<_>, _>>()?;

    let expanded = selected.len() * config.target_ods.len();
    if expanded > OUTPUT_SHAPE.well_count() {
        return Err(PlateError::OutOfBounds(
            ErrorInfo::new("sync.plate_overflow", "cultures do not fit on the output plate")
                .with_context("selected", selected.len().to_string())
                .with_context("targets", config.target_ods.len().to_string())
                .with_hint("reduce the number of target ODs or split the input plate"),
        ));
    }

    let (groups, warning) = group_means(&selected, &readings, config.bio_reps);
    for (idx, group) in groups.iter().enumerate() {
        debug!("group {idx}: {} wells, mean OD {}", group.wells.len(), group.mean_od);
    }
    let final_volume_ul = config.final_volume_ul();
    let volumes: Vec<TargetVolumes> = config
        .target_ods
        .iter()
        .map(|target| {
            let culture_ul: Vec<f64> = groups
                .iter()
                .map(|group| culture_volume_ul(*target, config.final_volume_ml, group.mean_od))
                .collect();
            let diluent_ul = culture_ul
                .iter()
                .map(|culture| diluent_volume_ul(*culture, final_volume_ul))
                .collect();
            TargetVolumes {
                target_od: *target,
                culture_ul,
                diluent_ul,
            }
        })
        .collect();

    let mut plan = SyncPlan {
        targets: config.target_ods.clone(),
        final_volume_ml: config.final_volume_ml,
        bio_reps: config.bio_reps,
        selected,
        groups,
        volumes,
        culture_ul: WellMatrix::empty(OUTPUT_SHAPE),
        diluent_ul: WellMatrix::empty(OUTPUT_SHAPE),
        sample_ids: WellMatrix::empty(OUTPUT_SHAPE),
        sources: WellMatrix::empty(OUTPUT_SHAPE),
        actual_od: WellMatrix::empty(OUTPUT_SHAPE),
        controls: Vec::new(),
        out_of_range: Vec::new(),
        warnings: Vec::new(),
    };
    if let Some(warning) = warning {
        warn!("{warning}");
        plan.warnings.push(warning);
    }

    expand(&mut plan, inputs.samples, &readings, config.volume_policy)?;
    if let Some(controls) = &config.controls {
        inject_controls(&mut plan, inputs.samples, &ods, controls, config.volume_policy)?;
    }
    info!(
        "planned {} cultures x {} targets, {} replicate groups, {} control wells",
        plan.selected.len(),
        plan.targets.len(),
        plan.groups.len(),
        plan.controls.len()
    );
    Ok(plan)
}

fn expand(
    plan: &mut SyncPlan,
    samples: &WellMatrix<u64>,
    readings: &[f64],
    policy: VolumePolicy,
) -> Result<(), PlateError> {
    let count = plan.selected.len();
    let bio_reps = plan.bio_reps.max(1);
    for target_idx in 0..plan.volumes.len() {
        for selected_idx in 0..count {
            let source = plan.selected[selected_idx];
            let group = selected_idx / bio_reps;
            let culture = plan.volumes[target_idx].culture_ul[group];
            let diluent = plan.volumes[target_idx].diluent_ul[group];
            let out = OUTPUT_SHAPE.well_at(target_idx * count + selected_idx)?;
            if let Some(sample) = samples.get(source)? {
                plan.sample_ids.set(out, *sample)?;
            }
            plan.sources.set(out, source)?;
            plan.culture_ul.set(out, culture)?;
            plan.diluent_ul.set(out, diluent)?;
            plan.actual_od
                .set(out, actual_od(readings[selected_idx], culture, plan.final_volume_ml))?;
            check_volume(plan, policy, out, culture)?;
        }
    }
    Ok(())
}

impl SyncPlan {
    /// Output well receiving the `selected_idx`-th culture at the
    /// `target_idx`-th target OD.
    pub fn output_well(&self, selected_idx: usize, target_idx: usize) -> Result<Well, PlateError> {
        if selected_idx >= self.selected.len() || target_idx >= self.targets.len() {
            return Err(PlateError::OutOfBounds(
                ErrorInfo::new("sync.output_well", "no such culture or target")
                    .with_context("selected_idx", selected_idx.to_string())
                    .with_context("target_idx", target_idx.to_string()),
            ));
        }
        OUTPUT_SHAPE.well_at(target_idx * self.selected.len() + selected_idx)
    }

    /// Diluent needed for the whole plate, µl.
    pub fn total_diluent_ul(&self) -> f64 {
        self.diluent_ul.iter().map(|(_, volume)| *volume).sum()
    }

    /// Stable SHA-256 of the plan.
    pub fn plan_hash(&self) -> Result<String, PlateError> {
        stable_hash_string(self)
    }

    /// Occupied output wells, row-major.
    pub fn table(&self) -> Result<Vec<PlanRow>, PlateError> {
        let is_control = |well: Well| self.controls.iter().any(|control| control.well == well);
        let mut rows = Vec::with_capacity(self.sample_ids.filled());
        for (well, sample_id) in self.sample_ids.iter() {
            let source = self.sources.get(well)?.map(Well::to_string).unwrap_or_default();
            rows.push(PlanRow {
                well: well.to_string(),
                source,
                sample_id: *sample_id,
                culture_ul: self.culture_ul.get(well)?.copied().unwrap_or(0.0),
                diluent_ul: self.diluent_ul.get(well)?.copied().unwrap_or(0.0),
                actual_od: if is_control(well) {
                    None
                } else {
                    self.actual_od.get(well)?.copied()
                },
            });
        }
        Ok(rows)
    }
}
