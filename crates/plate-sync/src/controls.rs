use log::info;
use plate_core::{round_to, ErrorInfo, PlateError, Well, WellMatrix};
use serde::{Deserialize, Serialize};

use crate::config::{ControlConfig, VolumePolicy};
use crate::engine::{check_volume, reading_at, SyncPlan, OUTPUT_SHAPE};

/// The GFP control is read undiluted but inoculated after a 1:10 dilution.
const GFP_DILUTION: f64 = 10.0;

/// Kind of a fixed control well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Wild-type culture, used unstained and stained.
    WildType,
    /// Constitutive GFP culture.
    Gfp,
}

/// A control written into the output plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPlacement {
    /// Control kind.
    pub kind: ControlKind,
    /// Output well.
    pub well: Well,
    /// Input well the culture comes from.
    pub source: Well,
    /// Sample id written into the output well.
    pub sample_id: u64,
    /// Culture volume, µl.
    pub culture_ul: f64,
    /// Diluent volume, µl.
    pub diluent_ul: f64,
}

/// First input well, row-major, holding a wild-type sample.
pub fn find_wild_type(samples: &WellMatrix<u64>, wt_sample_ids: &[u64]) -> Option<Well> {
    samples
        .iter()
        .find(|(_, sample)| wt_sample_ids.contains(*sample))
        .map(|(well, _)| well)
}

/// Culture and diluent for the GFP control: `reading` is its undiluted OD.
pub fn gfp_control_volumes(reading: f64, target_od: f64, final_volume_ml: f64) -> (f64, f64) {
    let diluted = reading * GFP_DILUTION;
    if diluted == 0.0 {
        return (0.0, 0.0);
    }
    let culture = (target_od * final_volume_ml / diluted) * 1000.0;
    (culture, round_to(final_volume_ml * 1000.0 - culture, 2))
}

fn place(
    plan: &mut SyncPlan,
    policy: VolumePolicy,
    placement: ControlPlacement,
) -> Result<(), PlateError> {
    let well = placement.well;
    plan.culture_ul.set(well, placement.culture_ul)?;
    plan.diluent_ul.set(well, placement.diluent_ul)?;
    plan.sample_ids.set(well, placement.sample_id)?;
    plan.sources.set(well, placement.source)?;
    check_volume(plan, policy, well, placement.culture_ul)?;
    info!(
        "{:?} control at {well} from {}: {:.1} µl culture, {} µl diluent",
        placement.kind, placement.source, placement.culture_ul, placement.diluent_ul
    );
    plan.controls.push(placement);
    Ok(())
}

/// Overwrites the control wells of an expanded plan.
///
/// Wild-type controls copy the first-target volumes of the replicate group
/// holding the first wild-type input well. The GFP control is synchronized
/// on its own from the reading at its well.
pub fn inject_controls(
    plan: &mut SyncPlan,
    samples: &WellMatrix<u64>,
    ods: &WellMatrix<f64>,
    controls: &ControlConfig,
    policy: VolumePolicy,
) -> Result<(), PlateError> {
    let wells = controls.wells(OUTPUT_SHAPE)?;

    let missing_wt = |message: &str| {
        PlateError::DivisionByZero(
            ErrorInfo::new("sync.wt_control_missing", message).with_context(
                "wt_sample_ids",
                controls
                    .wt_sample_ids
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        )
    };
    let wt_source = find_wild_type(samples, &controls.wt_sample_ids)
        .ok_or_else(|| missing_wt("no wild-type culture on the input plate"))?;
    let group = plan
        .selected
        .iter()
        .position(|well| *well == wt_source)
        .map(|idx| idx / plan.bio_reps.max(1))
        .ok_or_else(|| missing_wt("wild-type culture is not among the synchronized wells"))?;
    let first = plan
        .volumes
        .first()
        .ok_or_else(|| missing_wt("no target volumes to copy"))?;
    let (wt_culture, wt_diluent) = (first.culture_ul[group], first.diluent_ul[group]);
    for well in wells.wt {
        place(
            plan,
            policy,
            ControlPlacement {
                kind: ControlKind::WildType,
                well,
                source: wt_source,
                sample_id: controls.wt_control_sample_id,
                culture_ul: wt_culture,
                diluent_ul: wt_diluent,
            },
        )?;
    }

    let reading = reading_at(ods, wells.gfp)?;
    let (culture_ul, diluent_ul) =
        gfp_control_volumes(reading, controls.gfp_target_od, plan.final_volume_ml);
    place(
        plan,
        policy,
        ControlPlacement {
            kind: ControlKind::Gfp,
            well: wells.gfp,
            source: wells.gfp,
            sample_id: controls.gfp_control_sample_id,
            culture_ul,
            diluent_ul,
        },
    )
}
