use plate_cal::{OdCorrection, OdForm, VolumeBucket};
use plate_core::{PlateError, PlateShape, Well, WellMatrix};
use plate_sync::{
    synchronize, InputCorrection, SyncConfig, SyncInputs, VolumePolicy,
};
use proptest::prelude::*;

fn input_plate(ods: &[f64]) -> (WellMatrix<u64>, WellMatrix<f64>) {
    let mut samples = WellMatrix::empty(PlateShape::Wells96);
    let mut readings = WellMatrix::empty(PlateShape::Wells96);
    for (idx, od) in ods.iter().enumerate() {
        let well = PlateShape::Wells96.well_at(idx).expect("fits");
        samples.set(well, 1000 + idx as u64).expect("in range");
        readings.set(well, *od).expect("in range");
    }
    (samples, readings)
}

fn single_target() -> SyncConfig {
    SyncConfig {
        target_ods: vec![0.0003],
        controls: None,
        ..SyncConfig::default()
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn two_groups_at_one_target() {
    let (samples, ods) = input_plate(&[0.1, 0.1, 0.1, 0.2, 0.2, 0.2]);
    let plan = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &ods,
            correction: None,
        },
        &single_target(),
    )
    .expect("plan");

    assert_eq!(plan.groups.len(), 2);
    assert!(close(plan.groups[0].mean_od, 0.1));
    assert!(close(plan.groups[1].mean_od, 0.2));
    let volumes = &plan.volumes[0];
    assert!(close(volumes.culture_ul[0], 30.0));
    assert!(close(volumes.culture_ul[1], 15.0));
    assert_eq!(volumes.diluent_ul, vec![970.0, 985.0]);

    assert!(close(*plan.culture_ul.get("A1").expect("in range").expect("set"), 30.0));
    assert!(close(*plan.culture_ul.get("A6").expect("in range").expect("set"), 15.0));
    assert_eq!(plan.diluent_ul.get("A4").expect("in range"), Some(&985.0));
    assert_eq!(plan.actual_od.get("A1").expect("in range"), Some(&0.003));
    assert_eq!(plan.culture_ul.get("A7").expect("in range"), None);
    assert_eq!(plan.sample_ids.get("A5").expect("in range"), Some(&1004));
    assert_eq!(plan.total_diluent_ul(), 3.0 * 970.0 + 3.0 * 985.0);
    assert!(plan.warnings.is_empty());
    assert!(plan.out_of_range.is_empty());
}

#[test]
fn zero_od_yields_zero_volumes() {
    let (samples, ods) = input_plate(&[0.0, 0.0, 0.0, 0.2, 0.2, 0.2]);
    let plan = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &ods,
            correction: None,
        },
        &single_target(),
    )
    .expect("plan");
    assert_eq!(plan.volumes[0].culture_ul[0], 0.0);
    assert_eq!(plan.volumes[0].diluent_ul[0], 0.0);
    assert_eq!(plan.actual_od.get("A2").expect("in range"), Some(&0.0));
}

#[test]
fn targets_repeat_the_layout() {
    let (samples, ods) = input_plate(&[0.1, 0.1, 0.1, 0.2, 0.2, 0.2]);
    let config = SyncConfig {
        controls: None,
        ..SyncConfig::default()
    };
    let plan = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &ods,
            correction: None,
        },
        &config,
    )
    .expect("plan");
    assert_eq!(plan.sample_ids.filled(), 18);
    assert_eq!(plan.output_well(2, 1).expect("well"), Well::new(0, 8));
    assert_eq!(plan.output_well(5, 2).expect("well").to_string(), "B6");
    assert!(plan.output_well(6, 0).is_err());
    assert!(plan.output_well(0, 3).is_err());
    assert_eq!(plan.sources.get("A9").expect("in range"), Some(&Well::new(0, 2)));
    assert!(close(*plan.culture_ul.get("B4").expect("in range").expect("set"), 3.75));
    assert_eq!(plan.actual_od.get("B1").expect("in range"), Some(&0.00075));
}

#[test]
fn short_final_group_is_a_warning() {
    let (samples, ods) = input_plate(&[0.1, 0.1, 0.1, 0.3, 0.5]);
    let plan = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &ods,
            correction: None,
        },
        &single_target(),
    )
    .expect("plan");
    assert_eq!(plan.groups.len(), 2);
    assert_eq!(plan.groups[1].wells.len(), 2);
    assert!(close(plan.groups[1].mean_od, 0.4));
    assert_eq!(plan.warnings.len(), 1);
    assert!(matches!(
        plan.warnings[0],
        PlateError::UnresolvedReplicateGrouping(_)
    ));
}

#[test]
fn control_row_is_never_synchronized() {
    let (mut samples, mut ods) = input_plate(&[0.1, 0.1, 0.1]);
    samples.set("H1", 77).expect("in range");
    ods.set("H1", 0.4).expect("in range");
    let plan = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &ods,
            correction: None,
        },
        &single_target(),
    )
    .expect("plan");
    assert_eq!(plan.selected.len(), 3);
    assert!(plan.selected.iter().all(|well| well.row != 7));
}

#[test]
fn missing_reading_aborts_the_run() {
    let (samples, mut ods) = input_plate(&[0.1, 0.1, 0.1]);
    ods.clear("A2").expect("in range");
    let err = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &ods,
            correction: None,
        },
        &single_target(),
    )
    .unwrap_err();
    assert!(matches!(err, PlateError::DivisionByZero(_)));
    assert_eq!(err.info().context.get("well").map(String::as_str), Some("A2"));
}

#[test]
fn volume_policy_flags_or_rejects() {
    let (samples, ods) = input_plate(&[0.001, 0.001, 0.001, 0.2, 0.2, 0.2]);
    let inputs = SyncInputs {
        samples: &samples,
        ods: &ods,
        correction: None,
    };
    let plan = synchronize(inputs, &single_target()).expect("flagged plan");
    assert_eq!(
        plan.out_of_range,
        vec![Well::new(0, 0), Well::new(0, 1), Well::new(0, 2)]
    );
    assert!(close(plan.volumes[0].culture_ul[0], 3000.0));
    assert_eq!(plan.volumes[0].diluent_ul[0], -2000.0);

    let reject = SyncConfig {
        volume_policy: VolumePolicy::Reject,
        ..single_target()
    };
    let err = synchronize(inputs, &reject).unwrap_err();
    assert!(matches!(err, PlateError::VolumeOutOfRange(_)));
}

#[test]
fn overflowing_the_output_plate_is_rejected() {
    let (samples, ods) = input_plate(&[0.1; 33]);
    let config = SyncConfig {
        controls: None,
        ..SyncConfig::default()
    };
    let err = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &ods,
            correction: None,
        },
        &config,
    )
    .unwrap_err();
    assert_eq!(err.info().code, "sync.plate_overflow");
}

#[test]
fn invalid_configuration_is_rejected() {
    let (samples, ods) = input_plate(&[0.1]);
    let inputs = SyncInputs {
        samples: &samples,
        ods: &ods,
        correction: None,
    };
    let zero_reps = SyncConfig {
        bio_reps: 0,
        ..single_target()
    };
    assert_eq!(synchronize(inputs, &zero_reps).unwrap_err().info().code, "sync.config");
    let no_targets = SyncConfig {
        target_ods: Vec::new(),
        ..single_target()
    };
    assert!(synchronize(inputs, &no_targets).is_err());
}

#[test]
fn calibration_correction_scales_input_ods() {
    let (samples, ods) = input_plate(&[0.05, 0.05, 0.05]);
    let correction = InputCorrection {
        correction: OdCorrection {
            form: OdForm::ReferenceRatio,
            factors: [(VolumeBucket::Ul200, 2.0)].into_iter().collect(),
        },
        bucket: VolumeBucket::Ul200,
    };
    let plan = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &ods,
            correction: Some(&correction),
        },
        &single_target(),
    )
    .expect("plan");
    assert!(close(plan.groups[0].mean_od, 0.1));
    assert!(close(plan.volumes[0].culture_ul[0], 30.0));
}

#[test]
fn plan_hash_tracks_content() {
    let (samples, ods) = input_plate(&[0.1, 0.1, 0.1]);
    let inputs = SyncInputs {
        samples: &samples,
        ods: &ods,
        correction: None,
    };
    let first = synchronize(inputs, &single_target()).expect("plan");
    let again = synchronize(inputs, &single_target()).expect("plan");
    assert_eq!(first.plan_hash().expect("hash"), again.plan_hash().expect("hash"));

    let other = SyncConfig {
        target_ods: vec![0.00015],
        ..single_target()
    };
    let changed = synchronize(inputs, &other).expect("plan");
    assert_ne!(first.plan_hash().expect("hash"), changed.plan_hash().expect("hash"));
}

proptest! {
    #[test]
    fn wells_fill_to_the_final_volume(
        ods in proptest::collection::vec(0.05f64..2.0, 1..30),
        bio_reps in 1usize..5,
    ) {
        let (samples, readings) = input_plate(&ods);
        let config = SyncConfig { bio_reps, controls: None, ..SyncConfig::default() };
        let plan = synchronize(
            SyncInputs { samples: &samples, ods: &readings, correction: None },
            &config,
        )
        .expect("plan");
        prop_assert_eq!(plan.culture_ul.filled(), ods.len() * 3);
        for (well, culture) in plan.culture_ul.iter() {
            let diluent = plan.diluent_ul.get(well).expect("in range").copied().expect("set");
            prop_assert!((culture + diluent - 1000.0).abs() <= 0.5 + 1e-9);
        }
        prop_assert_eq!(plan.warnings.is_empty(), ods.len() % bio_reps == 0);
    }
}
