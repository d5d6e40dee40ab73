use plate_core::{PlateError, PlateShape, Well, WellMatrix};
use plate_sync::{
    gfp_control_volumes, synchronize, ControlKind, SyncConfig, SyncInputs,
};

const WT: u64 = 22544;

fn plate_with_controls(cultures: usize, wt_at: usize, gfp_od: Option<f64>) -> (WellMatrix<u64>, WellMatrix<f64>) {
    let mut samples = WellMatrix::empty(PlateShape::Wells96);
    let mut ods = WellMatrix::empty(PlateShape::Wells96);
    for idx in 0..cultures {
        let well = PlateShape::Wells96.well_at(idx).expect("fits");
        let sample = if idx == wt_at { WT } else { 500 + idx as u64 };
        let od = if idx < 3 { 0.1 } else { 0.2 };
        samples.set(well, sample).expect("in range");
        ods.set(well, od).expect("in range");
    }
    samples.set("H9", 6390).expect("in range");
    if let Some(od) = gfp_od {
        ods.set("H9", od).expect("in range");
    }
    (samples, ods)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn controls_copy_wild_type_group_and_sync_gfp() {
    let (samples, ods) = plate_with_controls(6, 4, Some(0.05));
    let plan = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &ods,
            correction: None,
        },
        &SyncConfig::default(),
    )
    .expect("plan");

    assert_eq!(plan.controls.len(), 3);
    for label in ["H7", "H8"] {
        assert_eq!(plan.sample_ids.get(label).expect("in range"), Some(&WT));
        assert_eq!(plan.sources.get(label).expect("in range"), Some(&Well::new(0, 4)));
        assert!(close(*plan.culture_ul.get(label).expect("in range").expect("set"), 15.0));
        assert_eq!(plan.diluent_ul.get(label).expect("in range"), Some(&985.0));
    }
    let gfp = plan
        .controls
        .iter()
        .find(|control| control.kind == ControlKind::Gfp)
        .expect("gfp control");
    assert_eq!(gfp.well.to_string(), "H9");
    assert_eq!(gfp.sample_id, 6390);
    assert!(close(gfp.culture_ul, 0.6));
    assert_eq!(gfp.diluent_ul, 999.4);
    assert!(plan.selected.iter().all(|well| well.row != 7));

    let table = plan.table().expect("table");
    assert_eq!(table.len(), 18 + 3);
    let h9 = table.iter().find(|row| row.well == "H9").expect("row");
    assert_eq!(h9.source, "H9");
    assert_eq!(h9.actual_od, None);
}

#[test]
fn controls_overwrite_expanded_wells() {
    let (samples, ods) = plate_with_controls(31, 0, Some(0.05));
    let plan = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &ods,
            correction: None,
        },
        &SyncConfig::default(),
    )
    .expect("plan");

    assert_eq!(plan.output_well(30, 2).expect("well").to_string(), "H9");
    assert_eq!(plan.sample_ids.get("H7").expect("in range"), Some(&WT));
    assert_eq!(plan.sources.get("H8").expect("in range"), Some(&Well::new(0, 0)));
    assert_eq!(plan.sample_ids.get("H9").expect("in range"), Some(&6390));
    assert_eq!(plan.sources.get("H9").expect("in range"), Some(&Well::new(7, 8)));
    assert!(close(*plan.culture_ul.get("H9").expect("in range").expect("set"), 0.6));
    assert_eq!(plan.warnings.len(), 1);
}

#[test]
fn zero_gfp_reading_gives_zero_volumes() {
    assert_eq!(gfp_control_volumes(0.0, 0.0003, 1.0), (0.0, 0.0));
    let (culture, diluent) = gfp_control_volumes(0.03, 0.0003, 1.0);
    assert!(close(culture, 1.0));
    assert_eq!(diluent, 999.0);
}

#[test]
fn missing_wild_type_aborts_when_controls_are_enabled() {
    let (samples, ods) = plate_with_controls(6, usize::MAX, Some(0.05));
    let inputs = SyncInputs {
        samples: &samples,
        ods: &ods,
        correction: None,
    };
    let err = synchronize(inputs, &SyncConfig::default()).unwrap_err();
    assert!(matches!(err, PlateError::DivisionByZero(_)));
    assert_eq!(err.info().code, "sync.wt_control_missing");

    let without = SyncConfig {
        controls: None,
        ..SyncConfig::default()
    };
    let plan = synchronize(inputs, &without).expect("plan");
    assert!(plan.controls.is_empty());
    assert_eq!(plan.sample_ids.get("H7").expect("in range"), None);
}

#[test]
fn missing_gfp_reading_is_an_error() {
    let (samples, ods) = plate_with_controls(6, 0, None);
    let err = synchronize(
        SyncInputs {
            samples: &samples,
            ods: &ods,
            correction: None,
        },
        &SyncConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.info().code, "sync.missing_od");
    assert_eq!(err.info().context.get("well").map(String::as_str), Some("H9"));
}

#[test]
fn small_input_plates_need_controls_disabled() {
    let mut samples = WellMatrix::empty(PlateShape::Wells24);
    let mut ods = WellMatrix::empty(PlateShape::Wells24);
    for label in ["A1", "A2", "A3"] {
        samples.set(label, WT).expect("in range");
        ods.set(label, 0.1).expect("in range");
    }
    let inputs = SyncInputs {
        samples: &samples,
        ods: &ods,
        correction: None,
    };
    let err = synchronize(inputs, &SyncConfig::default()).unwrap_err();
    assert!(matches!(err, PlateError::OutOfBounds(_)));
    assert_eq!(err.info().code, "sync.control_shape");
    assert!(err.info().hint.as_deref().unwrap_or_default().contains("controls: null"));

    let without = SyncConfig {
        controls: None,
        ..SyncConfig::default()
    };
    let plan = synchronize(inputs, &without).expect("plan");
    assert_eq!(plan.selected.len(), 3);
}
