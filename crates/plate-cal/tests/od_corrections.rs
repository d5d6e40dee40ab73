use plate_cal::{
    blank_subtracted, bucket_mean, reference_ratios, CalibrationOpts, OdCorrection, OdForm,
    VolumeBucket, DILUTED_ROW, PURE_ROW,
};
use plate_core::{PlateError, PlateShape, Well, WellMatrix};

fn ludox_plate(diluted: f64, pure: f64) -> WellMatrix<f64> {
    let mut matrix = WellMatrix::empty(PlateShape::Wells96);
    for col in 0..12 {
        matrix.set(Well::new(DILUTED_ROW, col), diluted).expect("in range");
        matrix.set(Well::new(PURE_ROW, col), pure).expect("in range");
    }
    matrix
}

#[test]
fn blank_subtraction_per_bucket() {
    let factors = blank_subtracted(&ludox_plate(0.5, 0.3)).expect("factors");
    assert_eq!(factors.len(), 3);
    for bucket in VolumeBucket::ALL {
        assert_eq!(factors[&bucket], 0.2);
    }
}

#[test]
fn reference_ratio_uses_pure_row_only() {
    let mut matrix = WellMatrix::empty(PlateShape::Wells96);
    for col in 0..12 {
        let pure = match VolumeBucket::for_column(col) {
            VolumeBucket::Ul100 => 0.0425,
            VolumeBucket::Ul200 => 0.085,
            VolumeBucket::Ul300 => 0.17,
        };
        matrix.set(Well::new(PURE_ROW, col), pure).expect("in range");
    }
    let factors = reference_ratios(&matrix, 0.0425).expect("factors");
    assert_eq!(factors[&VolumeBucket::Ul100], 1.0);
    assert_eq!(factors[&VolumeBucket::Ul200], 0.5);
    assert_eq!(factors[&VolumeBucket::Ul300], 0.25);
}

#[test]
fn bucket_mean_skips_empty_wells() {
    let mut matrix = ludox_plate(0.5, 0.3);
    matrix.clear("E5").expect("in range");
    matrix.set("E6", 0.8).expect("in range");
    let mean = bucket_mean(&matrix, DILUTED_ROW, VolumeBucket::Ul200).expect("mean");
    assert!((mean - 0.6).abs() < 1e-12);
}

#[test]
fn empty_bucket_is_division_by_zero() {
    let mut matrix = ludox_plate(0.5, 0.3);
    for col in VolumeBucket::Ul300.columns() {
        matrix.clear(Well::new(PURE_ROW, col)).expect("in range");
    }
    let err = blank_subtracted(&matrix).unwrap_err();
    assert!(matches!(err, PlateError::DivisionByZero(_)));
    assert_eq!(err.info().context.get("bucket").map(String::as_str), Some("300"));
    assert_eq!(err.info().context.get("row").map(String::as_str), Some("F"));
}

#[test]
fn zero_pure_mean_has_no_ratio() {
    let err = reference_ratios(&ludox_plate(0.5, 0.0), 0.0425).unwrap_err();
    assert_eq!(err.info().code, "cal.zero_reference");
}

#[test]
fn forms_apply_differently() {
    let matrix = ludox_plate(0.5, 0.25);
    let offset = OdCorrection::from_plate(
        &matrix,
        &CalibrationOpts {
            od_form: OdForm::BlankSubtracted,
            ..CalibrationOpts::default()
        },
    )
    .expect("offset");
    let ratio = OdCorrection::from_plate(&matrix, &CalibrationOpts::default()).expect("ratio");

    assert!((offset.apply(0.1, VolumeBucket::Ul100).expect("apply") - 0.35).abs() < 1e-12);
    assert_eq!(ratio.factor(VolumeBucket::Ul100).expect("factor"), 0.17);
    assert!((ratio.apply(1.0, VolumeBucket::Ul300).expect("apply") - 0.17).abs() < 1e-12);

    let mut readings = WellMatrix::empty(PlateShape::Wells96);
    readings.set("A1", 2.0).expect("in range");
    let corrected = ratio.apply_matrix(&readings, VolumeBucket::Ul200).expect("apply");
    assert_eq!(corrected.get("A1").expect("in range"), Some(&0.34));
    assert_eq!(corrected.filled(), 1);
}

#[test]
fn bucket_lookup_by_volume() {
    assert_eq!(VolumeBucket::from_microliters(200).expect("bucket"), VolumeBucket::Ul200);
    assert!(VolumeBucket::from_microliters(150).is_err());
    assert_eq!(VolumeBucket::for_column(11), VolumeBucket::Ul300);
    assert_eq!(VolumeBucket::Ul100.to_string(), "100");
}
