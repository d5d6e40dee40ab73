use plate_core::{AssociationStore, Owner, PlateShape, WellMatrix};
use plate_reader::{
    load_measurement, record_measurement, timepoint_key, AssayMethod, UploadKind,
};
use plate_store::MemoryStore;
use serde_json::json;

#[test]
fn upload_names_classify_by_assay() {
    assert_eq!(
        UploadKind::classify("cal_od_2026.csv").expect("classify"),
        UploadKind::Calibration(AssayMethod::CalOd)
    );
    assert_eq!(
        UploadKind::classify("Cal_GFP.CSV").expect("classify"),
        UploadKind::Calibration(AssayMethod::CalGfp)
    );
    assert_eq!(
        UploadKind::classify("plate_gfp_2hr.csv").expect("classify"),
        UploadKind::Measurement(AssayMethod::Gfp)
    );
    assert_eq!(
        UploadKind::classify("od_0hr.csv").expect("classify").method(),
        AssayMethod::Od
    );
}

#[test]
fn non_csv_uploads_are_rejected() {
    let err = UploadKind::classify("od_0hr.xlsx").unwrap_err();
    assert_eq!(err.info().code, "upload.extension");
    let err = UploadKind::classify("plate.csv").unwrap_err();
    assert_eq!(err.info().code, "upload.method");
}

#[test]
fn methods_parse_and_describe() {
    let method: AssayMethod = " CAL_GFP ".parse().expect("parse");
    assert_eq!(method, AssayMethod::CalGfp);
    assert_eq!(method.data_type(), "Read 2:485/20,516/20");
    assert_eq!(AssayMethod::Od.data_type(), "Blank Read 1:600");
    assert_eq!(AssayMethod::Gfp.association_key(), "gfp_fluorescence");
    assert!(method.is_calibration());
    assert!("absorbance".parse::<AssayMethod>().is_err());
}

#[test]
fn timepoints_merge_into_one_association() {
    let mut store = MemoryStore::new();
    let item = Owner::Item(42);
    let mut t0 = WellMatrix::empty(PlateShape::Wells96);
    t0.set("A1", 0.5).expect("set");
    let mut t2 = WellMatrix::empty(PlateShape::Wells96);
    t2.set("A2", 0.75).expect("set");

    record_measurement(&mut store, item, AssayMethod::Od, 0, &t0, PlateShape::Wells96)
        .expect("record t0");
    record_measurement(&mut store, item, AssayMethod::Od, 2, &t2, PlateShape::Wells96)
        .expect("record t2");

    let stored = store.get(item, "optical_density").expect("get").expect("present");
    assert_eq!(stored[timepoint_key(0)][0][0], json!(0.5));
    assert_eq!(stored[timepoint_key(0)][0][1], json!(-1.0));
    assert_eq!(stored["2_hr"][0][1], json!(0.75));
    assert_eq!(stored["2_hr"].as_array().map(Vec::len), Some(8));

    let loaded = load_measurement(&store, item, AssayMethod::Od, 2, PlateShape::Wells96)
        .expect("load")
        .expect("present");
    assert_eq!(loaded, t2);
    assert_eq!(
        load_measurement(&store, item, AssayMethod::Gfp, 2, PlateShape::Wells96).expect("load"),
        None
    );
}

#[test]
fn readings_reshape_to_collection_width() {
    let mut store = MemoryStore::new();
    let item = Owner::Item(7);
    let mut readings = WellMatrix::empty(PlateShape::Wells24);
    readings.set("B1", 1.25).expect("set");
    record_measurement(&mut store, item, AssayMethod::Gfp, 1, &readings, PlateShape::Wells96)
        .expect("record");

    let loaded = load_measurement(&store, item, AssayMethod::Gfp, 1, PlateShape::Wells96)
        .expect("load")
        .expect("present");
    assert_eq!(loaded.get("A7").expect("in range"), Some(&1.25));
    assert_eq!(loaded.filled(), 1);
}

#[test]
fn calibration_reads_are_not_measurements() {
    let mut store = MemoryStore::new();
    let readings = WellMatrix::empty(PlateShape::Wells96);
    let err = record_measurement(
        &mut store,
        Owner::Item(1),
        AssayMethod::CalOd,
        0,
        &readings,
        PlateShape::Wells96,
    )
    .unwrap_err();
    assert_eq!(err.info().code, "record.calibration_method");
    assert!(store.is_empty());
}
