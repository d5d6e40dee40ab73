use plate_core::{AssociationStore, Owner};
use plate_store::{MemoryStore, SqliteStore};
use serde_json::json;
use tempfile::NamedTempFile;

fn exercise(store: &mut dyn AssociationStore) {
    let plate = Owner::Item(411551);
    let plan = Owner::Plan(7);
    store
        .put(plate, "cal_optical_density", json!({"vol_to_correction_factor": {"100": 0.2}}))
        .expect("put");
    store.put(plate, "date_created", json!("10162026")).expect("put");
    store.put(plan, "vol_to_correction_factor", json!({"100": 0.2})).expect("put");

    assert_eq!(
        store.get(plate, "cal_optical_density").expect("get"),
        Some(json!({"vol_to_correction_factor": {"100": 0.2}}))
    );
    assert_eq!(store.get(Owner::Plan(411551), "date_created").expect("get"), None);
    assert_eq!(
        store.keys(plate).expect("keys"),
        vec!["cal_optical_density".to_string(), "date_created".to_string()]
    );

    store.put(plate, "date_created", json!("11162026")).expect("overwrite");
    assert_eq!(store.get(plate, "date_created").expect("get"), Some(json!("11162026")));
    assert_eq!(store.keys(plan).expect("keys").len(), 1);
}

#[test]
fn memory_store_semantics() {
    let mut store = MemoryStore::new();
    exercise(&mut store);
    assert_eq!(store.len(), 3);
}

#[test]
fn sqlite_store_semantics() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    exercise(&mut store);
}

#[test]
fn sqlite_store_persists_across_connections() {
    let db = NamedTempFile::new().expect("db temp");
    {
        let mut store = SqliteStore::open(db.path()).expect("open");
        store
            .put(Owner::Item(1), "optical_density", json!({"0_hr": [[0.1, -1.0]]}))
            .expect("put");
    }
    let store = SqliteStore::open(db.path()).expect("reopen");
    assert_eq!(
        store.get(Owner::Item(1), "optical_density").expect("get"),
        Some(json!({"0_hr": [[0.1, -1.0]]}))
    );
}

#[test]
fn sqlite_store_rejects_ids_beyond_signed_range() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    let owner = Owner::Item(u64::MAX);
    let err = store.put(owner, "date_created", json!("10162026")).unwrap_err();
    assert_eq!(err.info().code, "plate_store.owner_id");
    assert!(store.get(owner, "date_created").is_err());
    assert!(store.keys(owner).is_err());
    assert_eq!(store.keys(Owner::Item(i64::MAX as u64)).expect("keys").len(), 0);
}
