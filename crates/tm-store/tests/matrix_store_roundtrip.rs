use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tm_core::{Field, Protocol, RunNumber, RunRecord};
use tm_store::{MatrixKey, MatrixStore, StoreError};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn record(n: u32, name: &str) -> RunRecord {
    RunRecord::new(RunNumber::new(n).unwrap())
        .with_field(Field::TestName, name)
        .with_field(Field::Job, format!("job{n}"))
        .with_tags("P1", format!("L{n}"))
}

#[test]
fn scratch_store_is_replaced_on_save() {
    let root = unique_temp_dir("tm_store_scratch");
    let store = MatrixStore::new(root.clone()).expect("failed to create store");

    store
        .save_runs("Tire A", Protocol::CdTire, &[record(1, "Static"), record(2, "Roll")])
        .expect("failed to save");
    store
        .save_runs("Tire A", Protocol::CdTire, &[record(7, "Cleat")])
        .expect("failed to resave");

    let runs = store.load_runs("Tire A", Protocol::CdTire).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_number.get(), 7);

    let run = store
        .load_run("Tire A", Protocol::CdTire, RunNumber::new(7).unwrap())
        .unwrap();
    assert_eq!(run.folder_name(), "P1_L7");
    assert!(matches!(
        store.load_run("Tire A", Protocol::CdTire, RunNumber::new(1).unwrap()),
        Err(StoreError::RunNotFound { run: 1, .. })
    ));

    fs::remove_dir_all(&root).ok();
}

#[test]
fn one_store_per_project_and_protocol() {
    let root = unique_temp_dir("tm_store_pairs");
    let store = MatrixStore::new(root.clone()).unwrap();

    store.save_runs("Tire A", Protocol::Mf62, &[record(1, "a")]).unwrap();
    store.save_runs("Tire A", Protocol::FTire, &[record(2, "b")]).unwrap();
    store.save_inputs("Tire A", Protocol::FTire, &serde_json::json!({"p1": 35.0})).unwrap();
    store.save_runs("Tire B", Protocol::Mf62, &[record(3, "c")]).unwrap();

    assert_eq!(
        store.list_protocols("Tire A").unwrap(),
        vec![Protocol::Mf62, Protocol::FTire]
    );
    assert_eq!(store.load_runs("Tire B", Protocol::Mf62).unwrap()[0].run_number.get(), 3);
    assert!(!store.has_runs("Tire B", Protocol::CdTire));
    assert!(matches!(
        store.load_runs("Tire B", Protocol::CdTire),
        Err(StoreError::MatrixNotFound { .. })
    ));

    let inputs: Option<serde_json::Value> = store.load_inputs("Tire A", Protocol::FTire).unwrap();
    assert_eq!(inputs.unwrap()["p1"], 35.0);
    let missing: Option<serde_json::Value> = store.load_inputs("Tire B", Protocol::Mf62).unwrap();
    assert!(missing.is_none());

    fs::remove_dir_all(&root).ok();
}

#[test]
fn archive_is_immutable_and_verified() {
    let root = unique_temp_dir("tm_store_archive");
    let store = MatrixStore::new(root.clone()).unwrap();
    let records = vec![record(1, "Static"), record(2, "Roll")];

    let snapshot = store
        .archive("prj-42", "Tire A", Protocol::CdTire, &records)
        .expect("failed to archive");
    assert_eq!(snapshot.records, records);
    assert!(store.has_archive("prj-42"));

    assert!(matches!(
        store.archive("prj-42", "Tire A", Protocol::CdTire, &[]),
        Err(StoreError::ArchiveExists { .. })
    ));

    let key = MatrixKey::Archived {
        project_id: "prj-42".to_string(),
    };
    assert_eq!(store.load(&key).unwrap(), records);

    // Tamper with the stored records.
    let path = root.join("archive").join("prj-42").join("matrix.json");
    let tampered = fs::read_to_string(&path).unwrap().replace("Static", "Dynamic");
    fs::write(&path, tampered).unwrap();
    assert!(matches!(
        store.load_archive("prj-42"),
        Err(StoreError::DigestMismatch { .. })
    ));

    assert!(matches!(
        store.load_archive("prj-missing"),
        Err(StoreError::ArchiveNotFound { .. })
    ));

    fs::remove_dir_all(&root).ok();
}
