use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use areadmg::data::{
    load_for_estimate, FileFrequencyStore, FrequencySource, FrequencyTable, Observation,
    MAX_MONSTERS_PER_BUCKET,
};
use areadmg::AreaDamageError;

fn unique_temp_dir(name: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("areadmg-{name}-{stamp}"));
    fs::create_dir_all(&dir).expect("temp dir should be created");
    dir
}

fn store_in(dir: &PathBuf) -> FileFrequencyStore {
    FileFrequencyStore::new(
        dir.join("total.txt"),
        dir.join("observations.txt"),
        dir.join("backup.txt"),
    )
}

#[test]
fn loads_table_written_with_trailing_tabs() {
    let dir = unique_temp_dir("load");
    let mut raw = String::new();
    for hit in 0..MAX_MONSTERS_PER_BUCKET {
        for ring in 0..MAX_MONSTERS_PER_BUCKET {
            let count = if hit == 2 && ring == 5 { 17 } else { 0 };
            raw.push_str(&format!("{count}\t"));
        }
        raw.push('\n');
    }
    fs::write(dir.join("total.txt"), raw).unwrap();

    let table = store_in(&dir).load_frequency_table().unwrap();
    assert_eq!(table.get(2, 5), 17);
    assert_eq!(table.total(), 17);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn merge_backs_up_then_persists() {
    let dir = unique_temp_dir("merge");
    let store = store_in(&dir);
    let original = FrequencyTable::from_counts([(1, 2, 4), (0, 0, 9)]).unwrap();
    fs::write(&store.table_path, original.to_tsv().unwrap()).unwrap();
    fs::write(&store.observations_path, "1 2\n3 0 1 2\n").unwrap();

    let merged = load_for_estimate(&store, true).unwrap();
    assert_eq!(merged.get(1, 2), 6);
    assert_eq!(merged.get(3, 0), 1);
    assert_eq!(merged.get(0, 0), 9);

    let backup = fs::read_to_string(&store.backup_path).unwrap();
    assert_eq!(FrequencyTable::parse_tsv(&backup, &store.backup_path).unwrap(), original);
    assert_eq!(store.load_frequency_table().unwrap(), merged);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn estimate_path_without_merge_never_writes() {
    let dir = unique_temp_dir("readonly");
    let store = store_in(&dir);
    let original = FrequencyTable::from_counts([(2, 2, 3)]).unwrap();
    fs::write(&store.table_path, original.to_tsv().unwrap()).unwrap();
    fs::write(&store.observations_path, "2 2").unwrap();

    assert_eq!(load_for_estimate(&store, false).unwrap(), original);
    assert!(!store.backup_path.exists());
    assert_eq!(store.load_frequency_table().unwrap(), original);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn bad_observations_leave_table_file_untouched() {
    let dir = unique_temp_dir("bad-obs");
    let store = store_in(&dir);
    let original = FrequencyTable::from_counts([(1, 1, 1)]).unwrap();
    fs::write(&store.table_path, original.to_tsv().unwrap()).unwrap();
    fs::write(&store.observations_path, "1 1 4").unwrap();

    let err = load_for_estimate(&store, true).unwrap_err();
    assert!(matches!(err, AreaDamageError::MalformedData { .. }));
    assert_eq!(store.load_frequency_table().unwrap(), original);
    assert!(!store.backup_path.exists());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn out_of_range_merge_is_rejected() {
    let dir = unique_temp_dir("range");
    let store = store_in(&dir);
    let table = FrequencyTable::new();
    let err = store
        .merge_and_persist(&table, &[Observation { hit: 0, ring: 11 }])
        .unwrap_err();
    assert!(matches!(err, AreaDamageError::OutOfRange { hit: 0, ring: 11 }));
    assert!(!store.table_path.exists());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn missing_observations_file_is_data_unavailable() {
    let dir = unique_temp_dir("no-obs");
    let store = store_in(&dir);
    fs::write(&store.table_path, FrequencyTable::new().to_tsv().unwrap()).unwrap();

    let err = load_for_estimate(&store, true).unwrap_err();
    assert!(matches!(err, AreaDamageError::DataUnavailable { .. }));

    let _ = fs::remove_dir_all(dir);
}
