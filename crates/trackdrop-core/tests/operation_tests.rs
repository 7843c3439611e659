mod common;

use common::*;
use std::fs;
use tempfile::tempdir;

use trackdrop_core::operation::store::RecordKind;
use trackdrop_core::operation::ManifestRecord;
use trackdrop_core::{Error, OperationStore, TrackFile, TrackPoint};

#[test]
fn test_create_writes_layout_and_manifest() {
    let tmp = tempdir().unwrap();
    let store = OperationStore::new(tmp.path().join("app"));
    let operation = store.create("Leting Nord", at(10, 0), 8).unwrap();

    let dir = tmp.path().join("app").join("Leting_Nord");
    assert!(dir.join("Raw").is_dir());
    assert!(dir.join("Processed").is_dir());
    assert_eq!(store.manifest_path(&operation), dir.join("Leting_Nord.txt"));

    let text = fs::read_to_string(dir.join("Leting_Nord.txt")).unwrap();
    let lines: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(
        lines,
        vec![
            "name=Leting_Nord".to_string(),
            "numberOfAreas=8".to_string(),
            "starttime=1717236000000".to_string(),
            format!("storagepath={}", tmp.path().join("app").display()),
        ]
    );

    let loaded = store.load(&dir.join("Leting_Nord.txt")).unwrap();
    assert_eq!(loaded, operation);
}

#[test]
fn test_create_rejects_bad_names_and_duplicates() {
    let tmp = tempdir().unwrap();
    let store = OperationStore::new(tmp.path());

    let too_long = "A".repeat(51);
    for name in ["", "X", "Søk/Nord", too_long.as_str()] {
        assert!(
            matches!(
                store.create(name, at(10, 0), 1),
                Err(Error::InvalidOperationName(_))
            ),
            "{:?}",
            name
        );
    }

    store.create("Øvelse 2", at(10, 0), 1).unwrap();
    assert!(matches!(
        store.create("Øvelse 2", at(12, 0), 3),
        Err(Error::OperationExists(_))
    ));
}

#[test]
fn test_load_existing_skips_malformed_and_sorts_newest_first() {
    let tmp = tempdir().unwrap();
    let store = OperationStore::new(tmp.path());
    store.create("Tidlig", at(8, 0), 1).unwrap();
    store.create("Sen", at(14, 0), 1).unwrap();

    let broken = tmp.path().join("Broken");
    fs::create_dir_all(&broken).unwrap();
    let broken_manifest = broken.join("Broken.txt");
    fs::write(
        &broken_manifest,
        "name=Broken\nnumberOfAreas=abc\nstarttime=1717236000000\n",
    )
    .unwrap();
    fs::create_dir_all(tmp.path().join("Unrelated")).unwrap();

    assert!(matches!(
        store.load(&broken_manifest),
        Err(Error::ManifestParse { .. })
    ));

    let names: Vec<String> = store
        .load_existing_operations()
        .into_iter()
        .map(|op| op.name)
        .collect();
    assert_eq!(names, vec!["Sen", "Tidlig"]);

    assert!(matches!(store.find("Broken"), Err(Error::UnknownOperation(_))));
    assert_eq!(store.find("Sen").unwrap().start_time, at(14, 0));
}

#[test]
fn test_load_existing_without_app_root_is_empty() {
    let tmp = tempdir().unwrap();
    let store = OperationStore::new(tmp.path().join("missing"));
    assert!(store.load_existing_operations().is_empty());
}

#[test]
fn test_storage_paths_are_persisted_and_mirrored() {
    let tmp = tempdir().unwrap();
    let store = OperationStore::new(tmp.path().join("app"));
    let mut operation = store.create("Leting Nord", at(10, 0), 2).unwrap();
    let backup = tmp.path().join("usb");
    assert!(operation.add_storage_path(backup.clone()));
    store.persist(&operation).unwrap();

    let name = store
        .write_raw(&operation, "Current.gpx", morning_track().as_bytes())
        .unwrap();
    assert_eq!(name, "Current.gpx");
    let again = store
        .write_raw(&operation, "Current.gpx", b"other")
        .unwrap();
    assert_eq!(again, "Current_1.gpx");

    for root in [tmp.path().join("app"), backup.clone()] {
        let dir = root.join("Leting_Nord");
        assert!(dir.join("Leting_Nord.txt").is_file());
        assert_eq!(fs::read(dir.join("Raw").join("Current_1.gpx")).unwrap(), b"other");
    }

    let reloaded = store.find("Leting Nord").unwrap();
    assert_eq!(reloaded.storage_paths(), [tmp.path().join("app"), backup]);
    assert_eq!(
        store.list_raw(&reloaded).unwrap(),
        vec![
            store.raw_dir(&reloaded).join("Current.gpx"),
            store.raw_dir(&reloaded).join("Current_1.gpx"),
        ]
    );
}

#[test]
fn test_update_start_time_round_trips() {
    let tmp = tempdir().unwrap();
    let store = OperationStore::new(tmp.path());
    let mut operation = store.create("Leting Nord", at(10, 0), 2).unwrap();
    operation.update_start_time(at(6, 30));
    store.persist(&operation).unwrap();
    assert_eq!(store.find("Leting_Nord").unwrap().start_time, at(6, 30));
}

#[test]
fn test_csv_header_and_quoting() {
    let tmp = tempdir().unwrap();
    let store = OperationStore::new(tmp.path());
    let operation = store.create("Leting Nord", at(10, 0), 4).unwrap();

    let track = TrackFile {
        segments: vec![vec![
            TrackPoint::new(59.0, 10.0).with_time(at(10, 15)),
            TrackPoint::new(59.01, 10.0).with_time(at(10, 45)),
        ]],
        ..Default::default()
    };
    let mut note = annotation(5);
    note.areas_searched = [4, 1, 3].into_iter().collect();
    note.comment = "langs elva, \"nord\"".to_string();
    let record = ManifestRecord::new(&note, &track, "Current.gpx", "out.gpx", "abc123");
    assert_eq!(record.length_km, "1.11");
    assert_eq!(record.time, "2024-06-01 10:15 - 2024-06-01 10:45");

    store.append_track_record(&operation, &record).unwrap();
    store.append_track_record(&operation, &record).unwrap();

    let text = fs::read_to_string(store.csv_path(&operation, RecordKind::Track)).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Lagtype,Lagnummer,Antall mann,Teiger,Lengde,Spornummer,Kommentar,Tid,Original fil,Prosessert fil,Original hash"
    );
    assert_eq!(
        lines.next().unwrap(),
        "Mannskap,3,4,\"1,3,4\",1.11,5,\"langs elva, \"\"nord\"\"\",2024-06-01 10:15 - 2024-06-01 10:45,Current.gpx,out.gpx,abc123"
    );
    assert_eq!(text.lines().count(), 3);

    assert_eq!(
        store.read_records(&operation, RecordKind::Track).unwrap(),
        vec![record.clone(), record.clone()]
    );
    assert!(store
        .read_records(&operation, RecordKind::Waypoint)
        .unwrap()
        .is_empty());

    store.append_waypoint_record(&operation, &record).unwrap();
    assert_eq!(
        store.read_records(&operation, RecordKind::Waypoint).unwrap(),
        vec![record]
    );
}
