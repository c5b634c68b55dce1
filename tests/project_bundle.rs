use std::io::Write;

use treeport::io::read_all;
use treeport::model::{self, Gender, LayoutPosition};
use treeport::project::{self, DATA_ENTRY, LAYOUT_ENTRY, META_ENTRY};
use treeport::sniff::{self, Format};
use treeport::zip::{WriterOptions, read_entries, write_entries};
use treeport::{Error, LocalFileReader, legacy};

const EXPORT: &[u8] = b"\0\x01P1\0NAMEJohn /Smith/\0\x01SEXM\0\x01POSX10\0\x01POSY20,25\0\
\x01P2\0NAMEJane /Doe/\0\x01SEXF\0\
\x01P3\0SEX\0\
\x01F1\0\x01HUSBP1\0\x01WIFEP2\0\x01CHILP3\0";

#[test]
fn imported_tree_survives_save_and_load() {
    let bundle = sniff::open_bytes(EXPORT).unwrap();
    assert_eq!(bundle.individuals.len(), 3);

    let saved = project::save(&bundle, &WriterOptions::default()).unwrap();
    assert_eq!(sniff::detect(&saved), Format::Container);

    let names: Vec<String> = read_entries(&saved)
        .unwrap()
        .names()
        .map(str::to_string)
        .collect();
    assert_eq!(names, vec![DATA_ENTRY, LAYOUT_ENTRY, META_ENTRY]);

    let reopened = sniff::open_bytes(&saved).unwrap();
    assert_eq!(reopened, bundle);
    assert_eq!(
        reopened.individuals[0].position,
        Some(LayoutPosition { x: 10.0, y: 20.25 })
    );
}

#[test]
fn blank_child_kept_blank_stranger_dropped() {
    let with_stranger = [EXPORT, b"\x01P4\0SEX\0"].concat();
    let decoded = legacy::decode(&with_stranger);
    assert_eq!(decoded.persons.len(), 4);

    let bundle = model::build(&decoded);
    assert_eq!(bundle.individuals.len(), 3);
    let child_id = bundle.families[0].children[0];
    let child = bundle.individual(child_id).unwrap();
    assert_eq!(child.gender, Gender::Unknown);
    assert!(child.given.is_empty() && child.surname.is_empty());
}

#[test]
fn container_without_data_entry_is_rejected() {
    let bytes = write_entries(
        &[(LAYOUT_ENTRY.to_string(), b"{}".to_vec())],
        &WriterOptions::default(),
    )
    .unwrap();
    match sniff::open_bytes(&bytes) {
        Err(Error::MissingEntry(name)) => assert_eq!(name, DATA_ENTRY),
        other => panic!("expected missing data entry, got {other:?}"),
    }
}

#[test]
fn hand_written_data_entry_loads() {
    let data = br#"{
        "individuals": [
            {"id": "6f1c2a4e-3b7d-4c5e-9a1f-2b3c4d5e6f70", "given": "Ann", "gender": "female"}
        ],
        "families": [
            {"id": "0a1b2c3d-4e5f-4a6b-8c7d-8e9fa0b1c2d3",
             "wife": "6f1c2a4e-3b7d-4c5e-9a1f-2b3c4d5e6f70",
             "husband": "ffffffff-ffff-4fff-bfff-ffffffffffff"}
        ]
    }"#;
    let layout = br#"{"6f1c2a4e-3b7d-4c5e-9a1f-2b3c4d5e6f70": {"x": 3.0, "y": 4.0}}"#;
    let bytes = write_entries(
        &[
            (DATA_ENTRY.to_string(), data.to_vec()),
            (LAYOUT_ENTRY.to_string(), layout.to_vec()),
        ],
        &WriterOptions::default(),
    )
    .unwrap();

    let bundle = project::load(&bytes).unwrap();
    let ann = &bundle.individuals[0];
    assert_eq!(ann.given, "Ann");
    assert_eq!(ann.gender, Gender::Female);
    assert_eq!(ann.position, Some(LayoutPosition { x: 3.0, y: 4.0 }));
    // The husband does not exist in the bundle.
    assert_eq!(bundle.families[0].husband, None);
    assert_eq!(bundle.families[0].wife, Some(ann.id));
    assert_eq!(project::metadata(&bytes).unwrap(), None);
}

#[tokio::test]
async fn project_file_on_disk_opens_through_local_reader() {
    let bundle = sniff::open_bytes(EXPORT).unwrap();
    let saved = project::save(&bundle, &WriterOptions::deterministic()).unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&saved).unwrap();
    file.flush().unwrap();

    let reader = LocalFileReader::new(file.path()).unwrap();
    let bytes = read_all(&reader).await.unwrap();
    assert_eq!(bytes, saved);
    assert_eq!(sniff::open_bytes(&bytes).unwrap(), bundle);
}

#[tokio::test]
async fn legacy_file_on_disk_opens_through_local_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("family.dat");
    std::fs::write(&path, EXPORT).unwrap();

    let reader = LocalFileReader::new(&path).unwrap();
    let bytes = read_all(&reader).await.unwrap();
    let bundle = sniff::open_bytes(&bytes).unwrap();
    assert_eq!(bundle.families.len(), 1);
    assert_eq!(bundle.families[0].children.len(), 1);
}
