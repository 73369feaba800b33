use std::fs;
use texrag_core::traits::VectorIndex;
use texrag_core::types::{ChunkRecord, DocType};
use texrag_core::Error;
use texrag_index::snapshot::{CURRENT_FILE, METADATA_FILE, SNAPSHOTS_DIR, VECTORS_FILE};
use texrag_index::{current_generation, FlatIndex, MetadataStore, Snapshot};

fn record(id: usize, text: &str) -> ChunkRecord {
    ChunkRecord {
        id,
        doc_id: 0,
        doc_path: "notes/a.tex".to_string(),
        doc_name: "a.tex".to_string(),
        doc_type: DocType::CourseNotes,
        tags: vec!["course_notes".to_string()],
        chunk_index: id,
        start: id * 10,
        end: id * 10 + 10,
        text: text.to_string(),
    }
}

fn pair(n: usize) -> (FlatIndex, MetadataStore) {
    let mut idx = FlatIndex::new();
    let vectors: Vec<Vec<f32>> = (0..n).map(|i| vec![i as f32, 1.0]).collect();
    idx.add(&vectors).unwrap();
    let meta = MetadataStore::new((0..n).map(|i| record(i, &format!("chunk {i}"))).collect());
    (idx, meta)
}

fn generations(index_dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(index_dir.join(SNAPSHOTS_DIR))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn write_then_load_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let (idx, meta) = pair(3);
    let dir = Snapshot::write(tmp.path(), &idx, &meta).unwrap();
    assert!(dir.join(VECTORS_FILE).exists() && dir.join(METADATA_FILE).exists());

    let snap = Snapshot::load(tmp.path()).unwrap();
    assert_eq!(snap.index.len(), 3);
    assert_eq!(snap.metadata, meta);
    assert_eq!(snap.dir, dir);
    assert_eq!(current_generation(tmp.path()).unwrap(), Some(snap.generation.clone()));
}

#[test]
fn metadata_file_is_a_json_array_in_row_order() {
    let tmp = tempfile::tempdir().unwrap();
    let (idx, meta) = pair(2);
    let dir = Snapshot::write(tmp.path(), &idx, &meta).unwrap();
    let raw = fs::read_to_string(dir.join(METADATA_FILE)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["id"], 1);
    assert_eq!(rows[1]["doc_type"], "course_notes");
    assert_eq!(rows[1]["text"], "chunk 1");
}

#[test]
fn missing_snapshot_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(matches!(Snapshot::load(tmp.path()), Err(Error::NotFound(_))));
    assert_eq!(current_generation(tmp.path()).unwrap(), None);
}

#[test]
fn new_generation_keeps_previous_and_prunes_older_ones() {
    let tmp = tempfile::tempdir().unwrap();
    let mut published = Vec::new();
    for rows in [2, 5, 3] {
        let (idx, meta) = pair(rows);
        Snapshot::write(tmp.path(), &idx, &meta).unwrap();
        published.push(current_generation(tmp.path()).unwrap().unwrap());
    }
    assert_ne!(published[1], published[2]);
    assert_eq!(generations(tmp.path()), published[1..].to_vec());
    assert_eq!(Snapshot::load(tmp.path()).unwrap().index.len(), 3);
}

#[test]
fn previous_generation_stays_loadable_after_a_flip() {
    let tmp = tempfile::tempdir().unwrap();
    let (idx, meta) = pair(2);
    let old_dir = Snapshot::write(tmp.path(), &idx, &meta).unwrap();
    let (idx, meta) = pair(4);
    Snapshot::write(tmp.path(), &idx, &meta).unwrap();

    // a reader that resolved the old pointer can still read both halves
    assert_eq!(FlatIndex::load(&old_dir.join(VECTORS_FILE)).unwrap().len(), 2);
    assert_eq!(MetadataStore::load(&old_dir.join(METADATA_FILE)).unwrap().len(), 2);
}

#[test]
fn abandoned_generation_dirs_are_pruned() {
    let tmp = tempfile::tempdir().unwrap();
    let (idx, meta) = pair(2);
    Snapshot::write(tmp.path(), &idx, &meta).unwrap();
    fs::create_dir_all(tmp.path().join(SNAPSHOTS_DIR).join("gen-0000000000000001")).unwrap();
    Snapshot::write(tmp.path(), &idx, &meta).unwrap();
    assert_eq!(generations(tmp.path()).len(), 2);
    assert!(!tmp.path().join(SNAPSHOTS_DIR).join("gen-0000000000000001").exists());
}

#[test]
fn mismatched_pair_is_never_published() {
    let tmp = tempfile::tempdir().unwrap();
    let (idx, meta) = pair(2);
    Snapshot::write(tmp.path(), &idx, &meta).unwrap();
    let before = current_generation(tmp.path()).unwrap();

    let (idx, _) = pair(3);
    let (_, meta) = pair(2);
    assert!(matches!(
        Snapshot::write(tmp.path(), &idx, &meta),
        Err(Error::IndexMetadataMismatch(_))
    ));
    assert_eq!(current_generation(tmp.path()).unwrap(), before);
    assert_eq!(Snapshot::load(tmp.path()).unwrap().index.len(), 2);
}

#[test]
fn length_mismatch_on_disk_fails_load() {
    let tmp = tempfile::tempdir().unwrap();
    let (idx, meta) = pair(3);
    let dir = Snapshot::write(tmp.path(), &idx, &meta).unwrap();
    let (_, short) = pair(2);
    short.save(&dir.join(METADATA_FILE)).unwrap();
    assert!(matches!(Snapshot::load(tmp.path()), Err(Error::IndexMetadataMismatch(_))));
}

#[test]
fn out_of_order_ids_fail_load() {
    let tmp = tempfile::tempdir().unwrap();
    let (idx, meta) = pair(2);
    let dir = Snapshot::write(tmp.path(), &idx, &meta).unwrap();
    let swapped = MetadataStore::new(vec![record(1, "b"), record(0, "a")]);
    swapped.save(&dir.join(METADATA_FILE)).unwrap();
    assert!(matches!(
        Snapshot::load(tmp.path()),
        Err(Error::IndexMetadataMismatch(m)) if m.contains("row 0")
    ));
}

#[test]
fn one_file_without_the_other_is_an_integrity_error() {
    let tmp = tempfile::tempdir().unwrap();
    let (idx, meta) = pair(2);
    let dir = Snapshot::write(tmp.path(), &idx, &meta).unwrap();
    fs::remove_file(dir.join(VECTORS_FILE)).unwrap();
    assert!(matches!(Snapshot::load(tmp.path()), Err(Error::IndexMetadataMismatch(_))));
}

#[test]
fn corrupt_vectors_surface_as_corrupt_index() {
    let tmp = tempfile::tempdir().unwrap();
    let (idx, meta) = pair(2);
    let dir = Snapshot::write(tmp.path(), &idx, &meta).unwrap();
    let mut bytes = fs::read(dir.join(VECTORS_FILE)).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    fs::write(dir.join(VECTORS_FILE), bytes).unwrap();
    assert!(matches!(Snapshot::load(tmp.path()), Err(Error::CorruptIndex(_))));
}

#[test]
fn pointer_escaping_the_index_dir_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join(CURRENT_FILE), "../elsewhere\n").unwrap();
    assert!(matches!(Snapshot::load(tmp.path()), Err(Error::CorruptIndex(_))));
}

#[test]
fn unreadable_metadata_surfaces_as_corrupt_index() {
    let tmp = tempfile::tempdir().unwrap();
    let (idx, meta) = pair(2);
    let dir = Snapshot::write(tmp.path(), &idx, &meta).unwrap();

    fs::write(dir.join(METADATA_FILE), r#"[{"id": 0, trunc"#).unwrap();
    match Snapshot::load(tmp.path()) {
        Err(Error::CorruptIndex(m)) => assert!(m.contains(METADATA_FILE)),
        other => panic!("expected CorruptIndex, got {:?}", other),
    }

    fs::write(dir.join(METADATA_FILE), [0xff, 0xfe, 0x00]).unwrap();
    assert!(matches!(Snapshot::load(tmp.path()), Err(Error::CorruptIndex(_))));
}
