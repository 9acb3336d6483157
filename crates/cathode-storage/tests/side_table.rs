//! End-to-end tests for side-table persistence on real files.
//!
//! Each test writes a synthetic archive into a fresh temp directory. The
//! archive header declares its end offset through the counts at byte 20;
//! the bytes before that offset stand in for the primary archive content
//! and must survive every rewrite untouched.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use cathode_core::{EntityNameTable, Identifier, IdentifierRegistry, NameCache};
use cathode_storage::{
    attach_custom_names, clear_slot, load_custom_names, load_entity_names, read_slot,
    save_custom_names, save_entity_names, table_exists, write_slot, SlotContent, SlotKind,
    TRAILER_VERSION,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Writes an archive with header counts `a`/`b` (end offset `4 * (a + b)`),
/// filled with a recognisable byte pattern.
fn write_archive(dir: &TempDir, a: u32, b: u32) -> PathBuf {
    let end = 4 * (a + b) as usize;
    let mut bytes: Vec<u8> = (0..end).map(|i| (i % 251) as u8).collect();
    bytes[20..24].copy_from_slice(&a.to_le_bytes());
    bytes[24..28].copy_from_slice(&b.to_le_bytes());

    let path = dir.path().join("level.pak");
    fs::write(&path, bytes).unwrap();
    path
}

fn primary_bytes(path: &Path, end: usize) -> Vec<u8> {
    fs::read(path).unwrap()[..end].to_vec()
}

fn read(path: &Path, kind: SlotKind) -> Option<SlotContent> {
    read_slot(&mut File::open(path).unwrap(), kind).unwrap()
}

fn sample_names() -> EntityNameTable {
    let mut table = EntityNameTable::new();
    table.set(Identifier::from_name("Level"), Identifier::from_name("Door"), "Front Door");
    table.set(Identifier::from_name("Level"), Identifier::from_name("Light"), "Hall Light");
    table.set(Identifier::from_name("Menu"), Identifier::from_name("Button"), "Start");
    table
}

fn sample_cache() -> NameCache {
    NameCache::from_names(["MyTrigger", "MyCounter", "Ünïcödé name"])
}

// ---------------------------------------------------------------------------
// Existence
// ---------------------------------------------------------------------------

#[test]
fn archive_without_trailer() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(&dir, 10, 5);
    assert_eq!(fs::metadata(&path).unwrap().len(), 60);

    assert!(!table_exists(&mut File::open(&path).unwrap()).unwrap());
    assert!(read(&path, SlotKind::EntityNames).is_none());
    assert!(read(&path, SlotKind::Identifiers).is_none());
}

#[test]
fn trailer_with_absent_slots() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(&dir, 10, 5);
    let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[TRAILER_VERSION]).unwrap();
    file.write_all(&2i32.to_le_bytes()).unwrap();
    file.write_all(&[0; 8]).unwrap();
    drop(file);

    assert!(table_exists(&mut File::open(&path).unwrap()).unwrap());
    assert!(read(&path, SlotKind::EntityNames).is_none());
    assert!(read(&path, SlotKind::Identifiers).is_none());
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[test]
fn first_write_appends_trailer_at_end_offset() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(&dir, 10, 5);
    let before = primary_bytes(&path, 60);

    write_slot(&path, SlotContent::Identifiers(sample_cache())).unwrap();

    let raw = fs::read(&path).unwrap();
    assert_eq!(&raw[..60], &before[..]);
    assert_eq!(raw[60], TRAILER_VERSION);
    assert_eq!(&raw[61..65], &2i32.to_le_bytes());
    // EntityNames was never written.
    assert_eq!(&raw[65..69], &0i32.to_le_bytes());
    assert_eq!(&raw[69..73], &73i32.to_le_bytes());

    assert_eq!(read(&path, SlotKind::Identifiers), Some(SlotContent::Identifiers(sample_cache())));
}

#[test]
fn writing_one_slot_preserves_the_other() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(&dir, 12, 3);
    let before = primary_bytes(&path, 60);

    write_slot(&path, SlotContent::EntityNames(sample_names())).unwrap();
    let names_before = read(&path, SlotKind::EntityNames);

    write_slot(&path, SlotContent::Identifiers(sample_cache())).unwrap();
    assert_eq!(read(&path, SlotKind::EntityNames), names_before);

    let identifiers_before = read(&path, SlotKind::Identifiers);
    let mut renamed = sample_names();
    renamed.set(Identifier::from_name("Level"), Identifier::from_name("Door"), "Back Door");
    write_slot(&path, SlotContent::EntityNames(renamed.clone())).unwrap();

    assert_eq!(read(&path, SlotKind::Identifiers), identifiers_before);
    assert_eq!(read(&path, SlotKind::EntityNames), Some(SlotContent::EntityNames(renamed)));
    assert_eq!(primary_bytes(&path, 60), before);
}

#[test]
fn rewrites_do_not_grow_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(&dir, 10, 5);

    write_slot(&path, SlotContent::Identifiers(sample_cache())).unwrap();
    let len = fs::metadata(&path).unwrap().len();
    for _ in 0..3 {
        write_slot(&path, SlotContent::Identifiers(sample_cache())).unwrap();
    }
    assert_eq!(fs::metadata(&path).unwrap().len(), len);
}

#[test]
fn empty_slot_is_present_but_empty() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(&dir, 10, 5);

    write_slot(&path, SlotContent::Identifiers(NameCache::new())).unwrap();

    let raw = fs::read(&path).unwrap();
    assert_eq!(&raw[73..], &0i32.to_le_bytes());
    assert_eq!(
        read(&path, SlotKind::Identifiers),
        Some(SlotContent::Identifiers(NameCache::new()))
    );
}

#[test]
fn clear_slot_marks_absent() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(&dir, 10, 5);
    write_slot(&path, SlotContent::Identifiers(sample_cache())).unwrap();
    write_slot(&path, SlotContent::EntityNames(sample_names())).unwrap();

    clear_slot(&path, SlotKind::Identifiers).unwrap();

    assert!(read(&path, SlotKind::Identifiers).is_none());
    assert_eq!(read(&path, SlotKind::EntityNames), Some(SlotContent::EntityNames(sample_names())));
}

#[test]
fn corrupt_trailer_is_replaced_on_write() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(&dir, 10, 5);
    let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[TRAILER_VERSION, 0xFF, 0xFF]).unwrap();
    drop(file);

    assert!(read(&path, SlotKind::EntityNames).is_none());
    write_slot(&path, SlotContent::EntityNames(sample_names())).unwrap();
    assert_eq!(read(&path, SlotKind::EntityNames), Some(SlotContent::EntityNames(sample_names())));
}

#[test]
fn write_to_short_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tiny.pak");
    fs::write(&path, [0u8; 8]).unwrap();

    assert!(write_slot(&path, SlotContent::Identifiers(sample_cache())).is_err());
    assert_eq!(fs::read(&path).unwrap(), vec![0u8; 8]);
}

// ---------------------------------------------------------------------------
// Session workflows
// ---------------------------------------------------------------------------

#[test]
fn custom_names_survive_save_and_attach() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(&dir, 10, 5);

    let mut editor = IdentifierRegistry::new();
    let trigger = editor.generate("MyTrigger");
    let random = editor.generate_random();
    save_custom_names(&editor, &path).unwrap();

    let mut reopened = IdentifierRegistry::new();
    let loaded = attach_custom_names(&mut reopened, &path).unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(reopened.find_string(trigger), "MyTrigger");
    assert_eq!(reopened.custom(), editor.custom());
    assert!(reopened.contains(random));
    assert_eq!(load_custom_names(&path).unwrap(), editor.custom().clone());
}

#[test]
fn attach_without_trailer_clears_custom_names() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(&dir, 10, 5);

    let mut registry = IdentifierRegistry::new();
    registry.generate("LeftOver");
    assert_eq!(attach_custom_names(&mut registry, &path).unwrap(), 0);
    assert!(registry.custom().is_empty());
}

#[test]
fn entity_names_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(&dir, 10, 5);
    assert!(load_entity_names(&path).unwrap().is_empty());

    save_entity_names(&path, &sample_names()).unwrap();
    let loaded = load_entity_names(&path).unwrap();

    assert_eq!(loaded, sample_names());
    assert_eq!(
        loaded.get(Identifier::from_name("Menu"), Identifier::from_name("Button")),
        Some("Start")
    );
}
