//! Attach and save workflows for an archive's custom names.
//!
//! When an archive is opened for editing, its `Identifiers` slot becomes the
//! registry's custom cache; saving writes the cache back. Entity display
//! names travel in the `EntityNames` slot.

use std::fs::File;
use std::path::Path;

use tracing::debug;

use cathode_core::{EntityNameTable, IdentifierRegistry, NameCache};

use crate::error::StorageError;
use crate::slot::{SlotContent, SlotKind};
use crate::trailer::{read_slot, write_slot};

/// Replaces the registry's custom cache with the archive's stored names.
///
/// An archive without a side table attaches an empty cache. Returns the
/// number of names loaded.
pub fn attach_custom_names(
    registry: &mut IdentifierRegistry,
    path: &Path,
) -> Result<usize, StorageError> {
    let mut file = File::open(path)?;
    let cache = read_slot(&mut file, SlotKind::Identifiers)?
        .and_then(SlotContent::into_identifiers)
        .unwrap_or_default();
    let loaded = cache.len();
    registry.replace_custom(cache);
    debug!(path = %path.display(), loaded, "attached custom names");
    Ok(loaded)
}

/// Writes the registry's custom cache to the archive's side table.
pub fn save_custom_names(registry: &IdentifierRegistry, path: &Path) -> Result<(), StorageError> {
    write_slot(path, SlotContent::Identifiers(registry.custom().clone()))
}

/// Reads the archive's stored names without touching any registry.
pub fn load_custom_names(path: &Path) -> Result<NameCache, StorageError> {
    let mut file = File::open(path)?;
    Ok(read_slot(&mut file, SlotKind::Identifiers)?
        .and_then(SlotContent::into_identifiers)
        .unwrap_or_default())
}

/// Reads custom entity display names. Missing data reads as an empty table.
pub fn load_entity_names(path: &Path) -> Result<EntityNameTable, StorageError> {
    let mut file = File::open(path)?;
    Ok(read_slot(&mut file, SlotKind::EntityNames)?
        .and_then(SlotContent::into_entity_names)
        .unwrap_or_default())
}

/// Writes custom entity display names.
pub fn save_entity_names(path: &Path, names: &EntityNameTable) -> Result<(), StorageError> {
    write_slot(path, SlotContent::EntityNames(names.clone()))
}
