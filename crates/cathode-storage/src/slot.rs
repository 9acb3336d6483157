//! Side-table slot kinds and their payload codecs.
//!
//! Slot kinds are keyed by a stable integer index into the trailer's offset
//! table. New kinds must only ever be appended to [`SlotKind::ALL`]; reordering
//! would shift every existing archive's offsets.
//!
//! Payload layouts (all integers little-endian `i32`, identifiers 4 raw
//! bytes, strings 7-bit length prefixed UTF-8):
//!
//! ```text
//! EntityNames:  count, { composite_id, entity_count, { entity_id, name } }
//! Identifiers:  count, { id, name }
//! ```

use std::io::Read;

use cathode_core::{EntityNameTable, NameCache};

use crate::codec::{
    read_count, read_identifier, read_string, write_count, write_identifier, write_string,
};
use crate::error::StorageError;

/// Number of slots written to every side table.
pub const SLOT_COUNT: usize = SlotKind::ALL.len();

/// A named slot in the side table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Custom display names of entities, per composite.
    EntityNames = 0,
    /// Backing store of the registry's custom name cache.
    Identifiers = 1,
}

impl SlotKind {
    /// Every slot kind in on-disk order.
    pub const ALL: [SlotKind; 2] = [SlotKind::EntityNames, SlotKind::Identifiers];

    /// Position of this slot in the trailer's offset table.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            SlotKind::EntityNames => "entity_names",
            SlotKind::Identifiers => "identifiers",
        }
    }
}

/// Decoded content of one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotContent {
    EntityNames(EntityNameTable),
    Identifiers(NameCache),
}

impl SlotContent {
    pub fn kind(&self) -> SlotKind {
        match self {
            SlotContent::EntityNames(_) => SlotKind::EntityNames,
            SlotContent::Identifiers(_) => SlotKind::Identifiers,
        }
    }

    /// Number of top-level records (composites or identifiers).
    pub fn record_count(&self) -> usize {
        match self {
            SlotContent::EntityNames(table) => table.composite_count(),
            SlotContent::Identifiers(cache) => cache.len(),
        }
    }

    pub fn into_entity_names(self) -> Option<EntityNameTable> {
        match self {
            SlotContent::EntityNames(table) => Some(table),
            _ => None,
        }
    }

    pub fn into_identifiers(self) -> Option<NameCache> {
        match self {
            SlotContent::Identifiers(cache) => Some(cache),
            _ => None,
        }
    }

    /// Appends this slot's payload to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), StorageError> {
        match self {
            SlotContent::EntityNames(table) => {
                write_count(out, table.composite_count())?;
                for (composite, entities) in table.composites() {
                    write_identifier(out, composite);
                    write_count(out, entities.len())?;
                    for (entity, name) in entities {
                        write_identifier(out, *entity);
                        write_string(out, name)?;
                    }
                }
            }
            SlotContent::Identifiers(cache) => {
                write_count(out, cache.len())?;
                for (name, id) in cache.iter() {
                    write_identifier(out, id);
                    write_string(out, name)?;
                }
            }
        }
        Ok(())
    }

    /// Decodes a payload of the given kind from the reader's position.
    pub fn decode<R: Read>(kind: SlotKind, reader: &mut R) -> Result<Self, StorageError> {
        match kind {
            SlotKind::EntityNames => {
                let mut table = EntityNameTable::new();
                let composites = read_count(reader)?;
                for _ in 0..composites {
                    let composite = read_identifier(reader)?;
                    let entities = read_count(reader)?;
                    for _ in 0..entities {
                        let entity = read_identifier(reader)?;
                        let name = read_string(reader)?;
                        table.set(composite, entity, name);
                    }
                }
                Ok(SlotContent::EntityNames(table))
            }
            SlotKind::Identifiers => {
                let mut cache = NameCache::new();
                let entries = read_count(reader)?;
                for _ in 0..entries {
                    let id = read_identifier(reader)?;
                    let name = read_string(reader)?;
                    // Duplicates are dropped; the first occurrence wins.
                    cache.insert(&name, id);
                }
                Ok(SlotContent::Identifiers(cache))
            }
        }
    }
}
