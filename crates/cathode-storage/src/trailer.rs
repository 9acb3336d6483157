//! The append-only side table stored past an archive's declared end.
//!
//! The archive header declares its own length: two little-endian `u32`
//! counts at byte offset 20, with end offset `4 * count1 + 4 * count2`.
//! Anything after that offset is invisible to the archive's own reader, so
//! the side table lives there:
//!
//! ```text
//! [end]  version: u8 (= 50)
//!        slot_count: i32
//!        slot_count x offset: i32   (absolute file position, 0 = absent)
//!        payload of each present slot, in slot order
//! ```
//!
//! Reading never fails on bad table content: a short file, wrong version
//! byte or undecodable payload reads as "no data". Writing always rewrites
//! the whole trailer. The archive is copied to a temporary file next to it,
//! the new trailer appended there, and the copy renamed over the archive,
//! so a crash mid-write leaves the previous archive intact.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::codec::{read_count, read_i32, read_u32, read_u8};
use crate::error::StorageError;
use crate::slot::{SlotContent, SlotKind, SLOT_COUNT};

/// Version byte that marks the start of a side table.
pub const TRAILER_VERSION: u8 = 50;

/// Byte offset of the two header counts that define the archive's end.
pub const END_OFFSET_HEADER_POS: u64 = 20;

/// Computes the archive's self-declared end offset.
///
/// Fails with `UnexpectedEof` if the file is too short to hold the header.
pub fn end_offset<R: Read + Seek>(reader: &mut R) -> io::Result<u64> {
    reader.seek(SeekFrom::Start(END_OFFSET_HEADER_POS))?;
    let first = read_u32(reader)?;
    let second = read_u32(reader)?;
    Ok(4 * u64::from(first) + 4 * u64::from(second))
}

/// Returns `true` if the file extends past its end offset and the byte at the
/// end offset is [`TRAILER_VERSION`].
pub fn table_exists<R: Read + Seek>(reader: &mut R) -> Result<bool, StorageError> {
    Ok(trailer_start(reader)?.is_some())
}

/// Locates a valid trailer, returning its end offset.
fn trailer_start<R: Read + Seek>(reader: &mut R) -> Result<Option<u64>, StorageError> {
    let end = match end_offset(reader) {
        Ok(end) => end,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let len = reader.seek(SeekFrom::End(0))?;
    if len <= end {
        return Ok(None);
    }

    reader.seek(SeekFrom::Start(end))?;
    let version = read_u8(reader)?;
    if version != TRAILER_VERSION {
        debug!(version, end, "no side table: unexpected version byte");
        return Ok(None);
    }
    Ok(Some(end))
}

/// Reads the trailer's offset table, one entry per known slot kind.
///
/// Slots the file does not have (older, shorter tables) are reported as 0.
/// Returns `None` when there is no readable trailer.
pub fn slot_offsets<R: Read + Seek>(
    reader: &mut R,
) -> Result<Option<[u64; SLOT_COUNT]>, StorageError> {
    let Some(end) = trailer_start(reader)? else {
        return Ok(None);
    };

    match read_offset_table(reader) {
        Ok(offsets) => Ok(Some(offsets)),
        Err(e) if e.is_malformed() => {
            warn!(end, error = %e, "ignoring malformed side table");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn read_offset_table<R: Read>(reader: &mut R) -> Result<[u64; SLOT_COUNT], StorageError> {
    let count = read_count(reader)?;
    let mut offsets = [0u64; SLOT_COUNT];
    for index in 0..count {
        let raw = read_i32(reader)?;
        let offset = u64::try_from(raw)
            .map_err(|_| StorageError::malformed(format!("negative slot offset {raw}")))?;
        // Slots past the known kinds are skipped.
        if let Some(slot) = offsets.get_mut(index) {
            *slot = offset;
        }
    }
    Ok(offsets)
}

/// Reads and decodes one slot.
///
/// Returns `Ok(None)` when the archive has no trailer, the slot is absent,
/// or its payload cannot be decoded.
pub fn read_slot<R: Read + Seek>(
    reader: &mut R,
    kind: SlotKind,
) -> Result<Option<SlotContent>, StorageError> {
    let Some(offsets) = slot_offsets(reader)? else {
        return Ok(None);
    };
    let offset = offsets[kind.index()];
    if offset == 0 {
        return Ok(None);
    }

    reader.seek(SeekFrom::Start(offset))?;
    match SlotContent::decode(kind, reader) {
        Ok(content) => {
            debug!(
                slot = kind.name(),
                offset,
                records = content.record_count(),
                "read side table slot"
            );
            Ok(Some(content))
        }
        Err(e) if e.is_malformed() => {
            warn!(slot = kind.name(), offset, error = %e, "ignoring malformed side table slot");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Writes a complete trailer at the writer's current position.
///
/// `slots` is indexed by [`SlotKind::index`]; `None` entries are written as
/// absent. Writes the version byte, slot count and a zeroed offset block,
/// then each payload while recording its position, then seeks back and
/// fills in the offsets. Leaves the writer positioned at the end.
pub fn write_trailer<W: Write + Seek>(
    writer: &mut W,
    slots: &[Option<SlotContent>],
) -> Result<(), StorageError> {
    let mut header = vec![TRAILER_VERSION];
    crate::codec::write_count(&mut header, slots.len())?;
    let table_pos = writer.stream_position()? + header.len() as u64;
    header.resize(header.len() + 4 * slots.len(), 0);
    writer.write_all(&header)?;

    let mut offsets = Vec::with_capacity(4 * slots.len());
    for slot in slots {
        let offset = match slot {
            Some(content) => {
                let position = writer.stream_position()?;
                let mut payload = Vec::new();
                content.encode(&mut payload)?;
                writer.write_all(&payload)?;
                i32::try_from(position).map_err(|_| StorageError::TableTooLarge { size: position })?
            }
            None => 0,
        };
        crate::codec::write_i32(&mut offsets, offset);
    }

    let end = writer.stream_position()?;
    writer.seek(SeekFrom::Start(table_pos))?;
    writer.write_all(&offsets)?;
    writer.seek(SeekFrom::Start(end))?;
    Ok(())
}

/// Replaces one slot's content, preserving every other slot.
pub fn write_slot(path: &Path, content: SlotContent) -> Result<(), StorageError> {
    let kind = content.kind();
    rewrite(path, kind, Some(content))
}

/// Marks one slot as absent, preserving every other slot.
pub fn clear_slot(path: &Path, kind: SlotKind) -> Result<(), StorageError> {
    rewrite(path, kind, None)
}

fn rewrite(
    path: &Path,
    kind: SlotKind,
    mut replacement: Option<SlotContent>,
) -> Result<(), StorageError> {
    let mut source = File::open(path)?;
    let end = end_offset(&mut source)?;
    let metadata = source.metadata()?;
    if metadata.len() < end {
        return Err(StorageError::malformed(format!(
            "archive is {} bytes but declares an end offset of {}",
            metadata.len(),
            end
        )));
    }

    let mut slots = Vec::with_capacity(SlotKind::ALL.len());
    for slot in SlotKind::ALL {
        if slot == kind {
            slots.push(replacement.take());
        } else {
            slots.push(read_slot(&mut source, slot)?);
        }
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;

    source.seek(SeekFrom::Start(0))?;
    let copied = io::copy(&mut (&mut source).take(end), temp.as_file_mut())?;
    if copied != end {
        return Err(
            io::Error::new(io::ErrorKind::UnexpectedEof, "archive shrank while copying").into(),
        );
    }
    write_trailer(temp.as_file_mut(), &slots)?;
    temp.as_file().sync_all()?;
    drop(source);

    fs::set_permissions(temp.path(), metadata.permissions())?;
    temp.persist(path)?;
    debug!(path = %path.display(), slot = kind.name(), end, "rewrote side table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cathode_core::{Identifier, NameCache};
    use std::io::Cursor;

    /// Archive bytes whose header declares `4 * (a + b)` as the end offset.
    fn archive(a: u32, b: u32) -> Vec<u8> {
        let end = (4 * (a + b)) as usize;
        let mut bytes = vec![0xEEu8; end.max(28)];
        bytes[20..24].copy_from_slice(&a.to_le_bytes());
        bytes[24..28].copy_from_slice(&b.to_le_bytes());
        bytes.truncate(end.max(28));
        bytes
    }

    #[test]
    fn end_offset_from_header_counts() {
        let mut file = Cursor::new(archive(10, 5));
        assert_eq!(end_offset(&mut file).unwrap(), 60);
    }

    #[test]
    fn file_ending_at_end_offset_has_no_table() {
        let bytes = archive(10, 5);
        assert_eq!(bytes.len(), 60);
        let mut file = Cursor::new(bytes);

        assert!(!table_exists(&mut file).unwrap());
        for kind in SlotKind::ALL {
            assert!(read_slot(&mut file, kind).unwrap().is_none());
        }
    }

    #[test]
    fn short_header_has_no_table() {
        let mut file = Cursor::new(vec![0u8; 10]);
        assert!(!table_exists(&mut file).unwrap());
        assert!(read_slot(&mut file, SlotKind::Identifiers).unwrap().is_none());
    }

    #[test]
    fn wrong_version_byte_has_no_table() {
        let mut bytes = archive(10, 5);
        bytes.push(49);
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&[0; 8]);
        assert!(!table_exists(&mut Cursor::new(bytes)).unwrap());
    }

    #[test]
    fn empty_offset_table_reads_absent() {
        let mut bytes = archive(10, 5);
        bytes.push(TRAILER_VERSION);
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&[0; 8]);
        let mut file = Cursor::new(bytes);

        assert!(table_exists(&mut file).unwrap());
        assert!(read_slot(&mut file, SlotKind::EntityNames).unwrap().is_none());
        assert!(read_slot(&mut file, SlotKind::Identifiers).unwrap().is_none());
    }

    #[test]
    fn truncated_offset_table_reads_absent() {
        let mut bytes = archive(10, 5);
        bytes.push(TRAILER_VERSION);
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&[0; 3]);
        let mut file = Cursor::new(bytes);

        assert!(table_exists(&mut file).unwrap());
        assert!(slot_offsets(&mut file).unwrap().is_none());
    }

    #[test]
    fn write_trailer_patches_offsets() {
        let mut bytes = Cursor::new(archive(10, 5));
        bytes.seek(SeekFrom::End(0)).unwrap();

        let mut cache = NameCache::new();
        cache.insert("ab", Identifier::from_bytes([1, 2, 3, 4]));
        write_trailer(&mut bytes, &[None, Some(SlotContent::Identifiers(cache.clone()))]).unwrap();

        let raw = bytes.get_ref();
        assert_eq!(raw[60], TRAILER_VERSION);
        assert_eq!(&raw[61..65], &2i32.to_le_bytes());
        assert_eq!(&raw[65..69], &0i32.to_le_bytes());
        // version + count + two offsets
        assert_eq!(&raw[69..73], &73i32.to_le_bytes());

        assert_eq!(slot_offsets(&mut bytes).unwrap(), Some([0, 73]));
        assert_eq!(
            read_slot(&mut bytes, SlotKind::Identifiers).unwrap(),
            Some(SlotContent::Identifiers(cache))
        );
    }

    #[test]
    fn extra_unknown_slots_are_ignored() {
        let mut bytes = archive(10, 5);
        bytes.push(TRAILER_VERSION);
        bytes.extend_from_slice(&3i32.to_le_bytes());
        bytes.extend_from_slice(&[0; 12]);
        assert_eq!(slot_offsets(&mut Cursor::new(bytes)).unwrap(), Some([0, 0]));
    }

    #[test]
    fn corrupt_payload_reads_absent() {
        let mut bytes = archive(10, 5);
        bytes.push(TRAILER_VERSION);
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&73i32.to_le_bytes());
        // Claims five entries, holds none.
        bytes.extend_from_slice(&5i32.to_le_bytes());

        let mut file = Cursor::new(bytes);
        assert!(read_slot(&mut file, SlotKind::Identifiers).unwrap().is_none());
    }
}
