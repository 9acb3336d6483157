//! Little-endian primitives shared by the side-table slot codecs.
//!
//! Strings use a 7-bit encoded length prefix (ULEB128 byte count, at most
//! five bytes) followed by UTF-8, matching the archive tooling's existing
//! writer. Identifiers are their four raw bytes.

use std::io::{self, Read};

use cathode_core::Identifier;

use crate::error::StorageError;

pub(crate) fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Reads a non-negative `i32` element count.
pub(crate) fn read_count<R: Read>(reader: &mut R) -> Result<usize, StorageError> {
    let count = read_i32(reader)?;
    usize::try_from(count).map_err(|_| StorageError::malformed(format!("negative count {count}")))
}

pub(crate) fn read_identifier<R: Read>(reader: &mut R) -> io::Result<Identifier> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(Identifier::from_bytes(buf))
}

pub(crate) fn read_string<R: Read>(reader: &mut R) -> Result<String, StorageError> {
    let mut len: u32 = 0;
    let mut shift = 0;
    loop {
        if shift > 28 {
            return Err(StorageError::malformed("string length prefix too long"));
        }
        let byte = read_u8(reader)?;
        len |= u32::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }

    let mut bytes = Vec::new();
    reader.by_ref().take(u64::from(len)).read_to_end(&mut bytes)?;
    if bytes.len() != len as usize {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated string").into());
    }
    Ok(String::from_utf8(bytes)?)
}

pub(crate) fn write_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Writes `count` as an `i32`, failing if it does not fit.
pub(crate) fn write_count(out: &mut Vec<u8>, count: usize) -> Result<(), StorageError> {
    let value = i32::try_from(count).map_err(|_| StorageError::TableTooLarge {
        size: count as u64,
    })?;
    write_i32(out, value);
    Ok(())
}

pub(crate) fn write_identifier(out: &mut Vec<u8>, id: Identifier) {
    out.extend_from_slice(id.as_bytes());
}

pub(crate) fn write_string(out: &mut Vec<u8>, value: &str) -> Result<(), StorageError> {
    let mut len = u32::try_from(value.len())
        .map_err(|_| StorageError::TableTooLarge { size: value.len() as u64 })?;
    while len >= 0x80 {
        out.push((len as u8) | 0x80);
        len >>= 7;
    }
    out.push(len as u8);
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn short_string_has_single_byte_prefix() {
        let mut out = Vec::new();
        write_string(&mut out, "abc").unwrap();
        assert_eq!(out, vec![3, b'a', b'b', b'c']);
    }

    #[test]
    fn long_string_prefix_is_seven_bit_encoded() {
        let value = "x".repeat(300);
        let mut out = Vec::new();
        write_string(&mut out, &value).unwrap();
        // 300 = 0b10_0101100 -> 0xAC 0x02
        assert_eq!(&out[..2], &[0xAC, 0x02]);
        assert_eq!(out.len(), 302);

        let back = read_string(&mut Cursor::new(out)).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn truncated_string_is_malformed() {
        let err = read_string(&mut Cursor::new(vec![5, b'a', b'b'])).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let err = read_string(&mut Cursor::new(vec![2, 0xFF, 0xFE])).unwrap_err();
        assert!(matches!(err, StorageError::InvalidUtf8(_)));
        assert!(err.is_malformed());
    }

    #[test]
    fn negative_count_is_malformed() {
        let err = read_count(&mut Cursor::new((-1i32).to_le_bytes().to_vec())).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn identifier_is_raw_bytes() {
        let mut out = Vec::new();
        write_identifier(&mut out, Identifier::from_bytes([1, 2, 3, 4]));
        assert_eq!(out, vec![1, 2, 3, 4]);
        assert_eq!(
            read_identifier(&mut Cursor::new(out)).unwrap(),
            Identifier::from_bytes([1, 2, 3, 4])
        );
    }
}
