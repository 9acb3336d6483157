//! Content-addressed 4-byte identifiers.
//!
//! Every composite, entity, parameter and hierarchy element in an archive is
//! named by an [`Identifier`]. Identifiers derived from strings are stable:
//! the same name always hashes to the same four bytes, which is what lets
//! human-readable names survive a round trip through the binary format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::CoreError;

/// Opaque 4-byte token. Equality, ordering and hashing use the raw bytes.
///
/// The all-zero value is reserved as the hierarchy path terminator and never
/// names a real entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Identifier(pub [u8; 4]);

impl Identifier {
    /// The reserved path terminator.
    pub const TERMINATOR: Identifier = Identifier([0; 4]);

    /// Builds an identifier from its raw on-disk bytes.
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Identifier(bytes)
    }

    /// Raw on-disk bytes.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Returns `true` for the reserved all-zero terminator.
    pub fn is_terminator(&self) -> bool {
        *self == Self::TERMINATOR
    }

    /// Computes the content-addressed identifier for `name`.
    ///
    /// SHA1 over the UTF-8 bytes, the first 16 digest bytes reordered by
    /// reversing each 4-byte group, rendered as uppercase hex, SHA1 again,
    /// and the first four bytes of the second digest kept. This bypasses
    /// every name cache; use [`IdentifierRegistry::generate`] for lookups
    /// that should honour well-known names.
    ///
    /// [`IdentifierRegistry::generate`]: crate::registry::IdentifierRegistry::generate
    pub fn from_name(name: &str) -> Self {
        let digest = Sha1::digest(name.as_bytes());

        let mut reordered = [0u8; 16];
        for (dst, src) in reordered
            .chunks_exact_mut(4)
            .zip(digest[..16].chunks_exact(4))
        {
            for (d, s) in dst.iter_mut().zip(src.iter().rev()) {
                *d = *s;
            }
        }

        let rendered = hex::encode_upper(reordered);
        let second = Sha1::digest(rendered.as_bytes());
        Identifier([second[0], second[1], second[2], second[3]])
    }

    /// Canonical textual form of the raw bytes, e.g. `01-A2-03-04`.
    ///
    /// Used as the fallback name for identifiers no cache knows about.
    pub fn to_byte_string(&self) -> String {
        let [a, b, c, d] = self.0;
        format!("{a:02X}-{b:02X}-{c:02X}-{d:02X}")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_byte_string())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.to_byte_string())
    }
}

/// Parses either the dashed byte form (`01-A2-03-04`) or eight bare hex
/// digits (`01A20304`).
impl FromStr for Identifier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.trim().chars().filter(|c| *c != '-').collect();
        let mut bytes = [0u8; 4];
        hex::decode_to_slice(&compact, &mut bytes).map_err(|_| CoreError::InvalidIdentifier {
            input: s.to_string(),
        })?;
        Ok(Identifier(bytes))
    }
}

impl From<[u8; 4]> for Identifier {
    fn from(bytes: [u8; 4]) -> Self {
        Identifier(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_name_hashes() {
        assert_eq!(Identifier::from_name("reference").to_byte_string(), "84-DD-C9-B1");
        assert_eq!(Identifier::from_name("trigger").to_byte_string(), "29-CA-D0-D9");
        assert_eq!(Identifier::from_name("TriggerSequence").to_byte_string(), "0D-A3-76-BF");
        assert_eq!(Identifier::from_name("").to_byte_string(), "25-16-14-8C");
    }

    #[test]
    fn hashing_is_deterministic() {
        assert_eq!(Identifier::from_name("Entity"), Identifier::from_name("Entity"));
        assert_ne!(Identifier::from_name("Entity"), Identifier::from_name("entity"));
    }

    #[test]
    fn terminator_is_all_zero() {
        assert!(Identifier::TERMINATOR.is_terminator());
        assert!(Identifier::default().is_terminator());
        assert!(!Identifier([0, 0, 0, 1]).is_terminator());
    }

    #[test]
    fn display_and_debug() {
        let id = Identifier([0x01, 0xA2, 0x03, 0xFF]);
        assert_eq!(format!("{}", id), "01-A2-03-FF");
        assert_eq!(format!("{:?}", id), "Identifier(01-A2-03-FF)");
    }

    #[test]
    fn parse_both_forms() {
        let dashed: Identifier = "01-a2-03-ff".parse().unwrap();
        let bare: Identifier = "01A203FF".parse().unwrap();
        assert_eq!(dashed, Identifier([0x01, 0xA2, 0x03, 0xFF]));
        assert_eq!(dashed, bare);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        match "01-02-03".parse::<Identifier>() {
            Err(CoreError::InvalidIdentifier { input }) => assert_eq!(input, "01-02-03"),
            other => panic!("expected InvalidIdentifier, got {:?}", other),
        }
        assert!("zz-zz-zz-zz".parse::<Identifier>().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let id = Identifier::from_name("name");
        let json = serde_json::to_string(&id).unwrap();
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
