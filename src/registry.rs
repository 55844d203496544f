//! Identity registry — static mapping from scanned tag id to person name.
//!
//! Several tags may belong to the same person (card + key fob). The set of
//! distinct names, sorted, is the "known person" set the duty ledger is
//! built over.

use core::fmt;

/// Length of a normalized tag id: four UID bytes as uppercase hex.
pub const TAG_ID_LEN: usize = 8;

/// Household tag table.
const TAGS: &[(&str, &str)] = &[
    ("21D5B17B", "Svanik"),
    ("8950B711", "Svanik"),
    ("A169BBA3", "Paul"),
    ("F9ABA011", "Paul"),
    ("F1589C7B", "Pranav"),
    ("89DB6912", "Pranav"),
];

// ---------------------------------------------------------------------------
// TagId
// ---------------------------------------------------------------------------

/// Normalized tag identifier: exactly 8 uppercase hexadecimal characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagId(heapless::String<TAG_ID_LEN>);

impl TagId {
    /// Build from raw UID bytes as reported by the scanner. Only the first
    /// four bytes are significant; shorter UIDs are rejected.
    pub fn from_uid(uid: &[u8]) -> Option<Self> {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        let bytes = uid.get(..4)?;
        let mut s = heapless::String::new();
        for b in bytes {
            s.push(HEX[(b >> 4) as usize] as char).ok()?;
            s.push(HEX[(b & 0x0F) as usize] as char).ok()?;
        }
        Some(Self(s))
    }

    /// Parse a textual id, accepting lowercase hex. Anything that is not
    /// exactly 8 hex digits is rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.len() != TAG_ID_LEN || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut s = heapless::String::new();
        for c in text.chars() {
            s.push(c.to_ascii_uppercase()).ok()?;
        }
        Some(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// IdentityRegistry
// ---------------------------------------------------------------------------

/// Immutable tag → name lookup.
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    entries: &'static [(&'static str, &'static str)],
    names: Vec<String>,
}

impl IdentityRegistry {
    /// The household registry compiled into the firmware.
    pub fn household() -> Self {
        Self::from_table(TAGS)
    }

    /// Build a registry over an arbitrary static table. Table ids must
    /// already be normalized.
    pub fn from_table(entries: &'static [(&'static str, &'static str)]) -> Self {
        let mut names: Vec<String> = entries.iter().map(|(_, n)| (*n).to_string()).collect();
        names.sort();
        names.dedup();
        Self { entries, names }
    }

    /// Person owning `tag`, if registered.
    pub fn lookup(&self, tag: &TagId) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(id, _)| *id == tag.as_str())
            .map(|(_, name)| *name)
    }

    /// All known people in registry order (sorted, de-duplicated).
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}
