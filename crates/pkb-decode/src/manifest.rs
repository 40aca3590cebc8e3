//! Packmap manifest parsing.
//!
//! # Format
//!
//! ```text
//! 0x00: signature "LTAI"
//! 0x04: entry count u32
//! 0x08: entries, 72 bytes each:
//!       +0x00 filename       (32 bytes, NUL padded)
//!       +0x20 container name (32 bytes, NUL padded)
//!       +0x40 offset u32     (into the named container)
//!       +0x44 size u32
//! ```
//!
//! A truncated final record is dropped, not reported.

use crate::error::{DecodeError, DecodeResult};
use crate::reader::{read_name, read_signature, read_u32_le, write_name};

/// Manifest signature.
pub const MANIFEST_SIGNATURE: [u8; 4] = *b"LTAI";

/// Size of the manifest header.
pub const MANIFEST_HEADER_SIZE: usize = 8;

/// Size of one manifest record.
pub const MANIFEST_RECORD_SIZE: usize = 72;

const NAME_WIDTH: usize = 32;

/// One manifest row. `offset` and `size` address the named container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub filename: String,
    pub container_name: String,
    pub offset: u32,
    pub size: u32,
}

impl IndexEntry {
    /// Decode one 72-byte record.
    #[must_use]
    pub fn from_bytes(record: &[u8]) -> Option<Self> {
        if record.len() < MANIFEST_RECORD_SIZE {
            return None;
        }
        Some(Self {
            filename: read_name(&record[..NAME_WIDTH]),
            container_name: read_name(&record[NAME_WIDTH..2 * NAME_WIDTH]),
            offset: read_u32_le(record, 64)?,
            size: read_u32_le(record, 68)?,
        })
    }

    /// Encode as a 72-byte record.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; MANIFEST_RECORD_SIZE] {
        let mut out = Vec::with_capacity(MANIFEST_RECORD_SIZE);
        write_name(&mut out, &self.filename, NAME_WIDTH);
        write_name(&mut out, &self.container_name, NAME_WIDTH);
        out.extend_from_slice(&self.offset.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());

        let mut record = [0u8; MANIFEST_RECORD_SIZE];
        record.copy_from_slice(&out);
        record
    }

    /// Whether this row belongs to `container` (ASCII case-insensitive).
    #[must_use]
    pub fn is_in(&self, container: &str) -> bool {
        self.container_name.eq_ignore_ascii_case(container)
    }

    /// Borrow this entry's payload out of its container.
    pub fn slice<'a>(&self, container: &'a [u8]) -> DecodeResult<&'a [u8]> {
        slice_range(&self.filename, self.offset, self.size, container)
    }
}

/// Bounds-checked `offset..offset + size` slice of `container`.
///
/// Zero-sized ranges are rejected along with out-of-bounds ones.
pub(crate) fn slice_range<'a>(
    name: &str,
    offset: u32,
    size: u32,
    container: &'a [u8],
) -> DecodeResult<&'a [u8]> {
    let malformed = || DecodeError::MalformedEntry {
        name: name.to_owned(),
        offset,
        size,
        available: container.len(),
    };
    if size == 0 {
        return Err(malformed());
    }
    let start = usize::try_from(offset).map_err(|_| malformed())?;
    let len = usize::try_from(size).map_err(|_| malformed())?;
    let end = start.checked_add(len).ok_or_else(malformed)?;
    container.get(start..end).ok_or_else(malformed)
}

/// A parsed manifest, kept read-only for the session.
///
/// The raw bytes are retained so a name scan can still run over them when
/// the signature is not recognized.
#[derive(Debug, Clone, Default)]
pub struct IndexTable {
    entries: Vec<IndexEntry>,
    recognized: bool,
    raw: Vec<u8>,
}

impl IndexTable {
    /// Parse a manifest. Unknown signatures give an empty, unrecognized table.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Self {
        let entries = match parse_entries(bytes) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Manifest not parsed: {e}");
                return Self {
                    entries: Vec::new(),
                    recognized: false,
                    raw: bytes.to_vec(),
                };
            }
        };
        tracing::debug!("Parsed manifest with {} entries", entries.len());
        Self {
            entries,
            recognized: true,
            raw: bytes.to_vec(),
        }
    }

    /// All entries in manifest order.
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Entries stored in `container`, compared case-insensitively.
    pub fn entries_for<'a, 'b>(
        &'a self,
        container: &'b str,
    ) -> impl Iterator<Item = &'a IndexEntry> + use<'a, 'b> {
        self.entries.iter().filter(move |e| e.is_in(container))
    }

    /// First entry named `filename`, compared case-insensitively.
    #[must_use]
    pub fn find(&self, filename: &str) -> Option<&IndexEntry> {
        self.entries
            .iter()
            .find(|e| e.filename.eq_ignore_ascii_case(filename))
    }

    /// Distinct container names in first-seen order.
    #[must_use]
    pub fn containers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.iter().any(|c| c.eq_ignore_ascii_case(&entry.container_name)) {
                seen.push(&entry.container_name);
            }
        }
        seen
    }

    /// Whether the signature matched.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        self.recognized
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The bytes this table was parsed from.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

/// Parse manifest records, failing only on the header.
pub fn parse_entries(bytes: &[u8]) -> DecodeResult<Vec<IndexEntry>> {
    let signature = read_signature(bytes).ok_or(DecodeError::Truncated {
        needed: MANIFEST_HEADER_SIZE,
        available: bytes.len(),
    })?;
    if signature != MANIFEST_SIGNATURE {
        return Err(DecodeError::UnrecognizedFormat { signature });
    }
    let count = read_u32_le(bytes, 4).ok_or(DecodeError::Truncated {
        needed: MANIFEST_HEADER_SIZE,
        available: bytes.len(),
    })?;

    let count = usize::try_from(count).unwrap_or(usize::MAX);
    let entries: Vec<IndexEntry> = bytes[MANIFEST_HEADER_SIZE..]
        .chunks_exact(MANIFEST_RECORD_SIZE)
        .take(count)
        .filter_map(IndexEntry::from_bytes)
        .collect();

    if entries.len() < count {
        tracing::debug!(
            "Manifest declares {count} entries but holds {}",
            entries.len()
        );
    }
    Ok(entries)
}

/// Encode a complete manifest.
#[must_use]
pub fn encode_manifest(entries: &[IndexEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(MANIFEST_HEADER_SIZE + entries.len() * MANIFEST_RECORD_SIZE);
    out.extend_from_slice(&MANIFEST_SIGNATURE);
    out.extend_from_slice(&u32::try_from(entries.len()).unwrap_or(u32::MAX).to_le_bytes());
    for entry in entries {
        out.extend_from_slice(&entry.to_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(filename: &str, container: &str, offset: u32, size: u32) -> IndexEntry {
        IndexEntry {
            filename: filename.to_owned(),
            container_name: container.to_owned(),
            offset,
            size,
        }
    }

    #[test]
    fn record_layout() {
        let record = entry("building1.prop", "worlds_3g.pkb", 128, 900).to_bytes();
        assert_eq!(&record[..14], b"building1.prop");
        assert_eq!(record[14], 0);
        assert_eq!(&record[32..45], b"worlds_3g.pkb");
        assert_eq!(&record[64..68], &128u32.to_le_bytes());
        assert_eq!(&record[68..72], &900u32.to_le_bytes());
    }

    #[test]
    fn parses_entries_in_order() {
        let bytes = encode_manifest(&[
            entry("a.prop", "x.pkb", 8, 12),
            entry("b.moa", "y.pkb", 20, 4),
        ]);
        let table = IndexTable::parse(&bytes);
        assert!(table.is_recognized());
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0], entry("a.prop", "x.pkb", 8, 12));
        assert_eq!(table.entries()[1].filename, "b.moa");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let bytes = encode_manifest(&[
            entry("a.prop", "Worlds_3G.PKB", 8, 12),
            entry("b.prop", "char_npc.pkb", 8, 12),
            entry("c.prop", "worlds_3g.pkb", 20, 12),
        ]);
        let table = IndexTable::parse(&bytes);
        let names: Vec<_> = table
            .entries_for("worlds_3g.pkb")
            .map(|e| e.filename.as_str())
            .collect();
        assert_eq!(names, ["a.prop", "c.prop"]);
        assert_eq!(table.containers(), ["Worlds_3G.PKB", "char_npc.pkb"]);
        assert_eq!(table.find("B.PROP").map(|e| e.offset), Some(8));
    }

    #[test]
    fn matched_entries_outlive_the_query() {
        let table = IndexTable::parse(&encode_manifest(&[entry("a.prop", "x.pkb", 8, 12)]));
        let matched: Vec<&IndexEntry> = {
            let query = String::from("X.PKB");
            table.entries_for(&query).collect()
        };
        assert_eq!(matched, [&entry("a.prop", "x.pkb", 8, 12)]);
    }

    #[test]
    fn truncated_final_record_is_dropped() {
        let mut bytes = encode_manifest(&[entry("a.prop", "x.pkb", 8, 12), entry("b.prop", "x.pkb", 8, 12)]);
        bytes.truncate(bytes.len() - 1);
        let table = IndexTable::parse(&bytes);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn declared_count_limits_records() {
        let mut bytes = encode_manifest(&[entry("a.prop", "x.pkb", 8, 12), entry("b.prop", "x.pkb", 8, 12)]);
        bytes[4..8].copy_from_slice(&1u32.to_le_bytes());
        assert_eq!(IndexTable::parse(&bytes).len(), 1);
    }

    #[test]
    fn unknown_signature_gives_empty_table() {
        let table = IndexTable::parse(b"NOPE\x01\x00\x00\x00");
        assert!(!table.is_recognized());
        assert!(table.is_empty());
        assert_eq!(table.raw(), b"NOPE\x01\x00\x00\x00");

        assert_eq!(
            parse_entries(b"NOPE"),
            Err(DecodeError::UnrecognizedFormat { signature: *b"NOPE" })
        );
        assert!(matches!(parse_entries(b"LT"), Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn slice_checks_bounds() {
        let container = [0u8; 20];
        assert_eq!(entry("a", "x", 8, 12).slice(&container).map(<[u8]>::len), Ok(12));
        assert!(matches!(
            entry("a", "x", 9, 12).slice(&container),
            Err(DecodeError::MalformedEntry { available: 20, .. })
        ));
        assert!(entry("a", "x", 4, 0).slice(&container).is_err());
        assert!(entry("a", "x", u32::MAX, u32::MAX).slice(&container).is_err());
    }

    proptest! {
        #[test]
        fn parse_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let table = IndexTable::parse(&bytes);
            prop_assert!(table.len() <= bytes.len() / MANIFEST_RECORD_SIZE);
        }
    }
}
