//! PKB container directory parsing.
//!
//! # Format
//!
//! ```text
//! 0x00: signature "PKB\0"
//! 0x04: file count u32
//! 0x08: directory, 40 bytes per file:
//!       +0x00 filename (32 bytes, NUL padded)
//!       +0x20 offset u32 (into this container)
//!       +0x24 size u32
//! ```

use crate::error::{DecodeError, DecodeResult};
use crate::manifest::slice_range;
use crate::reader::{read_name, read_signature, read_u32_le, write_name};

/// Container signature, including the trailing NUL.
pub const CONTAINER_SIGNATURE: [u8; 4] = *b"PKB\0";

/// Size of the container header.
pub const CONTAINER_HEADER_SIZE: usize = 8;

/// Size of one directory record.
pub const DIRECTORY_RECORD_SIZE: usize = 40;

const NAME_WIDTH: usize = 32;

/// One directory row. The container is implicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDirectoryEntry {
    pub filename: String,
    pub offset: u32,
    pub size: u32,
}

impl ContainerDirectoryEntry {
    /// Decode one 40-byte record.
    #[must_use]
    pub fn from_bytes(record: &[u8]) -> Option<Self> {
        if record.len() < DIRECTORY_RECORD_SIZE {
            return None;
        }
        Some(Self {
            filename: read_name(&record[..NAME_WIDTH]),
            offset: read_u32_le(record, 32)?,
            size: read_u32_le(record, 36)?,
        })
    }

    /// Encode as a 40-byte record.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; DIRECTORY_RECORD_SIZE] {
        let mut out = Vec::with_capacity(DIRECTORY_RECORD_SIZE);
        write_name(&mut out, &self.filename, NAME_WIDTH);
        out.extend_from_slice(&self.offset.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());

        let mut record = [0u8; DIRECTORY_RECORD_SIZE];
        record.copy_from_slice(&out);
        record
    }

    /// Borrow this entry's payload out of the container it was read from.
    pub fn slice<'a>(&self, container: &'a [u8]) -> DecodeResult<&'a [u8]> {
        slice_range(&self.filename, self.offset, self.size, container)
    }
}

/// The embedded directory of one container.
#[derive(Debug, Clone, Default)]
pub struct ContainerDirectory {
    pub entries: Vec<ContainerDirectoryEntry>,
}

impl ContainerDirectory {
    /// Parse the directory at the start of `bytes`.
    ///
    /// Fails only when the header is missing or carries another signature.
    /// Records are read until the declared count is reached or fewer than 40
    /// bytes remain.
    pub fn parse(bytes: &[u8]) -> DecodeResult<Self> {
        let truncated = || DecodeError::Truncated {
            needed: CONTAINER_HEADER_SIZE,
            available: bytes.len(),
        };
        let signature = read_signature(bytes).ok_or_else(truncated)?;
        if signature != CONTAINER_SIGNATURE {
            return Err(DecodeError::UnrecognizedFormat { signature });
        }
        let count = read_u32_le(bytes, 4).ok_or_else(truncated)?;
        let count = usize::try_from(count).unwrap_or(usize::MAX);

        let entries: Vec<_> = bytes[CONTAINER_HEADER_SIZE..]
            .chunks_exact(DIRECTORY_RECORD_SIZE)
            .take(count)
            .filter_map(ContainerDirectoryEntry::from_bytes)
            .collect();

        tracing::debug!(
            "Container directory declares {count} files, read {}",
            entries.len()
        );
        Ok(Self { entries })
    }

    /// Entries whose payload lies inside `container`, paired with the payload.
    ///
    /// Out-of-bounds entries are logged and skipped.
    pub fn payloads<'d, 'c>(
        &'d self,
        container: &'c [u8],
    ) -> impl Iterator<Item = (&'d ContainerDirectoryEntry, &'c [u8])> {
        self.entries
            .iter()
            .filter_map(move |entry| match entry.slice(container) {
                Ok(payload) => Some((entry, payload)),
                Err(e) => {
                    tracing::warn!("Skipping directory entry: {e}");
                    None
                }
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds a container: header, directory, then payloads back to back.
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    files: Vec<(String, Vec<u8>)>,
}

impl ContainerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named payload.
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        self.files.push((name.into(), payload.into()));
        self
    }

    /// Directory entries the built container will carry.
    #[must_use]
    pub fn directory(&self) -> Vec<ContainerDirectoryEntry> {
        let mut offset = CONTAINER_HEADER_SIZE + self.files.len() * DIRECTORY_RECORD_SIZE;
        self.files
            .iter()
            .map(|(name, payload)| {
                let entry = ContainerDirectoryEntry {
                    filename: name.clone(),
                    offset: u32::try_from(offset).unwrap_or(u32::MAX),
                    size: u32::try_from(payload.len()).unwrap_or(u32::MAX),
                };
                offset += payload.len();
                entry
            })
            .collect()
    }

    /// Encode the container.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&CONTAINER_SIGNATURE);
        out.extend_from_slice(
            &u32::try_from(self.files.len())
                .unwrap_or(u32::MAX)
                .to_le_bytes(),
        );
        for entry in self.directory() {
            out.extend_from_slice(&entry.to_bytes());
        }
        for (_, payload) in &self.files {
            out.extend_from_slice(payload);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trips_through_parse() {
        let builder = ContainerBuilder::new()
            .file("a.prop", vec![1u8; 15])
            .file("b.txa", vec![2u8; 20]);
        let bytes = builder.build();
        let directory = ContainerDirectory::parse(&bytes).unwrap();

        assert_eq!(directory.entries, builder.directory());
        assert_eq!(directory.entries[0].offset, 88);
        assert_eq!(directory.entries[1].offset, 103);

        let payloads: Vec<_> = directory.payloads(&bytes).map(|(_, p)| p).collect();
        assert_eq!(payloads, [&[1u8; 15][..], &[2u8; 20][..]]);
    }

    #[test]
    fn out_of_bounds_entries_are_skipped() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&CONTAINER_SIGNATURE);
        bytes.extend_from_slice(&2u32.to_le_bytes());
        for (name, offset, size) in [("ok.prop", 88u32, 4u32), ("bad.prop", 90, 100)] {
            let entry = ContainerDirectoryEntry {
                filename: name.to_owned(),
                offset,
                size,
            };
            bytes.extend_from_slice(&entry.to_bytes());
        }
        bytes.extend_from_slice(&[9; 8]);

        let directory = ContainerDirectory::parse(&bytes).unwrap();
        assert_eq!(directory.len(), 2);
        let names: Vec<_> = directory
            .payloads(&bytes)
            .map(|(e, _)| e.filename.as_str())
            .collect();
        assert_eq!(names, ["ok.prop"]);
    }

    #[test]
    fn short_directory_stops_early() {
        let mut bytes = ContainerBuilder::new().file("a.prop", vec![0u8; 4]).build();
        bytes[4..8].copy_from_slice(&5u32.to_le_bytes());
        bytes.truncate(CONTAINER_HEADER_SIZE + DIRECTORY_RECORD_SIZE + 2);
        assert_eq!(ContainerDirectory::parse(&bytes).unwrap().len(), 1);
    }

    #[test]
    fn other_signatures_are_rejected() {
        assert_eq!(
            ContainerDirectory::parse(b"LTAI\0\0\0\0").unwrap_err(),
            DecodeError::UnrecognizedFormat { signature: *b"LTAI" }
        );
        assert!(matches!(
            ContainerDirectory::parse(b"PKB"),
            Err(DecodeError::Truncated { .. })
        ));
        assert!(matches!(
            ContainerDirectory::parse(b"PKB\0\x01"),
            Err(DecodeError::Truncated { .. })
        ));
    }
}
