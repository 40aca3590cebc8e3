//! Heuristic filename discovery.
//!
//! Last resort when neither the manifest nor a container directory parses.
//! Finds names only: the payload location of a hit is unknown.

/// Tunables for [`scan_names`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Extensions to look for, including the leading period, lowercase.
    pub extensions: Vec<&'static str>,
    /// Shortest accepted filename, extension included.
    pub min_name_len: usize,
    /// Longest accepted filename, extension included.
    pub max_name_len: usize,
    /// Size of the stand-in payload attached to each hit.
    pub placeholder_size: usize,
    /// Fill byte of the stand-in payload.
    pub placeholder_byte: u8,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec![".moa", ".prop", ".txa"],
            min_name_len: 5,
            max_name_len: 50,
            placeholder_size: 1024,
            placeholder_byte: 0x42,
        }
    }
}

impl ScanOptions {
    /// A stand-in payload for a heuristic hit.
    #[must_use]
    pub fn placeholder(&self) -> Vec<u8> {
        vec![self.placeholder_byte; self.placeholder_size]
    }
}

/// A filename found by scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameHit {
    pub name: String,
    /// Byte position of the first character of the name.
    pub position: usize,
}

fn is_name_byte(b: u8) -> bool {
    (0x20..0x7f).contains(&b)
}

/// Scan `bytes` for printable filenames ending in a known extension.
///
/// For every period, the next bytes (at most five) are compared against the
/// extension list. On a match the name is extended backwards over printable
/// bytes and kept if its length is within bounds.
#[must_use]
pub fn scan_names(bytes: &[u8], options: &ScanOptions) -> Vec<NameHit> {
    let mut hits = Vec::new();

    for (dot, _) in bytes.iter().enumerate().filter(|&(_, &b)| b == b'.') {
        let window = &bytes[dot..bytes.len().min(dot + 5)];
        let Some(ext) = options
            .extensions
            .iter()
            .find(|ext| starts_with_ignore_case(window, ext.as_bytes()))
        else {
            continue;
        };

        // A printable run longer than the limit is rejected anyway.
        let floor = dot.saturating_sub(options.max_name_len);
        let start = bytes[floor..dot]
            .iter()
            .rposition(|&b| !is_name_byte(b))
            .map_or(floor, |i| floor + i + 1);
        let end = dot + ext.len();
        let len = end - start;
        if len < options.min_name_len || len > options.max_name_len {
            tracing::trace!("Rejected name candidate of length {len} at {start}");
            continue;
        }

        let name = String::from_utf8_lossy(&bytes[start..end]).into_owned();
        tracing::debug!("Heuristic hit {name:?} at byte {start}");
        hits.push(NameHit {
            name,
            position: start,
        });
    }

    hits
}

fn starts_with_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}
