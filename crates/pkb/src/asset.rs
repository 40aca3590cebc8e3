//! Extracted asset records.

use std::fmt;

use pkb_decode::AssetKind;

use crate::cache::ContentKey;

/// How an asset was located, in decreasing order of confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    /// Manifest row naming this container.
    Index,
    /// The container's own directory.
    DirectContainer,
    /// Filename scan. The payload is a placeholder, not real data.
    Heuristic,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::DirectContainer => "direct-container",
            Self::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located asset with its bytes copied out of the container.
///
/// For [`Method::Index`] and [`Method::DirectContainer`] the range
/// `offset..offset + size` lies inside the container and `bytes` is exactly
/// that range. For [`Method::Heuristic`] only `name` is meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAsset {
    pub name: String,
    pub size: u32,
    pub offset: u32,
    pub bytes: Vec<u8>,
    pub container_name: String,
    pub method: Method,
}

impl ExtractedAsset {
    #[must_use]
    pub fn kind(&self) -> AssetKind {
        AssetKind::from_name(&self.name)
    }

    /// Whether `bytes` is a stand-in rather than recovered data.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.method == Method::Heuristic
    }

    /// Cache key for the decoded form, absent for placeholders.
    #[must_use]
    pub fn content_key(&self) -> Option<ContentKey> {
        (!self.is_placeholder()).then(|| ContentKey::new(&self.container_name, self.offset, self.size))
    }
}
