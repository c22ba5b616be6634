use crate::types::{AssetType, ExtensionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `Identity` element of the package manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: ExtensionId,
    pub version: String,
    pub publisher: String,
    pub language: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            id: ExtensionId::default(),
            version: String::new(),
            publisher: String::new(),
            language: "en-US".to_owned(),
        }
    }
}

/// One `Assets/Asset` element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageAsset {
    pub asset_type: AssetType,
    pub path: String,
}

/// A metadata field stored as a single delimited string (`Tags`,
/// `Categories`, `GalleryFlags`). Items are unique and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedList {
    separator: char,
    items: Vec<String>,
}

impl DelimitedList {
    pub fn new(separator: char) -> Self {
        Self {
            separator,
            items: Vec::new(),
        }
    }

    /// Merge values in. Each value is itself split on the separator; empty
    /// pieces are dropped and duplicates ignored.
    pub fn union<'a>(&mut self, values: impl IntoIterator<Item = &'a str>) {
        for value in values {
            for piece in value.split(self.separator) {
                let piece = piece.trim();
                if !piece.is_empty() && !self.contains(piece) {
                    self.items.push(piece.to_owned());
                }
            }
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for DelimitedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", self.separator)?;
            }
            f.write_str(item)?;
        }
        Ok(())
    }
}

/// The store-facing merge target, written as `extension.vsixmanifest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    pub identity: Identity,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub release_notes: Option<String>,
    pub tags: DelimitedList,
    pub categories: DelimitedList,
    pub gallery_flags: DelimitedList,
    pub icon: Option<String>,
    pub assets: Vec<PackageAsset>,
}

impl Default for PackageManifest {
    fn default() -> Self {
        Self {
            identity: Identity::default(),
            display_name: None,
            description: None,
            release_notes: None,
            tags: DelimitedList::new(','),
            categories: DelimitedList::new(','),
            gallery_flags: DelimitedList::new(' '),
            icon: None,
            assets: Vec::new(),
        }
    }
}

impl PackageManifest {
    /// Append an asset. A default-icon asset also becomes `Icon`.
    pub fn push_asset(&mut self, asset_type: AssetType, path: String) {
        if asset_type.is_default_icon() {
            self.icon = Some(path.clone());
        }
        self.assets.push(PackageAsset { asset_type, path });
    }
}
