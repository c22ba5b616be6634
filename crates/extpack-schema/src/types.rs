//! Newtype wrappers for manifest string values that carry their own rules.
//!
//! Both newtypes serialize/deserialize as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_newtype!(
    /// Asset type token, e.g. `Microsoft.VisualStudio.Services.Icons.Default`.
    AssetType
);

string_newtype!(
    /// Package identity id. Dots are not allowed, so they become dashes.
    ExtensionId
);

impl AssetType {
    /// Current type token of the platform manifest's self-reference.
    pub const MANIFEST: &'static str = "Microsoft.VisualStudio.Services.Manifest";
    /// Legacy type token of the platform manifest's self-reference.
    pub const LEGACY_MANIFEST: &'static str = "Microsoft.VisualStudio.Services.VsoManifest";
    pub const DEFAULT_ICON: &'static str = "Microsoft.VisualStudio.Services.Icons.Default";
    pub const WIDE_ICON: &'static str = "Microsoft.VisualStudio.Services.Icons.Wide";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn manifest() -> Self {
        Self::new(Self::MANIFEST)
    }

    /// True for either the current or the legacy manifest token, any case.
    pub fn is_manifest(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::MANIFEST)
            || self.0.eq_ignore_ascii_case(Self::LEGACY_MANIFEST)
    }

    pub fn is_default_icon(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::DEFAULT_ICON)
    }
}

impl ExtensionId {
    /// Build an id from a namespace-style value (`my.ext` becomes `my-ext`).
    pub fn from_namespace(value: &str) -> Self {
        Self(value.replace('.', "-"))
    }
}

impl From<&str> for AssetType {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for AssetType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_id_replaces_every_dot() {
        let id = ExtensionId::from_namespace("contoso.tools.build");
        assert_eq!(id, "contoso-tools-build");
    }

    #[test]
    fn manifest_type_matches_both_tokens_case_insensitively() {
        assert!(AssetType::from("microsoft.visualstudio.services.manifest").is_manifest());
        assert!(AssetType::from(AssetType::LEGACY_MANIFEST).is_manifest());
        assert!(!AssetType::from(AssetType::DEFAULT_ICON).is_manifest());
    }

    #[test]
    fn default_icon_detection() {
        assert!(AssetType::from("Microsoft.VisualStudio.Services.ICONS.Default").is_default_icon());
        assert!(!AssetType::from(AssetType::WIDE_ICON).is_default_icon());
    }

    #[test]
    fn asset_type_serializes_as_plain_string() {
        let json = serde_json::to_string(&AssetType::manifest()).unwrap();
        assert_eq!(json, format!("\"{}\"", AssetType::MANIFEST));
    }
}
