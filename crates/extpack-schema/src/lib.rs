//! Partial manifests, assets, and the two target documents for extpack.
//!
//! This crate defines the schema layer: loading partial manifest fragments
//! from disk (`load_partial`), validating and rewriting their asset paths
//! relative to the merge root (`Asset`), and the in-memory shape of the two
//! merge targets, the machine-consumed `PlatformManifest` and the store-facing
//! `PackageManifest`.

pub mod asset;
pub mod package;
pub mod partial;
pub mod platform;
pub mod types;

pub use asset::{is_absolute_like, relative_to_root, Asset};
pub use package::{DelimitedList, Identity, PackageAsset, PackageManifest};
pub use partial::{json_kind, load_partial, parse_partial_str, ManifestError, PartialManifest};
pub use platform::{PlatformManifest, BOOKKEEPING_PREFIX};
pub use types::{AssetType, ExtensionId};

/// File name of the platform manifest inside a built package.
pub const PLATFORM_MANIFEST_NAME: &str = "extension.vsomanifest";
/// File name of the package manifest inside a built package.
pub const PACKAGE_MANIFEST_NAME: &str = "extension.vsixmanifest";
/// File name of the OPC content-type index inside a built package.
pub const CONTENT_TYPES_NAME: &str = "[Content_Types].xml";
