//! Merge and package assembly engine for extpack.
//!
//! This crate turns many partial manifests into one distributable package:
//! glob discovery (`discover_manifests`), the ordered field-by-field merge
//! into the platform and package manifests (`MergeEngine`), canonical
//! manifest-asset preparation, manifest serialization, the OPC content-type
//! index, output path resolution, and the `Packager` that writes the final
//! archive. `read_package_identity` reads the identity back out of a built
//! package.

pub mod assemble;
pub mod content_types;
pub mod discovery;
pub mod inspect;
pub mod merge;
pub mod output;
pub mod prepare;
pub mod settings;
pub mod writer;

pub use assemble::{PackageResult, Packager};
pub use content_types::{content_type_for, ContentTypeIndex, DEFAULT_CONTENT_TYPE};
pub use discovery::discover_manifests;
pub use inspect::{read_package_identity, read_package_identity_file};
pub use merge::{MergeEngine, MergedManifests};
pub use output::{auto_file_name, resolve_output_path, AUTO_OUTPUT, PACKAGE_EXTENSION};
pub use prepare::prepare_package;
pub use settings::{MergeSettings, PackageConfig, DEFAULT_MANIFEST_GLOB};
pub use writer::{package_manifest_text, platform_manifest_text, write_manifests};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: no manifests found matching [{}]", .patterns.join(", "))]
    NoManifestsFound { patterns: Vec<String> },
    #[error("manifest error: invalid manifest glob '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("manifest error: {0}")]
    Manifest(#[from] extpack_schema::ManifestError),
    #[error("manifest error: invalid asset in '{}': {reason}", .path.display())]
    InvalidAssetShape { path: PathBuf, reason: String },
    #[error("manifest error: asset path '{asset}' in '{}' must be relative", .path.display())]
    AbsolutePath { path: PathBuf, asset: String },
    #[error("manifest error: field '{field}' in '{}' cannot be {found}", .path.display())]
    InvalidFieldType {
        field: String,
        path: PathBuf,
        found: String,
    },
    #[error("platform manifest has no root directory; asset files cannot be located")]
    MissingRoot,
    #[error("failed to read asset '{}': {source}", .path.display())]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid package: {0}")]
    InvalidPackage(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}
