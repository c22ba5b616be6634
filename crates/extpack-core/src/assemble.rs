use crate::content_types::ContentTypeIndex;
use crate::merge::{has_parent_component, MergeEngine, MergedManifests};
use crate::output::resolve_output_path;
use crate::prepare::prepare_package;
use crate::settings::MergeSettings;
use crate::writer::write_manifests;
use crate::CoreError;
use extpack_schema::{
    is_absolute_like, Identity, ManifestError, PackageAsset, CONTENT_TYPES_NAME,
    PACKAGE_MANIFEST_NAME, PLATFORM_MANIFEST_NAME,
};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Result of a successful package build.
#[derive(Debug, Clone)]
pub struct PackageResult {
    pub path: PathBuf,
    pub identity: Identity,
    /// Archive part names in the order they were written.
    pub files: Vec<String>,
}

/// Assembles a package from the partial manifests described by a
/// [`MergeSettings`].
///
/// Nothing is written to the destination unless every step succeeds.
pub struct Packager {
    settings: MergeSettings,
}

impl Packager {
    pub fn new(settings: MergeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MergeSettings {
        &self.settings
    }

    /// Merge all partials and leave the single canonical manifest asset.
    pub fn prepare(&self) -> Result<MergedManifests, CoreError> {
        let mut merged = MergeEngine::new(&self.settings).merge()?;
        prepare_package(&mut merged.package);
        Ok(merged)
    }

    /// Build the archive in memory. Returns the prepared manifests, the
    /// archive bytes, and the part names in archive order.
    pub fn build_archive(&self) -> Result<(MergedManifests, Vec<u8>, Vec<String>), CoreError> {
        let merged = self.prepare()?;
        let root = PathBuf::from(merged.platform.root().ok_or(CoreError::MissingRoot)?);

        let mut staged = stage_assets(&root, &merged.package.assets)?;
        info!("staged {} asset file(s)", staged.len());

        // Manifests go through an exclusively owned scratch directory that is
        // removed when `scratch` drops, on success and on error.
        let scratch = tempfile::tempdir()?;
        let (platform_path, package_path) =
            write_manifests(scratch.path(), &merged.platform, &merged.package)?;
        staged.insert(PLATFORM_MANIFEST_NAME.to_owned(), fs::read(platform_path)?);
        staged.insert(PACKAGE_MANIFEST_NAME.to_owned(), fs::read(package_path)?);

        let index = ContentTypeIndex::from_names(staged.keys().map(String::as_str));
        let content_types = index.to_xml()?;

        let (bytes, files) = compress(&content_types, &staged)?;
        Ok((merged, bytes, files))
    }

    /// Build the package and write it to the location named by `output_spec`
    /// (see [`resolve_output_path`]), relative to the current directory.
    pub fn build(&self, output_spec: &str) -> Result<PackageResult, CoreError> {
        let cwd = std::env::current_dir()?;
        self.build_in(output_spec, &cwd)
    }

    pub fn build_in(&self, output_spec: &str, cwd: &Path) -> Result<PackageResult, CoreError> {
        info!(
            "building package from {} manifest glob(s) under {}",
            self.settings.manifest_globs().len(),
            self.settings.root().display()
        );
        let (merged, bytes, files) = self.build_archive()?;
        let identity = merged.package.identity;
        let path = resolve_output_path(output_spec, &identity, cwd);

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| CoreError::Io(e.error))?;

        info!("wrote package {} ({} bytes)", path.display(), bytes.len());
        Ok(PackageResult {
            path,
            identity,
            files,
        })
    }
}

/// Read every non-manifest asset below `root`, keyed by part name. A part
/// name that is absolute or has a `..` component is refused.
fn stage_assets(
    root: &Path,
    assets: &[PackageAsset],
) -> Result<BTreeMap<String, Vec<u8>>, CoreError> {
    let mut staged = BTreeMap::new();
    for asset in assets {
        if asset.asset_type.is_manifest() || staged.contains_key(&asset.path) {
            continue;
        }
        if is_absolute_like(&asset.path) || has_parent_component(&asset.path) {
            return Err(CoreError::Manifest(ManifestError::AssetOutsideRoot {
                path: PathBuf::from(PACKAGE_MANIFEST_NAME),
                asset: asset.path.clone(),
            }));
        }
        let source = root.join(&asset.path);
        let bytes = fs::read(&source).map_err(|e| CoreError::AssetRead {
            path: source.clone(),
            source: e,
        })?;
        debug!("staged {} ({} bytes)", asset.path, bytes.len());
        staged.insert(asset.path.clone(), bytes);
    }
    Ok(staged)
}

/// Zip the content-type index and staged parts. Entries carry a fixed
/// timestamp and are written index first, then by name, so equal inputs
/// produce equal bytes.
fn compress(
    content_types: &str,
    staged: &BTreeMap<String, Vec<u8>>,
) -> Result<(Vec<u8>, Vec<String>), CoreError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut files = Vec::with_capacity(staged.len() + 1);

    zip.start_file(CONTENT_TYPES_NAME, entry_options())?;
    zip.write_all(content_types.as_bytes())?;
    files.push(CONTENT_TYPES_NAME.to_owned());

    for (name, data) in staged {
        zip.start_file(name.as_str(), entry_options())?;
        zip.write_all(data)?;
        files.push(name.clone());
    }

    Ok((zip.finish()?.into_inner(), files))
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}
