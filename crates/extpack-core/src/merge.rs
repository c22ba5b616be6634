use crate::discovery::discover_manifests;
use crate::settings::MergeSettings;
use crate::CoreError;
use extpack_schema::{
    is_absolute_like, json_kind, load_partial, Asset, AssetType, ExtensionId, ManifestError,
    PackageManifest, PartialManifest, PlatformManifest,
};
use serde_json::{Number, Value};
use std::path::{Component, Path};
use tracing::{debug, info};

const PUBLIC_FLAG: &str = "Public";

/// The two merge targets, built together by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedManifests {
    pub platform: PlatformManifest,
    pub package: PackageManifest,
}

/// Folds partial manifests into the platform and package manifests.
///
/// Partials are applied strictly in discovery order, followed by the
/// overrides document. Later partials see the state left by earlier ones.
pub struct MergeEngine<'a> {
    settings: &'a MergeSettings,
}

impl<'a> MergeEngine<'a> {
    pub fn new(settings: &'a MergeSettings) -> Self {
        Self { settings }
    }

    /// Discover and load every partial, with the overrides document last.
    pub fn load(&self) -> Result<Vec<PartialManifest>, CoreError> {
        let root = self.settings.root();
        let paths = discover_manifests(root, self.settings.manifest_globs())?;

        let mut partials = Vec::with_capacity(paths.len() + 1);
        for path in &paths {
            partials.push(load_partial(path, root)?);
        }
        if let Some(overrides) = self.settings.overrides() {
            debug!("applying overrides after {} partial(s)", paths.len());
            partials.push(PartialManifest::from_overrides(overrides.clone())?);
        }
        Ok(partials)
    }

    pub fn merge(&self) -> Result<MergedManifests, CoreError> {
        let partials = self.load()?;
        merge_partials(&partials, self.settings.root())
    }
}

/// Fold already-loaded partials, in order, into fresh target documents.
pub fn merge_partials(
    partials: &[PartialManifest],
    root: &Path,
) -> Result<MergedManifests, CoreError> {
    info!("merging {} partial manifest(s)", partials.len());

    let mut merged = MergedManifests {
        platform: PlatformManifest::default(),
        package: PackageManifest::default(),
    };
    merged
        .platform
        .set_bookkeeping("root", Value::String(root.to_string_lossy().into_owned()));

    for partial in partials {
        let origin = partial.origin_path();
        for (key, value) in &partial.fields {
            if key.eq_ignore_ascii_case("assets") {
                for asset in revalidate_assets(value, &origin)? {
                    merged.package.push_asset(asset.asset_type, asset.path);
                }
                continue;
            }
            merged.apply_field(key, value, &origin)?;
        }
    }
    Ok(merged)
}

impl MergedManifests {
    fn apply_field(&mut self, key: &str, value: &Value, origin: &Path) -> Result<(), CoreError> {
        let platform = &mut self.platform;
        let package = &mut self.package;

        match key.to_ascii_lowercase().as_str() {
            "id" | "namespace" | "extensionid" => {
                package.identity.id = ExtensionId::from_namespace(&text(key, value, origin)?);
            }
            "version" => {
                let version = text(key, value, origin)?;
                platform.version = Some(version.clone());
                package.identity.version = version;
            }
            "name" => {
                let name = text(key, value, origin)?;
                platform.name = Some(name.clone());
                package.display_name = Some(name);
            }
            "description" => {
                let description = text(key, value, origin)?;
                platform.description = Some(description.clone());
                package.description = Some(description);
            }
            "versioncheckuri" => platform.version_check_uri = Some(text(key, value, origin)?),
            "baseuri" => platform.base_uri = Some(text(key, value, origin)?),
            "icon" | "icons" => apply_icons(package, key, value, origin)?,
            "manifestversion" => platform.manifest_version = coerce_manifest_version(value),
            "public" => {
                // `false` records the bookkeeping value but never clears a
                // flag set earlier in the run.
                if let Value::Bool(public) = value {
                    if *public {
                        package.gallery_flags.union([PUBLIC_FLAG]);
                    }
                    platform.set_bookkeeping("public", Value::Bool(*public));
                } else {
                    debug!("ignoring non-boolean 'public' in {}", origin.display());
                }
            }
            "publisher" => package.identity.publisher = text(key, value, origin)?,
            "releasenotes" => package.release_notes = Some(text(key, value, origin)?),
            "scopes" => {
                let scopes = strings(key, value, origin)?;
                platform.union_scopes(scopes.iter().map(String::as_str));
            }
            "tags" => {
                let tags = strings(key, value, origin)?;
                package.tags.union(tags.iter().map(String::as_str));
            }
            "vsoflags" | "galleryflags" => {
                let flags = strings(key, value, origin)?;
                package.gallery_flags.union(flags.iter().map(String::as_str));
            }
            "categories" => {
                let categories = strings(key, value, origin)?;
                package.categories.union(categories.iter().map(String::as_str));
            }
            "contributions" => platform
                .contributions
                .extend(array(key, value, origin)?.iter().cloned()),
            "contributiontypes" => platform
                .contribution_types
                .extend(array(key, value, origin)?.iter().cloned()),
            _ => debug!("ignoring unknown field '{key}' in {}", origin.display()),
        }
        Ok(())
    }
}

/// Check one `assets` array again before it reaches the package manifest.
fn revalidate_assets(raw: &Value, origin: &Path) -> Result<Vec<Asset>, CoreError> {
    let Value::Array(entries) = raw else {
        return Err(CoreError::InvalidAssetShape {
            path: origin.to_path_buf(),
            reason: format!("'assets' must be an array, found {}", json_kind(raw)),
        });
    };

    let mut assets = Vec::with_capacity(entries.len());
    for entry in entries {
        let asset = Asset::from_value(entry, origin).map_err(|e| match e {
            ManifestError::AbsoluteAssetPath { path, asset } => {
                CoreError::AbsolutePath { path, asset }
            }
            ManifestError::InvalidAsset { path, reason } => {
                CoreError::InvalidAssetShape { path, reason }
            }
            other => CoreError::Manifest(other),
        })?;
        let path = package_relative(&asset.path, origin)?;
        assets.push(Asset { path, ..asset });
    }
    Ok(assets)
}

/// Normalise a root-relative path to `/` separators. Paths here are already
/// root-relative, so an absolute path or a `..` component would reach outside
/// the package root.
fn package_relative(path: &str, origin: &Path) -> Result<String, CoreError> {
    if is_absolute_like(path) {
        return Err(CoreError::AbsolutePath {
            path: origin.to_path_buf(),
            asset: path.to_owned(),
        });
    }
    let normalized = path.replace('\\', "/");
    if has_parent_component(&normalized) {
        return Err(CoreError::Manifest(ManifestError::AssetOutsideRoot {
            path: origin.to_path_buf(),
            asset: normalized,
        }));
    }
    Ok(normalized)
}

pub(crate) fn has_parent_component(path: &str) -> bool {
    Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}

fn apply_icons(
    package: &mut PackageManifest,
    key: &str,
    value: &Value,
    origin: &Path,
) -> Result<(), CoreError> {
    let Value::Object(icons) = value else {
        return Err(invalid_type(key, value, origin));
    };
    for (sub_key, asset_type) in [
        ("default", AssetType::DEFAULT_ICON),
        ("wide", AssetType::WIDE_ICON),
    ] {
        let Some(path_value) = icons.get(sub_key) else {
            continue;
        };
        let path = package_relative(&text(key, path_value, origin)?, origin)?;
        package.push_asset(AssetType::new(asset_type), path);
    }
    Ok(())
}

/// Numeric coercion; zero, empty, and non-numeric values become 1.
fn coerce_manifest_version(value: &Value) -> Number {
    let coerced = match value {
        Value::Number(n) if n.as_f64().is_some_and(f64::is_normal) => return n.clone(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(true) => Some(1.0),
        _ => None,
    };
    match coerced.filter(|f| f.is_normal()) {
        Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Number::from(f as i64),
        Some(f) => Number::from_f64(f).unwrap_or_else(|| Number::from(1)),
        None => Number::from(1),
    }
}

fn text(key: &str, value: &Value, origin: &Path) -> Result<String, CoreError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(invalid_type(key, other, origin)),
    }
}

/// An array of scalars, or one delimited string left for the caller to split.
fn strings(key: &str, value: &Value, origin: &Path) -> Result<Vec<String>, CoreError> {
    match value {
        Value::Array(items) => items.iter().map(|v| text(key, v, origin)).collect(),
        Value::String(s) => Ok(vec![s.clone()]),
        other => Err(invalid_type(key, other, origin)),
    }
}

fn array<'v>(key: &str, value: &'v Value, origin: &Path) -> Result<&'v [Value], CoreError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(invalid_type(key, other, origin)),
    }
}

fn invalid_type(key: &str, value: &Value, origin: &Path) -> CoreError {
    CoreError::InvalidFieldType {
        field: key.to_owned(),
        path: origin.to_path_buf(),
        found: json_kind(value).to_owned(),
    }
}
