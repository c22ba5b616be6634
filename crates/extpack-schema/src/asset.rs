use crate::partial::ManifestError;
use crate::types::AssetType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// A file referenced by a partial manifest, to be embedded in the package.
///
/// `path` always uses `/` separators. After loading it is relative to the
/// merge root, not to the partial that declared it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub path: String,
}

impl Asset {
    pub fn new(asset_type: impl Into<AssetType>, path: impl Into<String>) -> Self {
        Self {
            asset_type: asset_type.into(),
            path: path.into(),
        }
    }

    /// Validate one raw `assets` entry declared by the manifest at `origin`.
    ///
    /// The entry must be an object with exactly the keys `type` and `path`,
    /// both strings, and the path must be relative.
    pub fn from_value(value: &Value, origin: &Path) -> Result<Self, ManifestError> {
        let invalid = |reason: String| ManifestError::InvalidAsset {
            path: origin.to_path_buf(),
            reason,
        };

        let Value::Object(map) = value else {
            return Err(invalid(format!("expected an object, found {value}")));
        };

        let mut unexpected: Vec<&str> = map
            .keys()
            .map(String::as_str)
            .filter(|k| *k != "type" && *k != "path")
            .collect();
        if !unexpected.is_empty() || map.len() != 2 {
            unexpected.sort_unstable();
            return Err(invalid(format!(
                "asset must have exactly the keys 'type' and 'path' (unexpected: [{}])",
                unexpected.join(", ")
            )));
        }

        let (Some(Value::String(asset_type)), Some(Value::String(raw_path))) =
            (map.get("type"), map.get("path"))
        else {
            return Err(invalid("asset 'type' and 'path' must be strings".to_owned()));
        };

        if is_absolute_like(raw_path) {
            return Err(ManifestError::AbsoluteAssetPath {
                path: origin.to_path_buf(),
                asset: raw_path.clone(),
            });
        }

        Ok(Self::new(asset_type.as_str(), raw_path.replace('\\', "/")))
    }

    /// Re-express this asset's path relative to `root`, given that it was
    /// declared relative to `owner_dir`.
    pub fn rebase(self, owner_dir: &Path, root: &Path, origin: &Path) -> Result<Self, ManifestError> {
        let resolved = owner_dir.join(&self.path);
        let rel = relative_to_root(&resolved, root).map_err(|source| ManifestError::Io {
            path: resolved.clone(),
            source,
        })?;
        match rel {
            Some(path) => Ok(Self { path, ..self }),
            None => Err(ManifestError::AssetOutsideRoot {
                path: origin.to_path_buf(),
                asset: self.path,
            }),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "type": self.asset_type, "path": self.path })
    }
}

/// True if `path` is absolute or rooted on any platform (`/x`, `\x`, `C:\x`).
pub fn is_absolute_like(path: &str) -> bool {
    let p = Path::new(path);
    p.is_absolute() || p.has_root() || path.starts_with(['/', '\\']) || has_drive_prefix(path)
}

/// `C:` style prefix, checked textually so it holds on every host.
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Compute the `/`-separated path of `target` relative to `root`.
///
/// Both paths are made absolute against the current directory and normalized
/// lexically. Returns `None` when `target` is not strictly inside `root`.
pub fn relative_to_root(target: &Path, root: &Path) -> std::io::Result<Option<String>> {
    let target = normalize_lexically(&std::path::absolute(target)?);
    let root = normalize_lexically(&std::path::absolute(root)?);

    let target_parts: Vec<Component<'_>> = target.components().collect();
    let root_parts: Vec<Component<'_>> = root.components().collect();

    let common = target_parts
        .iter()
        .zip(&root_parts)
        .take_while(|(a, b)| a == b)
        .count();
    if common < root_parts.len() || common == target_parts.len() {
        return Ok(None);
    }

    let rest: Vec<String> = target_parts[common..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(Some(rest.join("/")))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // Absolute input: popping at the root is a no-op, as on the OS.
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
