use crate::asset::Asset;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const BYTE_ORDER_MARK: char = '\u{feff}';
const OVERRIDES_ORIGIN: &str = "<overrides>";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest '{}': {reason}\n--- content ---\n{content}", .path.display())]
    Parse {
        path: PathBuf,
        reason: String,
        content: String,
    },
    #[error("invalid asset in '{}': {reason}", .path.display())]
    InvalidAsset { path: PathBuf, reason: String },
    #[error("asset path '{asset}' in '{}' must be relative", .path.display())]
    AbsoluteAssetPath { path: PathBuf, asset: String },
    #[error("asset path '{asset}' in '{}' resolves outside the manifest root", .path.display())]
    AssetOutsideRoot { path: PathBuf, asset: String },
}

/// One input fragment: a JSON object plus the file it came from.
///
/// `origin` is provenance only and never serialized. It is `None` for the
/// overrides document, whose asset paths are already root-relative.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialManifest {
    pub origin: Option<PathBuf>,
    pub fields: Map<String, Value>,
}

impl PartialManifest {
    /// Wrap an overrides document. Its assets are checked for shape but
    /// their paths are not rewritten.
    pub fn from_overrides(fields: Map<String, Value>) -> Result<Self, ManifestError> {
        let mut partial = Self {
            origin: None,
            fields,
        };
        let origin = partial.origin_path();
        for raw in partial.assets_values_mut() {
            let assets = validate_assets(raw, &origin)?;
            *raw = Value::Array(assets.iter().map(Asset::to_value).collect());
        }
        Ok(partial)
    }

    /// Path used in diagnostics; overrides report a placeholder.
    pub fn origin_path(&self) -> PathBuf {
        self.origin
            .clone()
            .unwrap_or_else(|| PathBuf::from(OVERRIDES_ORIGIN))
    }

    /// Look up a field by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Every `assets` array, including keys that differ only in case.
    fn assets_values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.fields
            .iter_mut()
            .filter(|(k, _)| k.eq_ignore_ascii_case("assets"))
            .map(|(_, v)| v)
    }
}

/// Parse partial manifest text. A leading byte-order mark is ignored and the
/// document must be a JSON object.
pub fn parse_partial_str(input: &str, path: &Path) -> Result<Map<String, Value>, ManifestError> {
    let text = input.strip_prefix(BYTE_ORDER_MARK).unwrap_or(input);
    let parse_error = |reason: String| ManifestError::Parse {
        path: path.to_path_buf(),
        reason,
        content: input.to_owned(),
    };
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(parse_error(format!(
            "expected a JSON object at the top level, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(parse_error(e.to_string())),
    }
}

/// Load one partial manifest and rewrite its asset paths relative to `root`.
pub fn load_partial(path: &Path, root: &Path) -> Result<PartialManifest, ManifestError> {
    debug!("loading partial manifest {}", path.display());
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let fields = parse_partial_str(&content, path)?;

    let mut partial = PartialManifest {
        origin: Some(path.to_path_buf()),
        fields,
    };

    let owner_dir = path.parent().unwrap_or(Path::new("."));
    for raw in partial.assets_values_mut() {
        let mut rebased = Vec::new();
        for asset in validate_assets(raw, path)? {
            rebased.push(asset.rebase(owner_dir, root, path)?.to_value());
        }
        *raw = Value::Array(rebased);
    }
    Ok(partial)
}

fn validate_assets(raw: &Value, origin: &Path) -> Result<Vec<Asset>, ManifestError> {
    let Value::Array(entries) = raw else {
        return Err(ManifestError::InvalidAsset {
            path: origin.to_path_buf(),
            reason: format!("'assets' must be an array, found {}", json_kind(raw)),
        });
    };
    entries
        .iter()
        .map(|entry| Asset::from_value(entry, origin))
        .collect()
}

/// Short description of a JSON value's kind for diagnostics.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
