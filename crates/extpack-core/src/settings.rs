use crate::output::AUTO_OUTPUT;
use crate::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Glob used when neither the command line nor a config file names one.
pub const DEFAULT_MANIFEST_GLOB: &str = "vss-extension.json";

/// Inputs of one merge run: where manifests live, which files to merge, and
/// an optional overrides document applied after every discovered partial.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSettings {
    root: PathBuf,
    manifest_globs: Vec<String>,
    overrides: Option<Map<String, Value>>,
}

impl MergeSettings {
    pub fn new(root: impl Into<PathBuf>, manifest_globs: Vec<String>) -> Self {
        Self {
            root: root.into(),
            manifest_globs,
            overrides: None,
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: Map<String, Value>) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_globs(&self) -> &[String] {
        &self.manifest_globs
    }

    pub fn overrides(&self) -> Option<&Map<String, Value>> {
        self.overrides.as_ref()
    }
}

/// Optional JSON config file, e.g. `extpack.json`:
///
/// ```json
/// { "root": ".", "manifestGlobs": ["vss-extension.json"], "outputPath": "dist" }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackageConfig {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub manifest_globs: Vec<String>,
    #[serde(default)]
    pub overrides: Option<Map<String, Value>>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl PackageConfig {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        serde_json::from_str(content)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))
    }

    /// Root directory; relative config roots are taken relative to the
    /// config file's directory.
    pub fn resolved_root(&self, config_path: Option<&Path>) -> PathBuf {
        let root = self.root.clone().unwrap_or_else(|| PathBuf::from("."));
        match config_path.and_then(Path::parent) {
            Some(dir) if root.is_relative() && !dir.as_os_str().is_empty() => dir.join(root),
            _ => root,
        }
    }

    pub fn output_path(&self) -> &str {
        self.output_path.as_deref().unwrap_or(AUTO_OUTPUT)
    }

    pub fn into_settings(self, config_path: Option<&Path>) -> MergeSettings {
        let root = self.resolved_root(config_path);
        let globs = if self.manifest_globs.is_empty() {
            vec![DEFAULT_MANIFEST_GLOB.to_owned()]
        } else {
            self.manifest_globs
        };
        let settings = MergeSettings::new(root, globs);
        match self.overrides {
            Some(overrides) => settings.with_overrides(overrides),
            None => settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_load_reads_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extpack.json");
        std::fs::write(
            &path,
            r#"{
                "root": "src",
                "manifestGlobs": ["vss-extension.json", "features/*.json"],
                "overrides": {"public": false},
                "outputPath": "dist"
            }"#,
        )
        .unwrap();

        let config = PackageConfig::load(&path).unwrap();
        assert_eq!(config.manifest_globs.len(), 2);
        assert_eq!(config.output_path(), "dist");

        let settings = config.into_settings(Some(&path));
        assert_eq!(settings.root(), dir.path().join("src"));
        assert_eq!(settings.overrides().unwrap()["public"], json!(false));
    }

    #[test]
    fn config_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extpack.json");
        std::fs::write(&path, r#"{"rooot": "."}"#).unwrap();
        let err = PackageConfig::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = PackageConfig::default();
        assert_eq!(config.output_path(), AUTO_OUTPUT);
        let settings = config.into_settings(None);
        assert_eq!(settings.root(), Path::new("."));
        assert_eq!(settings.manifest_globs(), [DEFAULT_MANIFEST_GLOB]);
        assert!(settings.overrides().is_none());
    }

    #[test]
    fn absolute_root_ignores_config_dir() {
        let config = PackageConfig {
            root: Some(PathBuf::from("/abs/ext")),
            ..PackageConfig::default()
        };
        assert_eq!(
            config.resolved_root(Some(Path::new("/elsewhere/extpack.json"))),
            PathBuf::from("/abs/ext")
        );
    }
}
