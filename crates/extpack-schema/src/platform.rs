use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Prefix of bookkeeping fields added during merge and stripped at write.
pub const BOOKKEEPING_PREFIX: &str = "__meta_";

/// The machine-consumed merge target, written as `extension.vsomanifest`.
///
/// `contributions` and `contribution_types` only ever grow; `scopes` is a
/// deduplicated union kept in first-seen order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default = "default_manifest_version")]
    pub manifest_version: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_check_uri: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub contributions: Vec<Value>,
    #[serde(default)]
    pub contribution_types: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PlatformManifest {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            version: None,
            manifest_version: default_manifest_version(),
            base_uri: None,
            version_check_uri: None,
            scopes: Vec::new(),
            contributions: Vec::new(),
            contribution_types: Vec::new(),
            extra: Map::new(),
        }
    }
}

fn default_manifest_version() -> Number {
    Number::from(1)
}

impl PlatformManifest {
    /// Set `__meta_<key>`.
    pub fn set_bookkeeping(&mut self, key: &str, value: Value) {
        self.extra
            .insert(format!("{BOOKKEEPING_PREFIX}{key}"), value);
    }

    pub fn bookkeeping(&self, key: &str) -> Option<&Value> {
        self.extra.get(&format!("{BOOKKEEPING_PREFIX}{key}"))
    }

    /// The merge root recorded as `__meta_root`, if non-empty.
    pub fn root(&self) -> Option<&str> {
        self.bookkeeping("root")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Add scopes not already present, keeping first-seen order.
    pub fn union_scopes<'a>(&mut self, scopes: impl IntoIterator<Item = &'a str>) {
        for scope in scopes {
            if !self.scopes.iter().any(|s| s == scope) {
                self.scopes.push(scope.to_owned());
            }
        }
    }

    /// Remove every top-level bookkeeping field. Nested values are untouched.
    pub fn strip_bookkeeping(&mut self) {
        self.extra.retain(|k, _| !k.starts_with(BOOKKEEPING_PREFIX));
    }
}
