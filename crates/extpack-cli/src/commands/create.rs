use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use extpack_core::{MergeSettings, PackageConfig, Packager, DEFAULT_MANIFEST_GLOB};
use extpack_schema::parse_partial_str;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// `create` flags as parsed. Anything left unset falls back to the config
/// file, then to built-in defaults.
#[derive(Debug, Default)]
pub struct CreateOptions {
    pub root: Option<PathBuf>,
    pub manifest_globs: Vec<String>,
    pub override_json: Option<String>,
    pub overrides_file: Option<PathBuf>,
    pub output_path: Option<String>,
    pub config: Option<PathBuf>,
}

pub fn run(options: &CreateOptions, json: bool) -> Result<u8, String> {
    let (settings, output) = resolve(options)?;
    debug!("output spec '{output}'");

    let pb = if json {
        None
    } else {
        Some(spinner("packaging extension..."))
    };
    let result = match Packager::new(settings).build(&output) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "package created");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "packaging failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({
            "path": result.path,
            "id": result.identity.id,
            "version": result.identity.version,
            "publisher": result.identity.publisher,
            "files": result.files,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("wrote {}", result.path.display());
        println!(
            "{}.{} {} ({} files)",
            result.identity.publisher,
            result.identity.id,
            result.identity.version,
            result.files.len()
        );
    }
    Ok(EXIT_SUCCESS)
}

/// Combine command-line flags with the optional config file. Flags win;
/// override documents are layered config, then file, then inline.
fn resolve(options: &CreateOptions) -> Result<(MergeSettings, String), String> {
    let config_path = options.config.as_deref();
    let config = match config_path {
        Some(path) => PackageConfig::load(path).map_err(|e| e.to_string())?,
        None => PackageConfig::default(),
    };

    let root = options
        .root
        .clone()
        .unwrap_or_else(|| config.resolved_root(config_path));
    let globs = [&options.manifest_globs, &config.manifest_globs]
        .into_iter()
        .find(|globs| !globs.is_empty())
        .cloned()
        .unwrap_or_else(|| vec![DEFAULT_MANIFEST_GLOB.to_owned()]);
    let output = options
        .output_path
        .clone()
        .unwrap_or_else(|| config.output_path().to_owned());

    let mut overrides = config.overrides.clone();
    if let Some(path) = &options.overrides_file {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read manifest '{}': {e}", path.display()))?;
        layer(&mut overrides, parse_partial_str(&content, path).map_err(|e| e.to_string())?);
    }
    if let Some(inline) = &options.override_json {
        let parsed =
            parse_partial_str(inline, Path::new("<override>")).map_err(|e| e.to_string())?;
        layer(&mut overrides, parsed);
    }

    let settings = MergeSettings::new(root, globs);
    let settings = match overrides {
        Some(overrides) => settings.with_overrides(overrides),
        None => settings,
    };
    Ok((settings, output))
}

fn layer(target: &mut Option<Map<String, Value>>, fields: Map<String, Value>) {
    target.get_or_insert_with(Map::new).extend(fields);
}
