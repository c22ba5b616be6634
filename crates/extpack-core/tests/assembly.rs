use extpack_core::{read_package_identity, CoreError, MergeSettings, Packager};
use extpack_schema::{AssetType, CONTENT_TYPES_NAME, PLATFORM_MANIFEST_NAME};
use serde_json::{json, Value};
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn read_entry(archive: &[u8], name: &str) -> Vec<u8> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf).unwrap();
    buf
}

fn entry_names(archive: &[u8]) -> Vec<String> {
    let zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    zip.file_names().map(str::to_owned).collect()
}

fn three_partials(dir: &Path) -> MergeSettings {
    write(dir, "a-identity.json", r#"{"namespace": "my.ext", "version": "1.0", "publisher": "Contoso"}"#);
    write(
        dir,
        "b-contributions.json",
        r#"{"contributions": [
            {"id": "hub", "type": "ms.vss-web.hub"},
            {"id": "menu", "type": "ms.vss-web.action"}
        ]}"#,
    );
    write(dir, "c-assets.json", r#"{"assets": [{"type": "icon", "path": "icon.png"}]}"#);
    fs::write(dir.join("icon.png"), [0x89u8, b'P', b'N', b'G']).unwrap();
    MergeSettings::new(dir, vec!["*.json".to_owned()])
}

#[test]
fn three_partials_build_a_complete_package() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let packager = Packager::new(three_partials(dir.path()));

    let result = packager.build_in("{auto}", out.path()).unwrap();
    assert_eq!(result.path, out.path().join("Contoso.my-ext-1.0.vsix"));

    let archive = fs::read(&result.path).unwrap();
    let platform: Value =
        serde_json::from_slice(&read_entry(&archive, PLATFORM_MANIFEST_NAME)).unwrap();
    assert_eq!(platform["contributions"].as_array().unwrap().len(), 2);
    assert_eq!(platform["version"], json!("1.0"));
    assert!(platform.get("__meta_root").is_none());

    let identity = read_package_identity(&archive).unwrap();
    assert_eq!(identity.id, "my-ext");
    assert_eq!(identity.version, "1.0");

    assert_eq!(read_entry(&archive, "icon.png"), [0x89u8, b'P', b'N', b'G']);
}

#[test]
fn content_types_index_comes_first() {
    let dir = tempfile::tempdir().unwrap();
    let (_, archive, _) = Packager::new(three_partials(dir.path()))
        .build_archive()
        .unwrap();

    let names = entry_names(&archive);
    assert_eq!(names[0], CONTENT_TYPES_NAME);
    assert_eq!(names.len(), 4);
}

#[test]
fn absolute_asset_fails_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(dir.path(), "vss-extension.json", r#"{"namespace": "bad", "version": "1.0"}"#);
    write(
        dir.path(),
        "more.json",
        r#"{"assets": [{"type": "x", "path": "/etc/passwd"}]}"#,
    );
    let settings = MergeSettings::new(
        dir.path(),
        vec!["vss-extension.json".to_owned(), "more.json".to_owned()],
    );

    let err = Packager::new(settings)
        .build_in("{auto}", out.path())
        .unwrap_err();
    assert!(err.to_string().starts_with("manifest error:"));
    assert!(err.to_string().contains("/etc/passwd"));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn exactly_one_manifest_asset_survives_preparation() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "vss-extension.json",
        r#"{"namespace": "a", "assets": [
            {"type": "Microsoft.VisualStudio.Services.Manifest", "path": "old.json"},
            {"type": "Microsoft.VisualStudio.Services.VsoManifest", "path": "older.json"}
        ]}"#,
    );
    let settings = MergeSettings::new(dir.path(), vec!["vss-extension.json".to_owned()]);

    let merged = Packager::new(settings).prepare().unwrap();
    let manifests: Vec<_> = merged
        .package
        .assets
        .iter()
        .filter(|a| a.asset_type.is_manifest())
        .collect();
    assert_eq!(manifests.len(), 1);
    assert_eq!(manifests[0].asset_type, AssetType::manifest());
    assert_eq!(manifests[0].path, PLATFORM_MANIFEST_NAME);
}

#[test]
fn shared_extensions_get_one_content_type_entry() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.json", "{}");
    write(dir.path(), "b.json", "{}");
    write(dir.path(), "LICENSE", "MIT");
    write(
        dir.path(),
        "vss-extension.json",
        r#"{"namespace": "a", "assets": [
            {"type": "x", "path": "a.json"},
            {"type": "y", "path": "b.json"},
            {"type": "z", "path": "LICENSE"}
        ]}"#,
    );
    let settings = MergeSettings::new(dir.path(), vec!["vss-extension.json".to_owned()]);

    let (_, archive, _) = Packager::new(settings).build_archive().unwrap();
    let index = String::from_utf8(read_entry(&archive, CONTENT_TYPES_NAME)).unwrap();
    assert_eq!(index.matches("Extension=\"json\"").count(), 1);
    assert!(index.contains("PartName=\"/LICENSE\""));
}

#[test]
fn overrides_apply_after_every_partial() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "vss-extension.json", r#"{"namespace": "a", "version": "1.0"}"#);
    let overrides = json!({"version": "2.0"});
    let Value::Object(overrides) = overrides else {
        unreachable!()
    };
    let settings = MergeSettings::new(dir.path(), vec!["vss-extension.json".to_owned()])
        .with_overrides(overrides);

    let merged = Packager::new(settings).prepare().unwrap();
    assert_eq!(merged.package.identity.version, "2.0");
    assert_eq!(merged.platform.version.as_deref(), Some("2.0"));
}

#[test]
fn no_matching_manifests_is_a_manifest_error() {
    let dir = tempfile::tempdir().unwrap();
    let settings = MergeSettings::new(dir.path(), vec!["*.json".to_owned()]);
    let err = Packager::new(settings).build_archive().unwrap_err();
    assert!(matches!(err, CoreError::NoManifestsFound { .. }));
}

#[test]
fn icon_outside_root_is_never_packaged() {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("ext");
    let out = tempfile::tempdir().unwrap();
    write(&root, "vss-extension.json", r#"{"namespace": "a", "icons": {"default": "../secret.txt"}}"#);
    write(outer.path(), "secret.txt", "do not ship");
    let settings = MergeSettings::new(&root, vec!["vss-extension.json".to_owned()]);

    let err = Packager::new(settings)
        .build_in("{auto}", out.path())
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Manifest(extpack_schema::ManifestError::AssetOutsideRoot { .. })
    ));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn output_into_existing_hidden_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let hidden = out.path().join(".builds");
    fs::create_dir_all(&hidden).unwrap();
    write(dir.path(), "vss-extension.json", r#"{"namespace": "a", "version": "1.0", "publisher": "P"}"#);
    let settings = MergeSettings::new(dir.path(), vec!["vss-extension.json".to_owned()]);

    let result = Packager::new(settings)
        .build_in(&hidden.to_string_lossy(), out.path())
        .unwrap();
    assert_eq!(result.path, hidden.join("P.a-1.0.vsix"));
    assert!(result.path.is_file());
}
