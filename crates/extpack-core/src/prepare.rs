use extpack_schema::{AssetType, PackageAsset, PackageManifest, PLATFORM_MANIFEST_NAME};

/// Leave exactly one manifest self-reference in the package assets.
///
/// Every asset typed as the platform manifest (current or legacy token, any
/// case) is dropped and a single canonical entry pointing at
/// `extension.vsomanifest` is appended. Running it twice changes nothing.
pub fn prepare_package(package: &mut PackageManifest) {
    package.assets.retain(|asset| !asset.asset_type.is_manifest());
    package.assets.push(PackageAsset {
        asset_type: AssetType::manifest(),
        path: PLATFORM_MANIFEST_NAME.to_owned(),
    });
}
