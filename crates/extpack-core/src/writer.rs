use crate::CoreError;
use extpack_schema::{
    PackageManifest, PlatformManifest, PACKAGE_MANIFEST_NAME, PLATFORM_MANIFEST_NAME,
};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const VSX_NS: &str = "http://schemas.microsoft.com/developer/vsx-schema/2011";
const VSX_DESIGN_NS: &str = "http://schemas.microsoft.com/developer/vsx-schema-design/2011";
const INSTALLATION_TARGET: &str = "Microsoft.VisualStudio.Services";

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

fn native_line_endings(text: String) -> String {
    if LINE_ENDING == "\n" {
        text
    } else {
        text.replace('\n', LINE_ENDING)
    }
}

/// Serialize the platform manifest as indented JSON with bookkeeping removed.
pub fn platform_manifest_text(platform: &PlatformManifest) -> Result<String, CoreError> {
    let mut frozen = platform.clone();
    frozen.strip_bookkeeping();
    Ok(native_line_endings(serde_json::to_string_pretty(&frozen)?))
}

/// Serialize the package manifest as an indented VSIX 2.0 document.
pub fn package_manifest_text(package: &PackageManifest) -> Result<String, CoreError> {
    xml_document(|w| {
        w.write_event(Event::Start(
            BytesStart::new("PackageManifest").with_attributes([
                ("Version", "2.0.0"),
                ("xmlns", VSX_NS),
                ("xmlns:d", VSX_DESIGN_NS),
            ]),
        ))?;

        w.write_event(Event::Start(BytesStart::new("Metadata")))?;
        let identity = &package.identity;
        w.write_event(Event::Empty(BytesStart::new("Identity").with_attributes([
            ("Language", identity.language.as_str()),
            ("Id", identity.id.as_str()),
            ("Version", identity.version.as_str()),
            ("Publisher", identity.publisher.as_str()),
        ])))?;
        text_element(w, "DisplayName", package.display_name.as_deref(), &[])?;
        text_element(
            w,
            "Description",
            package.description.as_deref(),
            &[("xml:space", "preserve")],
        )?;
        text_element(w, "ReleaseNotes", package.release_notes.as_deref(), &[])?;
        for (name, list) in [
            ("Tags", &package.tags),
            ("Categories", &package.categories),
            ("GalleryFlags", &package.gallery_flags),
        ] {
            if !list.is_empty() {
                text_element(w, name, Some(list.to_string().as_str()), &[])?;
            }
        }
        text_element(w, "Icon", package.icon.as_deref(), &[])?;
        w.write_event(Event::End(BytesEnd::new("Metadata")))?;

        w.write_event(Event::Start(BytesStart::new("Installation")))?;
        w.write_event(Event::Empty(
            BytesStart::new("InstallationTarget").with_attributes([("Id", INSTALLATION_TARGET)]),
        ))?;
        w.write_event(Event::End(BytesEnd::new("Installation")))?;

        w.write_event(Event::Empty(BytesStart::new("Dependencies")))?;

        w.write_event(Event::Start(BytesStart::new("Assets")))?;
        for asset in &package.assets {
            w.write_event(Event::Empty(BytesStart::new("Asset").with_attributes([
                ("Type", asset.asset_type.as_str()),
                ("d:Source", "File"),
                ("Path", asset.path.as_str()),
            ])))?;
        }
        w.write_event(Event::End(BytesEnd::new("Assets")))?;

        w.write_event(Event::End(BytesEnd::new("PackageManifest")))?;
        Ok(())
    })
}

/// Write both manifests into `dir` under their canonical names.
///
/// The two serializations run on separate threads; the call returns once
/// both files are written, or with the first error.
pub fn write_manifests(
    dir: &Path,
    platform: &PlatformManifest,
    package: &PackageManifest,
) -> Result<(PathBuf, PathBuf), CoreError> {
    let platform_path = dir.join(PLATFORM_MANIFEST_NAME);
    let package_path = dir.join(PACKAGE_MANIFEST_NAME);

    std::thread::scope(|s| {
        let platform_job = s.spawn(|| -> Result<(), CoreError> {
            fs::write(&platform_path, platform_manifest_text(platform)?)?;
            Ok(())
        });
        let package_job = s.spawn(|| -> Result<(), CoreError> {
            fs::write(&package_path, package_manifest_text(package)?)?;
            Ok(())
        });
        let platform_result = join(platform_job);
        let package_result = join(package_job);
        platform_result.and(package_result)
    })?;

    debug!("wrote manifests to {}", dir.display());
    Ok((platform_path, package_path))
}

fn join(handle: std::thread::ScopedJoinHandle<'_, Result<(), CoreError>>) -> Result<(), CoreError> {
    handle
        .join()
        .unwrap_or_else(|_| Err(CoreError::Io(std::io::Error::other("manifest writer panicked"))))
}

/// Build an indented XML document with a declaration, in native line endings.
pub(crate) fn xml_document(
    body: impl FnOnce(&mut Writer<Vec<u8>>) -> Result<(), CoreError>,
) -> Result<String, CoreError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    body(&mut writer)?;
    let text = String::from_utf8(writer.into_inner())
        .map_err(|e| CoreError::InvalidPackage(format!("XML output is not UTF-8: {e}")))?;
    Ok(native_line_endings(text))
}

fn text_element(
    w: &mut Writer<Vec<u8>>,
    name: &str,
    text: Option<&str>,
    attributes: &[(&str, &str)],
) -> Result<(), CoreError> {
    let Some(text) = text else {
        return Ok(());
    };
    w.write_event(Event::Start(
        BytesStart::new(name).with_attributes(attributes.iter().copied()),
    ))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
