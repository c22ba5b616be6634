use crate::CoreError;
use extpack_schema::{ExtensionId, Identity, PACKAGE_MANIFEST_NAME};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;

/// Read `{Id, Version, Publisher}` from the package manifest embedded in a
/// built package. Publishing uses this to decide between create and update.
pub fn read_package_identity(archive: &[u8]) -> Result<Identity, CoreError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))?;
    let mut xml = String::new();
    zip.by_name(PACKAGE_MANIFEST_NAME)?.read_to_string(&mut xml)?;
    parse_identity(&xml)
}

pub fn read_package_identity_file(path: &Path) -> Result<Identity, CoreError> {
    let bytes = std::fs::read(path)?;
    read_package_identity(&bytes)
}

fn parse_identity(xml: &str) -> Result<Identity, CoreError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Identity" => {
                let mut identity = Identity::default();
                for attr in e.attributes() {
                    let attr = attr.map_err(|err| CoreError::InvalidPackage(err.to_string()))?;
                    let value = attr
                        .unescape_value()
                        .map_err(|err| CoreError::InvalidPackage(err.to_string()))?
                        .into_owned();
                    match attr.key.as_ref() {
                        b"Id" => identity.id = ExtensionId::from_namespace(&value),
                        b"Version" => identity.version = value,
                        b"Publisher" => identity.publisher = value,
                        b"Language" => identity.language = value,
                        _ => {}
                    }
                }
                return Ok(identity);
            }
            Event::Eof => {
                return Err(CoreError::InvalidPackage(format!(
                    "{PACKAGE_MANIFEST_NAME} has no Identity element"
                )))
            }
            _ => {}
        }
    }
}
