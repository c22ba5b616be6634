use crate::writer::xml_document;
use crate::CoreError;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use std::path::Path;

const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// MIME type for extensions missing from the table and for extensionless parts.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const CONTENT_TYPE_TABLE: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("pkgdef", "text/plain"),
    ("md", "text/markdown"),
    ("xml", "text/xml"),
    ("xaml", "application/xaml+xml"),
    ("xsd", "text/xml"),
    ("vsixmanifest", "text/xml"),
    ("vsomanifest", "application/json"),
    ("json", "application/json"),
    ("js", "application/javascript"),
    ("css", "text/css"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("rtf", "application/rtf"),
    ("pdf", "application/pdf"),
    ("gif", "image/gif"),
    ("jpg", "image/jpg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("tiff", "image/tiff"),
    ("ico", "image/x-icon"),
    ("vsix", "application/zip"),
    ("zip", "application/zip"),
    ("dll", "application/octet-stream"),
    ("exe", "application/octet-stream"),
];

/// Look up the MIME type of an extension (without the dot), ignoring case.
pub fn content_type_for(extension: &str) -> &'static str {
    CONTENT_TYPE_TABLE
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map_or(DEFAULT_CONTENT_TYPE, |(_, mime)| mime)
}

/// The `[Content_Types].xml` part of an OPC package.
///
/// Keyed by extension: one `Default` entry per distinct extension, however
/// many files share it. Extensions compare case-insensitively and keep the
/// case they were first seen with. Parts without an extension cannot be
/// matched by a `Default` and get an `Override` each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypeIndex {
    defaults: Vec<(String, &'static str)>,
    overrides: Vec<(String, &'static str)>,
}

impl ContentTypeIndex {
    /// Build the index from archive part names (`/`-separated, no leading `/`).
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for name in names {
            match Path::new(name).extension().and_then(|e| e.to_str()) {
                Some(ext) => {
                    if !index
                        .defaults
                        .iter()
                        .any(|(seen, _)| seen.eq_ignore_ascii_case(ext))
                    {
                        index.defaults.push((ext.to_owned(), content_type_for(ext)));
                    }
                }
                None => index
                    .overrides
                    .push((format!("/{name}"), DEFAULT_CONTENT_TYPE)),
            }
        }
        index
    }

    pub fn defaults(&self) -> &[(String, &'static str)] {
        &self.defaults
    }

    pub fn overrides(&self) -> &[(String, &'static str)] {
        &self.overrides
    }

    pub fn to_xml(&self) -> Result<String, CoreError> {
        xml_document(|w| {
            w.write_event(Event::Start(
                BytesStart::new("Types").with_attributes([("xmlns", CONTENT_TYPES_NS)]),
            ))?;
            for (ext, mime) in &self.defaults {
                w.write_event(Event::Empty(BytesStart::new("Default").with_attributes([
                    ("Extension", ext.as_str()),
                    ("ContentType", *mime),
                ])))?;
            }
            for (part, mime) in &self.overrides {
                w.write_event(Event::Empty(BytesStart::new("Override").with_attributes([
                    ("PartName", part.as_str()),
                    ("ContentType", *mime),
                ])))?;
            }
            w.write_event(Event::End(BytesEnd::new("Types")))?;
            Ok(())
        })
    }
}
