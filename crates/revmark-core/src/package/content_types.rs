use crate::error::Result;
use crate::xml::namespaces::PKG;
use crate::xml::node::XmlNodeData;
use crate::xml::xname::{XAttribute, XName};
use crate::xml::{builder, parser, XmlDocument};
use std::collections::BTreeMap;

/// `[Content_Types].xml`: defaults by extension, overrides by part name.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    pub fn new() -> Self {
        let mut types = Self::default();
        types.add_default("rels", "application/vnd.openxmlformats-package.relationships+xml");
        types.add_default("xml", "application/xml");
        types
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let doc = parser::parse_bytes(bytes)?;
        let mut types = Self::default();
        let Some(root) = doc.root() else {
            return Ok(types);
        };
        let attr = |node, local: &str| doc.attribute(node, &XName::local(local)).map(str::to_string);
        for node in doc.element_children(root) {
            if doc.name(node) == Some(&PKG::default()) {
                if let (Some(ext), Some(ct)) = (attr(node, "Extension"), attr(node, "ContentType")) {
                    types.add_default(&ext, &ct);
                }
            } else if doc.name(node) == Some(&PKG::override_()) {
                if let (Some(part), Some(ct)) = (attr(node, "PartName"), attr(node, "ContentType")) {
                    types.set_content_type(&part, &ct);
                }
            }
        }
        Ok(types)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element_with_attrs(
            PKG::types(),
            vec![XAttribute::new(XName::local("xmlns"), PKG::CONTENT_TYPES_NS)],
        ));
        for (ext, ct) in &self.defaults {
            doc.add_child(
                root,
                XmlNodeData::element_with_attrs(
                    PKG::default(),
                    vec![
                        XAttribute::new(XName::local("Extension"), ext),
                        XAttribute::new(XName::local("ContentType"), ct),
                    ],
                ),
            );
        }
        for (part, ct) in &self.overrides {
            doc.add_child(
                root,
                XmlNodeData::element_with_attrs(
                    PKG::override_(),
                    vec![
                        XAttribute::new(XName::local("PartName"), part),
                        XAttribute::new(XName::local("ContentType"), ct),
                    ],
                ),
            );
        }
        builder::serialize_bytes(&doc)
    }

    pub fn get_content_type(&self, path: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(&part_key(path)) {
            return Some(ct);
        }
        let ext = path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase())?;
        self.defaults.get(&ext).map(String::as_str)
    }

    pub fn set_content_type(&mut self, path: &str, content_type: &str) {
        self.overrides.insert(part_key(path), content_type.to_string());
    }

    /// Records `content_type` for `path` unless the extension default
    /// already says the same.
    pub fn ensure_content_type(&mut self, path: &str, content_type: &str) {
        if self.get_content_type(path) != Some(content_type) {
            self.set_content_type(path, content_type);
        }
    }

    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .insert(extension.to_ascii_lowercase(), content_type.to_string());
    }
}

fn part_key(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

pub mod content_type_values {
    pub const WORD_DOCUMENT: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const WORD_FOOTNOTES: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.footnotes+xml";
    pub const WORD_ENDNOTES: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.endnotes+xml";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_defaults() {
        let mut types = ContentTypes::new();
        types.set_content_type("word/document.xml", content_type_values::WORD_DOCUMENT);
        assert_eq!(
            types.get_content_type("/word/document.xml"),
            Some(content_type_values::WORD_DOCUMENT)
        );
        assert_eq!(types.get_content_type("word/other.XML"), Some("application/xml"));
        assert_eq!(types.get_content_type("media/a.png"), None);
    }

    #[test]
    fn parse_reads_what_to_bytes_writes() {
        let mut types = ContentTypes::new();
        types.add_default("png", "image/png");
        types.ensure_content_type("/word/media/a.png", "image/png");
        types.ensure_content_type("/word/footnotes.xml", content_type_values::WORD_FOOTNOTES);

        let parsed = ContentTypes::parse(&types.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.get_content_type("/word/media/a.png"), Some("image/png"));
        assert_eq!(
            parsed.get_content_type("/word/footnotes.xml"),
            Some(content_type_values::WORD_FOOTNOTES)
        );
        assert!(parsed.overrides.len() == 1);
    }
}
