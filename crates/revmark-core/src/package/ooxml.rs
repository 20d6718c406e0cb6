use crate::error::{CompareError, Result};
use crate::xml::namespaces::PKG;
use crate::xml::XmlDocument;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use zip::read::ZipArchive;
use zip::write::ZipWriter;
use zip::CompressionMethod;

use super::content_types::ContentTypes;
use super::relationships::{
    parse_relationships, rels_path_for, relationship_types, resolve_target, serialize_relationships, Relationship,
};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// An Open Packaging Conventions zip archive held in memory. Part names are
/// stored without the leading `/`.
#[derive(Debug, Clone)]
pub struct OoxmlPackage {
    parts: BTreeMap<String, Vec<u8>>,
    content_types: ContentTypes,
}

impl Default for OoxmlPackage {
    fn default() -> Self {
        Self {
            parts: BTreeMap::new(),
            content_types: ContentTypes::new(),
        }
    }
}

impl OoxmlPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut content = Vec::new();
            file.read_to_end(&mut content)?;
            parts.insert(name, content);
        }

        let content_types = match parts.remove(CONTENT_TYPES_PART) {
            Some(bytes) => ContentTypes::parse(&bytes)?,
            None => {
                return Err(CompareError::InvalidPackage {
                    message: format!("{} is missing", CONTENT_TYPES_PART),
                })
            }
        };

        Ok(Self { parts, content_types })
    }

    pub fn save(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(&mut buffer);
        let options: zip::write::FileOptions<'_, ()> =
            zip::write::FileOptions::default().compression_method(CompressionMethod::Deflated);

        writer.start_file(CONTENT_TYPES_PART, options)?;
        writer.write_all(&self.content_types.to_bytes()?)?;
        for (path, content) in &self.parts {
            writer.start_file(path.as_str(), options)?;
            writer.write_all(content)?;
        }

        writer.finish()?;
        Ok(buffer.into_inner())
    }

    pub fn get_part(&self, path: &str) -> Option<&[u8]> {
        self.parts.get(path.trim_start_matches('/')).map(|v| v.as_slice())
    }

    pub fn get_xml_part(&self, path: &str) -> Result<XmlDocument> {
        let bytes = self.get_part(path).ok_or_else(|| CompareError::MissingPart {
            part_path: path.to_string(),
        })?;
        crate::xml::parser::parse_bytes(bytes)
    }

    pub fn set_part(&mut self, path: &str, content: Vec<u8>) {
        self.parts.insert(path.trim_start_matches('/').to_string(), content);
    }

    pub fn put_xml_part(&mut self, path: &str, doc: &XmlDocument) -> Result<()> {
        let bytes = crate::xml::builder::serialize_bytes(doc)?;
        self.set_part(path, bytes);
        Ok(())
    }

    pub fn delete_part(&mut self, path: &str) {
        self.parts.remove(path.trim_start_matches('/'));
    }

    pub fn has_part(&self, path: &str) -> bool {
        self.parts.contains_key(path.trim_start_matches('/'))
    }

    /// Relationships of `source` (`""` for the package). A part without a
    /// relationships part has none.
    pub fn relationships(&self, source: &str) -> Result<Vec<Relationship>> {
        match self.get_part(&rels_path_for(source)) {
            Some(bytes) => parse_relationships(bytes),
            None => Ok(Vec::new()),
        }
    }

    pub fn set_relationships(&mut self, source: &str, rels: &[Relationship]) -> Result<()> {
        let path = rels_path_for(source);
        if rels.is_empty() {
            self.delete_part(&path);
            return Ok(());
        }
        let bytes = serialize_relationships(rels)?;
        self.set_part(&path, bytes);
        Ok(())
    }

    pub fn get_content_type(&self, path: &str) -> Option<&str> {
        self.content_types.get_content_type(path)
    }

    pub fn set_content_type(&mut self, path: &str, content_type: &str) {
        self.content_types.ensure_content_type(path, content_type);
    }

    pub fn part_names(&self) -> impl Iterator<Item = &String> {
        self.parts.keys()
    }

    /// Part name of the main document, from the package relationships.
    pub fn main_document_part(&self) -> Result<String> {
        self.relationships("")?
            .iter()
            .find(|r| r.rel_type == relationship_types::OFFICE_DOCUMENT)
            .map(|r| resolve_target("", &r.target).trim_start_matches('/').to_string())
            .ok_or_else(|| CompareError::MissingPart {
                part_path: "officeDocument relationship".to_string(),
            })
    }

    /// `cp:lastModifiedBy` of the core properties part, when present.
    pub fn last_modified_by(&self) -> Option<String> {
        let core = self
            .relationships("")
            .ok()?
            .into_iter()
            .find(|r| r.rel_type == relationship_types::CORE_PROPERTIES)
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| "/docProps/core.xml".to_string());
        let doc = self.get_xml_part(&core).ok()?;
        let root = doc.root()?;
        let node = doc.first_descendant_named(root, &PKG::last_modified_by())?;
        let text = doc.text_content(node);
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_roundtrip() {
        let mut pkg = OoxmlPackage::new();
        pkg.set_part("/test.xml", b"<root/>".to_vec());
        pkg.set_relationships("", &[Relationship::new("rId1", relationship_types::OFFICE_DOCUMENT, "test.xml")])
            .unwrap();

        let saved = pkg.save().unwrap();
        let loaded = OoxmlPackage::open(&saved).unwrap();

        assert!(loaded.has_part("test.xml"));
        assert_eq!(loaded.main_document_part().unwrap(), "test.xml");
        assert_eq!(loaded.get_content_type("_rels/.rels"), pkg.get_content_type("_rels/.rels"));
    }

    #[test]
    fn archive_without_content_types_is_invalid() {
        let mut buffer = Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(&mut buffer);
        let options: zip::write::FileOptions<'_, ()> = zip::write::FileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(b"<x/>").unwrap();
        writer.finish().unwrap();

        let err = OoxmlPackage::open(&buffer.into_inner()).unwrap_err();
        assert!(matches!(err, CompareError::InvalidPackage { .. }));
    }

    #[test]
    fn last_modified_by_is_read_from_core_properties() {
        let mut pkg = OoxmlPackage::new();
        pkg.set_part(
            "docProps/core.xml",
            br#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"><cp:lastModifiedBy> Dana </cp:lastModifiedBy></cp:coreProperties>"#.to_vec(),
        );
        assert_eq!(pkg.last_modified_by().as_deref(), Some("Dana"));
    }
}
