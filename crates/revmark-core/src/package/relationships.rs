use crate::error::Result;
use crate::xml::namespaces::PKG;
use crate::xml::node::XmlNodeData;
use crate::xml::xname::{XAttribute, XName};
use crate::xml::{builder, parser, XmlDocument};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TargetMode {
    #[default]
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    #[serde(default)]
    pub target_mode: TargetMode,
}

impl Relationship {
    pub fn new(id: &str, rel_type: &str, target: &str) -> Self {
        Self {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: TargetMode::Internal,
        }
    }

    pub fn external(id: &str, rel_type: &str, target: &str) -> Self {
        Self {
            target_mode: TargetMode::External,
            ..Self::new(id, rel_type, target)
        }
    }

    pub fn is_external(&self) -> bool {
        self.target_mode == TargetMode::External
    }
}

/// Path of the relationships part belonging to `part` (`word/document.xml`
/// gives `word/_rels/document.xml.rels`). The package itself is `""`.
pub fn rels_path_for(part: &str) -> String {
    let part = part.trim_start_matches('/');
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Absolute part name of `target` as seen from `source_part`.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if target.starts_with('/') {
        return normalize(target);
    }
    let source = source_part.trim_start_matches('/');
    let dir = source.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    normalize(&format!("/{}/{}", dir, target))
}

fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

pub fn parse_relationships(bytes: &[u8]) -> Result<Vec<Relationship>> {
    let doc = parser::parse_bytes(bytes)?;
    let Some(root) = doc.root() else {
        return Ok(Vec::new());
    };
    let attr = |node, local: &str| doc.attribute(node, &XName::local(local)).unwrap_or("").to_string();
    Ok(doc
        .elements_by_name(root, &PKG::relationship())
        .map(|node| Relationship {
            id: attr(node, "Id"),
            rel_type: attr(node, "Type"),
            target: attr(node, "Target"),
            target_mode: if attr(node, "TargetMode") == "External" {
                TargetMode::External
            } else {
                TargetMode::Internal
            },
        })
        .collect())
}

pub fn serialize_relationships(rels: &[Relationship]) -> Result<Vec<u8>> {
    let mut doc = XmlDocument::new();
    let root = doc.add_root(XmlNodeData::element_with_attrs(
        PKG::relationships(),
        vec![XAttribute::new(XName::local("xmlns"), PKG::RELATIONSHIPS_NS)],
    ));
    for rel in rels {
        let mut attrs = vec![
            XAttribute::new(XName::local("Id"), &rel.id),
            XAttribute::new(XName::local("Type"), &rel.rel_type),
            XAttribute::new(XName::local("Target"), &rel.target),
        ];
        if rel.is_external() {
            attrs.push(XAttribute::new(XName::local("TargetMode"), "External"));
        }
        doc.add_child(root, XmlNodeData::element_with_attrs(PKG::relationship(), attrs));
    }
    builder::serialize_bytes(&doc)
}

pub mod relationship_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const FOOTNOTES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footnotes";
    pub const ENDNOTES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/endnotes";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
}
