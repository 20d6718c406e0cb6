use crate::error::{CompareError, Result};
use crate::xml::arena::XmlDocument;
use crate::xml::namespaces::W;
use crate::xml::parser;
use crate::xml::xname::XName;
use indextree::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One relationship of a part and, for internal targets, the bytes of the
/// part it points to.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
    /// Absolute part name (`/word/media/image1.png`) for internal targets.
    pub part_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Option<Vec<u8>>,
    /// Relationships of the target part itself.
    pub children: ResourceTable,
}

impl Resource {
    pub fn new(id: impl Into<String>, rel_type: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.into(),
            target: target.into(),
            external: false,
            part_name: None,
            content_type: None,
            data: None,
            children: ResourceTable::new(),
        }
    }

    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    pub fn with_part(
        mut self,
        part_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.part_name = Some(part_name.into());
        self.content_type = Some(content_type.into());
        self.data = Some(data);
        self
    }

    pub fn with_child(mut self, child: Resource) -> Self {
        self.children.insert(child);
        self
    }
}

/// Relationships of one part, keyed by relationship id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceTable {
    entries: BTreeMap<String, Resource>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Inserts or replaces the resource under its own id.
    pub fn insert(&mut self, resource: Resource) {
        self.entries.insert(resource.id.clone(), resource);
    }

    pub fn remove(&mut self, id: &str) -> Option<Resource> {
        self.entries.remove(id)
    }

    /// Moves a resource to a new id. Returns false when `old_id` is unknown or
    /// `new_id` is taken.
    pub fn rename(&mut self, old_id: &str, new_id: &str) -> bool {
        if self.entries.contains_key(new_id) {
            return false;
        }
        match self.entries.remove(old_id) {
            Some(mut resource) => {
                resource.id = new_id.to_string();
                self.entries.insert(new_id.to_string(), resource);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every resource in this table and below it, depth first.
    pub fn walk(&self) -> Vec<&Resource> {
        let mut out = Vec::new();
        for resource in self.entries.values() {
            out.push(resource);
            out.extend(resource.children.walk());
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Footnote,
    Endnote,
}

impl NoteKind {
    pub fn part_path(self) -> &'static str {
        match self {
            Self::Footnote => "word/footnotes.xml",
            Self::Endnote => "word/endnotes.xml",
        }
    }

    pub fn root_name(self) -> XName {
        match self {
            Self::Footnote => W::footnotes(),
            Self::Endnote => W::endnotes(),
        }
    }

    pub fn note_name(self) -> XName {
        match self {
            Self::Footnote => W::footnote(),
            Self::Endnote => W::endnote(),
        }
    }

    pub fn reference_name(self) -> XName {
        match self {
            Self::Footnote => W::footnoteReference(),
            Self::Endnote => W::endnoteReference(),
        }
    }

    pub fn from_reference_local_name(local: &str) -> Option<Self> {
        match local {
            "footnoteReference" => Some(Self::Footnote),
            "endnoteReference" => Some(Self::Endnote),
            _ => None,
        }
    }
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Footnote => write!(f, "footnote"),
            Self::Endnote => write!(f, "endnote"),
        }
    }
}

/// A footnotes or endnotes part with its own relationships.
#[derive(Debug, Clone)]
pub struct NotesPart {
    pub doc: XmlDocument,
    pub resources: ResourceTable,
}

impl NotesPart {
    pub fn from_xml(xml: &str, kind: NoteKind) -> Result<Self> {
        Self::new(parser::parse(xml)?, kind)
    }

    pub fn new(doc: XmlDocument, kind: NoteKind) -> Result<Self> {
        let root_ok = doc
            .root()
            .and_then(|r| doc.name(r))
            .map(|n| *n == kind.root_name())
            .unwrap_or(false);
        if !root_ok {
            return Err(CompareError::InvalidPackage {
                message: format!("{} root element is not w:{}s", kind.part_path(), kind),
            });
        }
        Ok(Self {
            doc,
            resources: ResourceTable::new(),
        })
    }

    /// The note element with the given `w:id`.
    pub fn find(&self, kind: NoteKind, id: &str) -> Option<NodeId> {
        let root = self.doc.root()?;
        let note_name = kind.note_name();
        let found = self
            .doc
            .elements_by_name(root, &note_name)
            .find(|&n| self.doc.attribute(n, &W::id()) == Some(id));
        found
    }

    /// Separator-style notes, recognized by their `w:type` attribute.
    pub fn special_notes(&self, kind: NoteKind) -> Vec<NodeId> {
        let Some(root) = self.doc.root() else {
            return Vec::new();
        };
        let note_name = kind.note_name();
        self.doc
            .elements_by_name(root, &note_name)
            .filter(|&n| self.doc.attribute(n, &W::type_()).is_some())
            .collect()
    }
}

/// Display color of a reviewer, written as `RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color(pub u8, pub u8, pub u8);

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = s.trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("'{}' is not an RRGGBB color", s));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(Color(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub name: String,
    pub color: Color,
}

/// In-memory WordprocessingML document: the main part, its notes parts and
/// every resource they reference.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    pub main: XmlDocument,
    pub resources: ResourceTable,
    pub footnotes: Option<NotesPart>,
    pub endnotes: Option<NotesPart>,
    pub last_modified_by: Option<String>,
    pub reviewers: Vec<Reviewer>,
}

impl DocumentTree {
    pub fn new(main: XmlDocument) -> Result<Self> {
        let is_document = main
            .root()
            .and_then(|r| main.name(r))
            .map(|n| *n == W::document())
            .unwrap_or(false);
        if !is_document {
            return Err(CompareError::InvalidPackage {
                message: "main part root element is not w:document".to_string(),
            });
        }
        Ok(Self {
            main,
            resources: ResourceTable::new(),
            footnotes: None,
            endnotes: None,
            last_modified_by: None,
            reviewers: Vec::new(),
        })
    }

    pub fn from_main_xml(xml: &str) -> Result<Self> {
        Self::new(parser::parse(xml)?)
    }

    pub fn with_footnotes_xml(mut self, xml: &str) -> Result<Self> {
        self.footnotes = Some(NotesPart::from_xml(xml, NoteKind::Footnote)?);
        Ok(self)
    }

    pub fn with_endnotes_xml(mut self, xml: &str) -> Result<Self> {
        self.endnotes = Some(NotesPart::from_xml(xml, NoteKind::Endnote)?);
        Ok(self)
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.insert(resource);
        self
    }

    pub fn with_last_modified_by(mut self, name: impl Into<String>) -> Self {
        self.last_modified_by = Some(name.into());
        self
    }

    pub fn body(&self) -> Option<NodeId> {
        let root = self.main.root()?;
        self.main.first_child_named(root, &W::body())
    }

    pub fn notes(&self, kind: NoteKind) -> Option<&NotesPart> {
        match kind {
            NoteKind::Footnote => self.footnotes.as_ref(),
            NoteKind::Endnote => self.endnotes.as_ref(),
        }
    }

    pub fn notes_mut(&mut self, kind: NoteKind) -> Option<&mut NotesPart> {
        match kind {
            NoteKind::Footnote => self.footnotes.as_mut(),
            NoteKind::Endnote => self.endnotes.as_mut(),
        }
    }

    pub fn reviewer_color(&self, name: &str) -> Option<Color> {
        self.reviewers.iter().find(|r| r.name == name).map(|r| r.color)
    }

    /// Visible body text: one line per paragraph, deleted text excluded.
    pub fn text(&self) -> String {
        let mut out = String::new();
        if let Some(body) = self.body() {
            collect_text(&self.main, body, &mut out);
        }
        out
    }
}

fn collect_text(doc: &XmlDocument, node: NodeId, out: &mut String) {
    let Some(name) = doc.name(node) else { return };
    if name.in_namespace(W::NS) {
        match name.local_name.as_str() {
            "t" => {
                out.push_str(&doc.text_content(node));
                return;
            }
            "tab" => {
                out.push('\t');
                return;
            }
            "br" | "cr" => {
                out.push('\n');
                return;
            }
            "pPr" | "rPr" | "del" => return,
            _ => {}
        }
    }
    for child in doc.element_children(node) {
        collect_text(doc, child, out);
    }
    if name.is(W::NS, "p") {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>One</w:t></w:r><w:del w:id="1" w:author="a" w:date="d"><w:r><w:delText>gone</w:delText></w:r></w:del></w:p><w:p><w:r><w:t>Two</w:t><w:tab/><w:t>x</w:t></w:r></w:p></w:body></w:document>"#;

    #[test]
    fn text_skips_deleted_content() {
        let tree = DocumentTree::from_main_xml(DOC).unwrap();
        assert_eq!(tree.text(), "One\nTwo\tx\n");
    }

    #[test]
    fn non_document_root_is_rejected() {
        let err = DocumentTree::from_main_xml("<a/>").unwrap_err();
        assert!(matches!(err, CompareError::InvalidPackage { .. }));
    }

    #[test]
    fn resource_table_rename() {
        let mut table = ResourceTable::new();
        table.insert(Resource::new("rId1", "image", "media/a.png"));
        table.insert(Resource::new("rId2", "image", "media/b.png"));

        assert!(!table.rename("rId1", "rId2"));
        assert!(table.rename("rId1", "rId7"));
        assert_eq!(table.get("rId7").map(|r| r.id.as_str()), Some("rId7"));
        assert!(!table.contains("rId1"));
        assert_eq!(table.ids().collect::<Vec<_>>(), vec!["rId2", "rId7"]);
    }

    #[test]
    fn walk_visits_nested_resources() {
        let chart = Resource::new("rId1", "chart", "charts/chart1.xml")
            .with_child(Resource::new("rId1", "package", "../embeddings/book.xlsx"));
        let mut table = ResourceTable::new();
        table.insert(chart);
        assert_eq!(table.walk().len(), 2);
    }

    #[test]
    fn color_parses_and_formats() {
        let c: Color = "#ff8000".parse().unwrap();
        assert_eq!(c, Color(255, 128, 0));
        assert_eq!(c.to_string(), "FF8000");
        assert!("12345".parse::<Color>().is_err());
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"FF8000\"");
    }

    #[test]
    fn notes_lookup_by_id_and_type() {
        let part = NotesPart::from_xml(
            r#"<w:footnotes xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:footnote w:type="separator" w:id="-1"/><w:footnote w:id="1"><w:p/></w:footnote></w:footnotes>"#,
            NoteKind::Footnote,
        )
        .unwrap();
        assert!(part.find(NoteKind::Footnote, "1").is_some());
        assert!(part.find(NoteKind::Footnote, "2").is_none());
        assert_eq!(part.special_notes(NoteKind::Footnote).len(), 1);
    }
}
