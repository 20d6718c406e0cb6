//! Block-level content fingerprints.
//!
//! Each paragraph, table, row, cell and text box is written out in a
//! normalized form and hashed. Nested containers are folded in through their
//! own fingerprint, so the hashes are computed bottom-up and a change anywhere
//! inside a container changes the fingerprint of every container above it.
//! Results live in a side-table keyed by arena node id.

use super::atom_list::is_throwaway;
use super::document::{DocumentTree, NoteKind, ResourceTable};
use super::settings::CompareSettings;
use crate::error::{CompareError, Result};
use crate::hash::{sha1_hash_bytes, sha1_hash_string};
use crate::util::culture::{parse_culture, to_upper_langid};
use crate::xml::arena::XmlDocument;
use crate::xml::namespaces::{O, R, W, W14, WP, XMLNS};
use crate::xml::node::XmlNodeData;
use crate::xml::xname::{XAttribute, XName};
use icu::locid::LanguageIdentifier;
use indextree::NodeId;
use std::collections::HashMap;

/// Character-level text normalization shared by fingerprints and atom hashes.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    upper: Option<LanguageIdentifier>,
    conflate_spaces: bool,
}

impl TextNormalizer {
    pub fn new(settings: &CompareSettings) -> Self {
        let upper = settings.case_insensitive.then(|| {
            settings
                .culture_info
                .as_deref()
                .map(parse_culture)
                .unwrap_or(LanguageIdentifier::UND)
        });
        Self {
            upper,
            conflate_spaces: settings.conflate_breaking_and_nonbreaking_spaces,
        }
    }

    /// Maps one character. Upper-casings that expand to several characters
    /// (`ß` to `SS`) keep the original, so one character stays one atom.
    pub fn normalize_char(&self, c: char) -> char {
        let c = if self.conflate_spaces && c == '\u{00A0}' { ' ' } else { c };
        let Some(lang) = &self.upper else { return c };
        let mut buf = [0u8; 4];
        let upper = to_upper_langid(c.encode_utf8(&mut buf), lang);
        let mut chars = upper.chars();
        match (chars.next(), chars.next()) {
            (Some(u), None) => u,
            _ => c,
        }
    }

    pub fn normalize(&self, s: &str) -> String {
        s.chars().map(|c| self.normalize_char(c)).collect()
    }
}

pub(crate) fn is_container(name: &XName) -> bool {
    name.in_namespace(W::NS)
        && matches!(name.local_name.as_str(), "p" | "tbl" | "tr" | "tc" | "txbxContent")
}

fn is_rsid_attribute(name: &XName) -> bool {
    name.in_namespace(W::NS) && name.local_name.starts_with("rsid")
}

fn is_volatile_attribute(element: &XName, attr: &XName) -> bool {
    if is_rsid_attribute(attr) {
        return true;
    }
    if attr.in_namespace(W14::NS) && (attr.local_name == "paraId" || attr.local_name == "textId") {
        return true;
    }
    if attr.in_namespace(XMLNS::NS) || (attr.namespace.is_none() && attr.local_name == "xmlns") {
        return true;
    }
    element.is(WP::NS, "docPr") && attr.namespace.is_none() && attr.local_name == "id"
}

/// Digest standing in for a relationship id: the bytes of the target part, or
/// the target itself for external links.
pub(crate) fn resource_digest(resources: &ResourceTable, id: &str) -> Option<String> {
    let resource = resources.get(id)?;
    Some(match &resource.data {
        Some(data) if !resource.external => sha1_hash_bytes(data),
        _ => sha1_hash_string(&resource.target),
    })
}

/// Fingerprints of every footnote and endnote, by note id. The id itself is
/// excluded, so renumbered notes with the same content hash equal.
#[derive(Debug, Clone, Default)]
pub struct NoteHashes {
    footnotes: HashMap<String, String>,
    endnotes: HashMap<String, String>,
}

impl NoteHashes {
    pub fn build(tree: &DocumentTree, normalizer: &TextNormalizer, max_depth: usize) -> Result<Self> {
        let mut hashes = Self::default();
        for kind in [NoteKind::Footnote, NoteKind::Endnote] {
            let Some(part) = tree.notes(kind) else { continue };
            let Some(root) = part.doc.root() else { continue };
            let scope = HashScope {
                doc: &part.doc,
                resources: &part.resources,
                notes: None,
                normalizer,
                max_depth,
            };
            let mut table = FingerprintTable::default();
            let note_name = kind.note_name();
            let notes: Vec<NodeId> = part.doc.elements_by_name(root, &note_name).collect();
            for note in notes {
                let Some(id) = part.doc.attribute(note, &W::id()) else { continue };
                let id = id.to_string();
                let canonical = table.write_canonical(&scope, note, true)?;
                let map = match kind {
                    NoteKind::Footnote => &mut hashes.footnotes,
                    NoteKind::Endnote => &mut hashes.endnotes,
                };
                map.insert(id, sha1_hash_string(&canonical));
            }
        }
        Ok(hashes)
    }

    pub fn get(&self, kind: NoteKind, id: &str) -> Option<&str> {
        let map = match kind {
            NoteKind::Footnote => &self.footnotes,
            NoteKind::Endnote => &self.endnotes,
        };
        map.get(id).map(String::as_str)
    }
}

/// What a fingerprint may look at: the part being hashed, its relationships
/// and the note fingerprints of the document.
pub struct HashScope<'a> {
    pub doc: &'a XmlDocument,
    pub resources: &'a ResourceTable,
    pub notes: Option<&'a NoteHashes>,
    pub normalizer: &'a TextNormalizer,
    pub max_depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FingerprintTable {
    map: HashMap<NodeId, String>,
}

impl FingerprintTable {
    /// Fingerprints every container below `root`.
    pub fn build(scope: &HashScope<'_>, root: NodeId) -> Result<Self> {
        let mut table = Self::default();
        let containers: Vec<NodeId> = scope
            .doc
            .descendants(root)
            .filter(|&n| scope.doc.name(n).map(is_container).unwrap_or(false))
            .collect();
        for node in containers {
            table.fingerprint(scope, node)?;
        }
        Ok(table)
    }

    pub fn get(&self, node: NodeId) -> Option<&str> {
        self.map.get(&node).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Fingerprint of one container, computing nested ones on the way.
    pub fn fingerprint(&mut self, scope: &HashScope<'_>, node: NodeId) -> Result<String> {
        if let Some(existing) = self.map.get(&node) {
            return Ok(existing.clone());
        }
        let canonical = self.write_canonical(scope, node, false)?;
        let digest = sha1_hash_string(&canonical);
        self.map.insert(node, digest.clone());
        Ok(digest)
    }

    /// Normalized markup of `node`. Containers below it appear as their
    /// fingerprint only.
    pub fn write_canonical(&mut self, scope: &HashScope<'_>, node: NodeId, omit_root_id: bool) -> Result<String> {
        let mut writer = CanonicalWriter {
            scope,
            top: node,
            omit_root_id,
            output: String::new(),
            text: String::new(),
        };
        writer.write(self, node, 0)?;
        writer.flush_text();
        Ok(writer.output)
    }
}

struct CanonicalWriter<'s, 'a> {
    scope: &'s HashScope<'a>,
    top: NodeId,
    omit_root_id: bool,
    output: String,
    /// Pending paragraph text, merged across runs.
    text: String,
}

impl CanonicalWriter<'_, '_> {
    fn write(&mut self, table: &mut FingerprintTable, node: NodeId, depth: usize) -> Result<()> {
        let doc = self.scope.doc;
        let Some(data) = doc.get(node) else { return Ok(()) };

        let (name, attributes) = match data {
            XmlNodeData::Element { name, attributes } => (name, attributes),
            XmlNodeData::Text(text) | XmlNodeData::CData(text) => {
                if !text.trim().is_empty() {
                    self.flush_text();
                    self.output.push_str(&escape_xml_text(text));
                }
                return Ok(());
            }
            _ => return Ok(()),
        };

        if depth > self.scope.max_depth {
            return Err(CompareError::NestingTooDeep {
                limit: self.scope.max_depth,
                stage: "fingerprinting",
            });
        }

        if is_throwaway(name) || name.is(W::NS, "pPr") || name.is(W::NS, "rPr") {
            return Ok(());
        }

        if node != self.top && is_container(name) {
            let fp = table.fingerprint(self.scope, node)?;
            self.flush_text();
            self.output.push('<');
            self.output.push_str(&qualified(name));
            self.output.push('#');
            self.output.push_str(&fp);
            self.output.push_str("/>");
            return Ok(());
        }

        if name.in_namespace(W::NS) {
            match name.local_name.as_str() {
                "r" => {
                    for child in doc.children(node) {
                        self.write(table, child, depth + 1)?;
                    }
                    return Ok(());
                }
                "t" => {
                    let text = doc.text_content(node);
                    self.text.push_str(&self.scope.normalizer.normalize(&text));
                    return Ok(());
                }
                "tcPr" => {
                    self.flush_text();
                    self.output.push_str("<w:tcPr>");
                    for child in doc.element_children(node) {
                        let Some(child_name) = doc.name(child) else { continue };
                        if child_name.is(W::NS, "gridSpan") || child_name.is(W::NS, "vMerge") {
                            let val = doc.attribute(child, &W::val()).unwrap_or("");
                            self.output.push_str(&format!(
                                "<w:{} val=\"{}\"/>",
                                child_name.local_name,
                                escape_xml_attr(val)
                            ));
                        }
                    }
                    self.output.push_str("</w:tcPr>");
                    return Ok(());
                }
                _ => {}
            }
        }

        self.flush_text();
        let tag = qualified(name);
        self.output.push('<');
        self.output.push_str(&tag);
        for attr in attributes {
            if is_volatile_attribute(name, &attr.name) {
                continue;
            }
            if node == self.top && self.omit_root_id && attr.name == W::id() {
                continue;
            }
            self.output.push(' ');
            self.output.push_str(&qualified(&attr.name));
            self.output.push_str("=\"");
            self.output.push_str(&escape_xml_attr(&self.attribute_value(name, attr)));
            self.output.push('"');
        }

        let children: Vec<NodeId> = doc.children(node).collect();
        if children.is_empty() {
            self.output.push_str("/>");
            return Ok(());
        }
        self.output.push('>');
        for child in children {
            self.write(table, child, depth + 1)?;
        }
        self.flush_text();
        self.output.push_str("</");
        self.output.push_str(&tag);
        self.output.push('>');
        Ok(())
    }

    /// Relationship ids and note ids are replaced by digests of what they
    /// point at.
    fn attribute_value(&self, element: &XName, attr: &XAttribute) -> String {
        if attr.name.in_namespace(R::NS) || attr.name == O::relid() {
            return resource_digest(self.scope.resources, &attr.value).unwrap_or_else(|| attr.value.clone());
        }
        if attr.name == W::id() {
            if let (Some(kind), Some(notes)) = (
                NoteKind::from_reference_local_name(&element.local_name),
                self.scope.notes,
            ) {
                if element.in_namespace(W::NS) {
                    if let Some(fp) = notes.get(kind, &attr.value) {
                        return fp.to_string();
                    }
                }
            }
        }
        attr.value.clone()
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.output.push_str("<w:t>");
            self.output.push_str(&escape_xml_text(&text));
            self.output.push_str("</w:t>");
        }
    }
}

fn qualified(name: &XName) -> String {
    let Some(ns) = name.namespace.as_deref() else {
        return name.local_name.clone();
    };
    match get_prefix_for_namespace(ns) {
        Some(prefix) => format!("{}:{}", prefix, name.local_name),
        None => name.to_string(),
    }
}

fn get_prefix_for_namespace(ns: &str) -> Option<&'static str> {
    match ns {
        W::NS => Some("w"),
        R::NS => Some("r"),
        "urn:schemas-microsoft-com:vml" => Some("v"),
        "urn:schemas-microsoft-com:office:office" => Some("o"),
        "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" => Some("wp"),
        "http://schemas.openxmlformats.org/drawingml/2006/main" => Some("a"),
        _ => None,
    }
}

fn escape_xml_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

fn escape_xml_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}
