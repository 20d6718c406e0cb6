//! Decomposition of a document body into comparison atoms.

use super::block_hash::{is_container, FingerprintTable, HashScope, NoteHashes, TextNormalizer};
use super::comparison_unit::{AncestorInfo, ComparisonUnitAtom, ContentElement, GroupKind};
use super::document::{DocumentTree, NoteKind};
use super::settings::CompareSettings;
use crate::error::{CompareError, Result};
use crate::hash::sha1_hash_string;
use crate::xml::arena::XmlDocument;
use crate::xml::namespaces::{M, V, W};
use crate::xml::node::XmlNodeData;
use crate::xml::xname::XName;
use indextree::NodeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const ALLOWABLE_RUN_CHILDREN: &[&str] = &[
    "br", "cr", "tab", "ptab", "sym", "noBreakHyphen", "softHyphen", "pgNum", "dayLong",
    "dayShort", "monthLong", "monthShort", "yearLong", "yearShort", "fldChar", "instrText",
    "drawing", "object",
];

const ALLOWABLE_RUN_CHILDREN_MATH: &[&str] = &["oMathPara", "oMath"];

const ELEMENTS_TO_THROW_AWAY: &[&str] = &[
    "bookmarkStart", "bookmarkEnd", "commentRangeStart", "commentRangeEnd",
    "lastRenderedPageBreak", "proofErr", "sectPr", "permStart", "permEnd", "footnoteRef",
    "endnoteRef", "separator", "continuationSeparator", "commentReference",
];

struct RecursionInfo {
    element_name: &'static str,
    namespace: &'static str,
    child_props_to_skip: &'static [&'static str],
}

const RECURSION_ELEMENTS: &[RecursionInfo] = &[
    RecursionInfo { element_name: "p", namespace: W::NS, child_props_to_skip: &["pPr"] },
    RecursionInfo { element_name: "r", namespace: W::NS, child_props_to_skip: &["rPr"] },
    RecursionInfo { element_name: "tbl", namespace: W::NS, child_props_to_skip: &["tblPr", "tblGrid", "tblPrEx"] },
    RecursionInfo { element_name: "tr", namespace: W::NS, child_props_to_skip: &["trPr", "tblPrEx"] },
    RecursionInfo { element_name: "tc", namespace: W::NS, child_props_to_skip: &["tcPr", "tblPrEx"] },
    RecursionInfo { element_name: "pict", namespace: W::NS, child_props_to_skip: &["shapetype"] },
    RecursionInfo { element_name: "group", namespace: V::NS, child_props_to_skip: &["fill", "stroke", "shadow", "path", "formulas", "handles", "lock", "extrusion"] },
    RecursionInfo { element_name: "shape", namespace: V::NS, child_props_to_skip: &["fill", "stroke", "shadow", "textpath", "path", "formulas", "handles", "imagedata", "lock", "extrusion", "wrap"] },
    RecursionInfo { element_name: "rect", namespace: V::NS, child_props_to_skip: &["fill", "stroke", "shadow", "textpath", "path", "formulas", "handles", "lock", "extrusion"] },
    RecursionInfo { element_name: "textbox", namespace: V::NS, child_props_to_skip: &[] },
    RecursionInfo { element_name: "txbxContent", namespace: W::NS, child_props_to_skip: &[] },
    RecursionInfo { element_name: "sdt", namespace: W::NS, child_props_to_skip: &["sdtPr", "sdtEndPr"] },
    RecursionInfo { element_name: "sdtContent", namespace: W::NS, child_props_to_skip: &[] },
    RecursionInfo { element_name: "hyperlink", namespace: W::NS, child_props_to_skip: &[] },
    RecursionInfo { element_name: "fldSimple", namespace: W::NS, child_props_to_skip: &[] },
    RecursionInfo { element_name: "smartTag", namespace: W::NS, child_props_to_skip: &["smartTagPr"] },
    RecursionInfo { element_name: "ruby", namespace: W::NS, child_props_to_skip: &["rubyPr"] },
];

pub(crate) fn is_throwaway(name: &XName) -> bool {
    name.in_namespace(W::NS) && ELEMENTS_TO_THROW_AWAY.contains(&name.local_name.as_str())
}

fn is_atom_element(name: &XName) -> bool {
    (name.in_namespace(W::NS) && ALLOWABLE_RUN_CHILDREN.contains(&name.local_name.as_str()))
        || (name.in_namespace(M::NS) && ALLOWABLE_RUN_CHILDREN_MATH.contains(&name.local_name.as_str()))
}

/// Property children that travel with their parent element rather than being
/// compared.
pub(crate) fn property_children(name: &XName) -> &'static [&'static str] {
    RECURSION_ELEMENTS
        .iter()
        .find(|re| name.is(re.namespace, re.element_name))
        .map(|re| re.child_props_to_skip)
        .unwrap_or(&[])
}

/// Atom sequence of one document body.
#[derive(Debug, Clone)]
pub struct AtomList {
    pub atoms: Vec<Arc<ComparisonUnitAtom>>,
}

/// Decomposes the body of `tree`. `source` tags every atom with the index of
/// the document it came from.
pub fn create_comparison_unit_atom_list(
    tree: &DocumentTree,
    source: usize,
    settings: &CompareSettings,
) -> Result<AtomList> {
    let body = tree.body().ok_or_else(|| CompareError::InvalidPackage {
        message: "main part has no w:body".to_string(),
    })?;

    let normalizer = TextNormalizer::new(settings);
    let notes = NoteHashes::build(tree, &normalizer, settings.max_nesting_depth)?;
    let scope = HashScope {
        doc: &tree.main,
        resources: &tree.resources,
        notes: Some(&notes),
        normalizer: &normalizer,
        max_depth: settings.max_nesting_depth,
    };
    let table = FingerprintTable::build(&scope, body)?;

    let mut builder = AtomBuilder {
        scope: &scope,
        table,
        source,
        stack: Vec::new(),
        atoms: Vec::new(),
        char_hashes: HashMap::new(),
    };
    let children: Vec<NodeId> = tree.main.children(body).collect();
    for child in children {
        builder.recurse(child, 1)?;
    }

    debug!(
        source,
        atoms = builder.atoms.len(),
        containers = builder.table.len(),
        "decomposed document"
    );
    Ok(AtomList { atoms: builder.atoms })
}

struct AtomBuilder<'s, 'a> {
    scope: &'s HashScope<'a>,
    table: FingerprintTable,
    source: usize,
    /// Elements between the body and the node being visited, outermost first.
    stack: Vec<AncestorInfo>,
    atoms: Vec<Arc<ComparisonUnitAtom>>,
    char_hashes: HashMap<char, String>,
}

impl AtomBuilder<'_, '_> {
    fn doc(&self) -> &XmlDocument {
        self.scope.doc
    }

    fn recurse(&mut self, node: NodeId, depth: usize) -> Result<()> {
        let doc = self.scope.doc;
        let Some(XmlNodeData::Element { name, .. }) = doc.get(node) else {
            return Ok(());
        };

        if depth > self.scope.max_depth {
            return Err(CompareError::NestingTooDeep {
                limit: self.scope.max_depth,
                stage: "decomposition",
            });
        }

        if is_throwaway(name) {
            return Ok(());
        }

        if name.is(W::NS, "t") {
            let ancestors: Arc<[AncestorInfo]> = self.stack.clone().into();
            for ch in doc.text_content(node).chars() {
                let hash = self.char_hash(ch);
                self.push_atom(ContentElement::Text(ch), node, ancestors.clone(), hash);
            }
            return Ok(());
        }

        if let Some(kind) = NoteKind::from_reference_local_name(&name.local_name).filter(|_| name.in_namespace(W::NS)) {
            let id = doc.attribute(node, &W::id()).unwrap_or_default().to_string();
            let fp = self
                .scope
                .notes
                .and_then(|n| n.get(kind, &id))
                .ok_or_else(|| CompareError::resource(id.clone(), format!("referenced {} is not present", kind)))?;
            let hash = sha1_hash_string(&format!("{}{}", name.local_name, fp));
            let ancestors = self.stack.clone().into();
            self.push_atom(ContentElement::NoteReference { kind, id }, node, ancestors, hash);
            return Ok(());
        }

        let is_textbox_pict = name.is(W::NS, "pict")
            && doc.descendants(node).any(|d| doc.has_name(d, W::NS, "txbxContent"));

        if is_atom_element(name) || (name.is(W::NS, "pict") && !is_textbox_pict) {
            let canonical = self.table.write_canonical(self.scope, node, false)?;
            let hash = sha1_hash_string(&format!("{}{}", name.local_name, canonical));
            let ancestors = self.stack.clone().into();
            self.push_atom(
                ContentElement::Element {
                    local_name: name.local_name.clone(),
                },
                node,
                ancestors,
                hash,
            );
            return Ok(());
        }

        // Everything else is a container or a transparent wrapper.
        let skip = property_children(name);
        let is_paragraph = name.is(W::NS, "p");
        let info = self.ancestor_info(node, name);
        self.stack.push(info);
        let children: Vec<NodeId> = doc.children(node).collect();
        for child in children {
            let skipped = self
                .doc()
                .name(child)
                .map(|n| skip.contains(&n.local_name.as_str()))
                .unwrap_or(true);
            if !skipped {
                self.recurse(child, depth + 1)?;
            }
        }
        if is_paragraph {
            let ancestors = self.stack.clone().into();
            let hash = sha1_hash_string("pPr");
            self.push_atom(ContentElement::ParagraphMark, node, ancestors, hash);
        }
        self.stack.pop();
        Ok(())
    }

    fn ancestor_info(&self, node: NodeId, name: &XName) -> AncestorInfo {
        let kind = if is_container(name) {
            GroupKind::from_local_name(&name.local_name)
        } else {
            None
        };
        AncestorInfo {
            node,
            local_name: name.local_name.clone(),
            kind,
            fingerprint: kind.and_then(|_| self.table.get(node).map(str::to_string)),
        }
    }

    fn char_hash(&mut self, ch: char) -> String {
        let normalized = self.scope.normalizer.normalize_char(ch);
        self.char_hashes
            .entry(normalized)
            .or_insert_with(|| {
                let mut s = String::from("t");
                s.push(normalized);
                sha1_hash_string(&s)
            })
            .clone()
    }

    fn push_atom(&mut self, content: ContentElement, node: NodeId, ancestors: Arc<[AncestorInfo]>, hash: String) {
        let position = self.atoms.len();
        self.atoms.push(Arc::new(ComparisonUnitAtom {
            content,
            source: self.source,
            node,
            ancestors,
            hash,
            position,
        }));
    }
}
