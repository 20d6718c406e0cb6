//! Reconstruction of a marked-up document from an aligned atom stream.
//!
//! Every atom carries the chain of elements it was found under. The output
//! tree is rebuilt level by level: adjacent atoms that share the element at
//! a level are emitted under one copy of that element, then the next level
//! is grouped the same way. Along the way
//!
//! - runs whose atoms are inserted or deleted are wrapped in `w:ins` or
//!   `w:del` (deleted text becomes `w:delText`),
//! - paragraph marks and whole rows carry their own revision markers,
//! - note references get fresh ids and their notes are copied,
//! - anything copied from a revised document has its relationship ids
//!   relocated into the output.
//!
//! Paragraph boundaries follow the paragraph marks in the stream: content is
//! placed in the paragraph of the next mark at the same nesting, so splits
//! and joins come out as separate paragraphs with a marked paragraph mark.

use super::comparison_unit::{AncestorInfo, ContentElement, GroupKind};
use super::context::{CompareContext, PartScope};
use super::document::{DocumentTree, ResourceTable};
use super::lcs_algorithm::{AlignedAtom, CorrelationStatus};
use super::notes::NoteParts;
use super::resources::{relocate_attributes, RelocationSource};
use super::revision::{convert_to_deleted_text, create_revision, mark_paragraph, mark_row, RevisionKind, RevisionStamp};
use crate::error::{CompareError, Result};
use crate::util::group::group_adjacent;
use crate::xml::arena::XmlDocument;
use crate::xml::namespaces::{W, W14, XML};
use crate::xml::node::XmlNodeData;
use crate::xml::xname::{XAttribute, XName};
use indextree::NodeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// An element of one of the input documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub source: usize,
    pub node: NodeId,
}

/// Maps elements of revised documents to the original elements they were
/// aligned with, learned from the ancestor chains of equal atoms.
#[derive(Debug, Clone, Default)]
pub struct AncestorMap {
    links: HashMap<(usize, NodeId), NodeId>,
}

impl AncestorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the ancestor pairs of every equal atom in `stream`. Chains are
    /// paired from the outside in and stop at the first differing element
    /// name. The first pairing seen for an element wins.
    pub fn learn(&mut self, stream: &[AlignedAtom]) {
        for aligned in stream {
            if aligned.status != CorrelationStatus::Equal {
                continue;
            }
            let Some(counterpart) = &aligned.counterpart else {
                continue;
            };
            for (original, revised) in aligned.atom.ancestors.iter().zip(counterpart.ancestors.iter()) {
                if original.local_name != revised.local_name {
                    break;
                }
                self.links
                    .entry((counterpart.source, revised.node))
                    .or_insert(original.node);
            }
        }
    }

    pub fn merge(&mut self, other: AncestorMap) {
        for (key, node) in other.links {
            self.links.entry(key).or_insert(node);
        }
    }

    /// The original element standing in for `link`, or `link` itself when it
    /// has no counterpart.
    pub fn translate(&self, link: Link) -> Link {
        if link.source == 0 {
            return link;
        }
        match self.links.get(&(link.source, link.node)) {
            Some(&node) => Link { source: 0, node },
            None => link,
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Identity of the output element an atom goes under at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LevelKey {
    Node(Link),
    /// The paragraph closed by the mark at this stream index.
    Paragraph(usize),
}

/// An atom with its output position worked out.
struct Placed<'s> {
    index: usize,
    aligned: &'s AlignedAtom,
    keys: Vec<LevelKey>,
    /// Element copied for each level.
    links: Vec<Link>,
}

impl Placed<'_> {
    fn local_name(&self, level: usize) -> &str {
        self.aligned.atom.ancestors[level].local_name.as_str()
    }

    fn holds_textbox(&self, level: usize) -> bool {
        holds_textbox(&self.aligned.atom.ancestors, level)
    }
}

/// Whether the element at `level` of a chain encloses a text box. Such a run
/// stays one element and its revisions are marked inside the box.
fn holds_textbox(ancestors: &[AncestorInfo], level: usize) -> bool {
    ancestors
        .get(level + 1..)
        .map(|deeper| deeper.iter().any(|a| a.kind == Some(GroupKind::Textbox)))
        .unwrap_or(false)
}

/// Works out keys from the end of the stream so that paragraph content can
/// be assigned to the mark that follows it.
fn place<'s>(stream: &'s [AlignedAtom], map: &AncestorMap) -> Vec<Placed<'s>> {
    let mut next_mark: HashMap<Vec<LevelKey>, (usize, Link)> = HashMap::new();
    let mut placed = Vec::with_capacity(stream.len());

    for (index, aligned) in stream.iter().enumerate().rev() {
        let atom = &aligned.atom;
        let depth = atom.ancestors.len();
        let inserted = aligned.status == CorrelationStatus::Inserted;
        let mut keys: Vec<LevelKey> = Vec::with_capacity(depth);
        let mut links = Vec::with_capacity(depth);

        for (level, info) in atom.ancestors.iter().enumerate() {
            let own = Link {
                source: atom.source,
                node: info.node,
            };
            let (key, link) = match info.local_name.as_str() {
                "p" if atom.is_paragraph_mark() && level + 1 == depth => {
                    next_mark.insert(keys.clone(), (index, own));
                    (LevelKey::Paragraph(index), own)
                }
                "p" => match next_mark.get(&keys) {
                    Some(&(mark, link)) => (LevelKey::Paragraph(mark), link),
                    None => {
                        let translated = map.translate(own);
                        (LevelKey::Node(translated), translated)
                    }
                },
                // inserted runs keep their own formatting
                "r" if inserted && !holds_textbox(&atom.ancestors, level) => (LevelKey::Node(own), own),
                _ => {
                    let translated = map.translate(own);
                    (LevelKey::Node(translated), translated)
                }
            };
            keys.push(key);
            links.push(link);
        }

        placed.push(Placed {
            index,
            aligned,
            keys,
            links,
        });
    }

    placed.reverse();
    placed
}

#[derive(Debug, Clone, PartialEq)]
enum GroupKey {
    /// Runs additionally split on status and author.
    Element(LevelKey, Option<(CorrelationStatus, Option<Arc<str>>)>),
    Text(CorrelationStatus, Option<Arc<str>>),
    Mark(usize),
    Single(usize),
}

fn group_key(placed: &Placed<'_>, level: usize) -> GroupKey {
    let aligned = placed.aligned;
    match placed.keys.get(level) {
        Some(&key) => {
            let split = (placed.local_name(level) == "r" && !placed.holds_textbox(level))
                .then(|| (aligned.status, aligned.author.clone()));
            GroupKey::Element(key, split)
        }
        None => match aligned.atom.content {
            ContentElement::Text(_) => GroupKey::Text(aligned.status, aligned.author.clone()),
            ContentElement::ParagraphMark => GroupKey::Mark(placed.index),
            _ => GroupKey::Single(placed.index),
        },
    }
}

fn revision_kind(status: CorrelationStatus) -> Option<RevisionKind> {
    match status {
        CorrelationStatus::Inserted => Some(RevisionKind::Inserted),
        CorrelationStatus::Deleted => Some(RevisionKind::Deleted),
        _ => None,
    }
}

/// The last `ins`/`del` emitted at the current level, reused by adjacent
/// content of the same kind and author.
struct OpenWrapper {
    kind: RevisionKind,
    author: Option<Arc<str>>,
    node: NodeId,
}

struct Builder<'s, 'c, 'a> {
    sources: &'s [&'s DocumentTree],
    out: XmlDocument,
    resources: ResourceTable,
    notes: NoteParts,
    ctx: &'c mut CompareContext<'a>,
    stamp: &'s RevisionStamp,
    emitted: HashSet<Link>,
}

impl Builder<'_, '_, '_> {
    fn stamp_for(&self, aligned: &AlignedAtom) -> RevisionStamp {
        match &aligned.author {
            Some(author) => self.stamp.with_author(author),
            None => self.stamp.clone(),
        }
    }

    fn build(&mut self, placed: &[Placed<'_>], level: usize, parent: NodeId, wrapped: bool) -> Result<()> {
        let mut open: Option<OpenWrapper> = None;
        for (key, group) in group_adjacent(placed, |p| group_key(p, level)) {
            match key {
                GroupKey::Element(..) => self.build_element(group, level, parent, wrapped, &mut open)?,
                GroupKey::Text(..) => self.build_text(group, parent, wrapped, &mut open)?,
                GroupKey::Single(_) => self.build_leaf(&group[0], parent, wrapped, &mut open)?,
                GroupKey::Mark(_) => {}
            }
        }
        Ok(())
    }

    /// Parent for content of `status`: a new or reused revision wrapper
    /// under `parent`, or `parent` itself.
    fn target(
        &mut self,
        parent: NodeId,
        aligned: &AlignedAtom,
        wrapped: bool,
        open: &mut Option<OpenWrapper>,
    ) -> (NodeId, bool) {
        let Some(kind) = revision_kind(aligned.status).filter(|_| !wrapped) else {
            *open = None;
            return (parent, wrapped);
        };
        if let Some(current) = open.as_ref() {
            if current.kind == kind && current.author == aligned.author {
                return (current.node, true);
            }
        }
        let stamp = self.stamp_for(aligned);
        let node = create_revision(&mut self.out, parent, kind, &stamp, self.ctx);
        *open = Some(OpenWrapper {
            kind,
            author: aligned.author.clone(),
            node,
        });
        (node, true)
    }

    fn build_element(
        &mut self,
        group: &[Placed<'_>],
        level: usize,
        parent: NodeId,
        wrapped: bool,
        open: &mut Option<OpenWrapper>,
    ) -> Result<()> {
        let first = &group[0];
        let local = first.local_name(level).to_string();
        let uniform = group
            .iter()
            .all(|p| p.aligned.status == first.aligned.status && p.aligned.author == first.aligned.author);
        let (target, child_wrapped) = if local == "r" && uniform {
            self.target(parent, first.aligned, wrapped, open)
        } else {
            *open = None;
            (parent, wrapped)
        };

        let link = first.links[level];
        let element = self.copy_element(link, target)?;

        self.build(group, level + 1, element, child_wrapped)?;

        match local.as_str() {
            "p" => {
                let mark = group
                    .iter()
                    .find(|p| p.aligned.atom.is_paragraph_mark() && p.keys.len() == level + 1);
                if let Some(mark) = mark {
                    if let Some(kind) = revision_kind(mark.aligned.status) {
                        let stamp = self.stamp_for(mark.aligned);
                        mark_paragraph(&mut self.out, element, kind, &stamp, self.ctx);
                    }
                }
            }
            "tr" => {
                let status = first.aligned.status;
                if let Some(kind) = revision_kind(status) {
                    if group.iter().all(|p| p.aligned.status == status) {
                        let stamp = self.stamp_for(first.aligned);
                        mark_row(&mut self.out, element, kind, &stamp, self.ctx);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Shallow copy of `link` plus its property children.
    fn copy_element(&mut self, link: Link, parent: NodeId) -> Result<NodeId> {
        let sources = self.sources;
        let tree = source_tree(sources, link.source)?;
        let element = self.import(link.source, link.node, parent, false)?;

        if !self.emitted.insert(link) {
            // a second copy of one element must not repeat its identifiers
            for local in ["paraId", "textId"] {
                self.out.remove_attribute(element, &XName::new(W14::NS, local));
            }
        }

        let keep = tree
            .main
            .name(link.node)
            .map(super::atom_list::property_children)
            .unwrap_or(&[]);
        if !keep.is_empty() {
            let props: Vec<NodeId> = tree
                .main
                .element_children(link.node)
                .filter(|&c| {
                    tree.main
                        .name(c)
                        .map(|n| keep.contains(&n.local_name.as_str()))
                        .unwrap_or(false)
                })
                .collect();
            for prop in props {
                self.import(link.source, prop, element, true)?;
            }
        }
        Ok(element)
    }

    fn build_text(
        &mut self,
        group: &[Placed<'_>],
        parent: NodeId,
        wrapped: bool,
        open: &mut Option<OpenWrapper>,
    ) -> Result<()> {
        let first = group[0].aligned;
        let (target, _) = self.target(parent, first, wrapped, open);
        let text: String = group
            .iter()
            .filter_map(|p| match p.aligned.atom.content {
                ContentElement::Text(c) => Some(c),
                _ => None,
            })
            .collect();

        let t = self.import(first.atom.source, first.atom.node, target, false)?;
        if first.status == CorrelationStatus::Deleted {
            self.out.rename(t, W::delText());
        }
        let edge_space = text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace);
        if edge_space {
            self.out.set_attribute(t, &XML::space(), "preserve");
        } else {
            self.out.remove_attribute(t, &XML::space());
        }
        self.out.add_child(t, XmlNodeData::text(&text));
        Ok(())
    }

    fn build_leaf(
        &mut self,
        placed: &Placed<'_>,
        parent: NodeId,
        wrapped: bool,
        open: &mut Option<OpenWrapper>,
    ) -> Result<()> {
        let aligned = placed.aligned;
        let atom = &aligned.atom;
        let (target, _) = self.target(parent, aligned, wrapped, open);
        let node = self.import(atom.source, atom.node, target, true)?;

        if let ContentElement::NoteReference { kind, id } = &atom.content {
            let stamp = self.stamp_for(aligned);
            let new_id = self.notes.emit(
                *kind,
                revision_kind(aligned.status),
                self.sources,
                atom.source,
                id,
                &stamp,
                self.ctx,
            )?;
            self.out.set_attribute(node, &W::id(), &new_id);
        }

        if aligned.status == CorrelationStatus::Deleted {
            convert_to_deleted_text(&mut self.out, node);
        }
        Ok(())
    }

    /// Copies `node` of `sources[source]` under `parent`. Content of revised
    /// documents has its relationship ids relocated.
    fn import(&mut self, source: usize, node: NodeId, parent: NodeId, deep: bool) -> Result<NodeId> {
        let tree = source_tree(self.sources, source)?;
        let Builder {
            out, resources, ctx, ..
        } = self;

        let copied = if source == 0 {
            let mut keep = |_: &mut Vec<XAttribute>| -> Result<()> { Ok(()) };
            if deep {
                out.import_subtree_with(&tree.main, node, Some(parent), &mut keep)?
            } else {
                out.import_shallow_with(&tree.main, node, Some(parent), &mut keep)?
            }
        } else {
            let from = RelocationSource {
                source,
                scope: PartScope::Main,
                resources: &tree.resources,
            };
            let mut relocate =
                |attrs: &mut Vec<XAttribute>| relocate_attributes(attrs, &from, resources, &mut **ctx);
            if deep {
                out.import_subtree_with(&tree.main, node, Some(parent), &mut relocate)?
            } else {
                out.import_shallow_with(&tree.main, node, Some(parent), &mut relocate)?
            }
        };

        copied.ok_or_else(|| CompareError::invariant("Atom", 0, format!("node of source {} is gone", source)))
    }
}

fn source_tree<'s>(sources: &'s [&'s DocumentTree], source: usize) -> Result<&'s DocumentTree> {
    sources
        .get(source)
        .copied()
        .ok_or_else(|| CompareError::invariant("Atom", 0, format!("no document with index {}", source)))
}

/// Builds the output document for an aligned stream.
///
/// `sources[0]` is the original; atoms of any other index come from revised
/// documents. Everything outside the body, and the body's final section
/// properties, are taken from the original.
pub fn reconstruct(
    sources: &[&DocumentTree],
    stream: &[AlignedAtom],
    map: &AncestorMap,
    ctx: &mut CompareContext<'_>,
    stamp: &RevisionStamp,
) -> Result<DocumentTree> {
    let no_body = || CompareError::InvalidPackage {
        message: "main part has no w:body".to_string(),
    };
    let original = source_tree(sources, 0)?;
    let root = original.main.root().ok_or_else(no_body)?;
    let body = original.body().ok_or_else(no_body)?;

    ctx.register_parts(original);
    let notes = NoteParts::new(sources, ctx);

    let mut out = XmlDocument::new();
    let root_data = original.main.get(root).cloned().ok_or_else(no_body)?;
    let out_root = out.add_root(root_data);
    let mut out_body = None;
    for child in original.main.children(root) {
        if child == body {
            out_body = out.import_shallow_with(&original.main, body, Some(out_root), &mut |_| Ok(()))?;
        } else {
            out.import_subtree(&original.main, child, Some(out_root));
        }
    }
    let out_body = out_body.ok_or_else(no_body)?;

    let placed = place(stream, map);
    let mut builder = Builder {
        sources,
        out,
        resources: original.resources.clone(),
        notes,
        ctx,
        stamp,
        emitted: HashSet::new(),
    };
    builder.build(&placed, 0, out_body, false)?;

    let section = original
        .main
        .element_children(body)
        .filter(|&c| original.main.has_name(c, W::NS, "sectPr"))
        .last();
    if let Some(section) = section {
        builder.out.import_subtree(&original.main, section, Some(out_body));
    }

    let Builder {
        out, resources, notes, ..
    } = builder;
    let (footnotes, endnotes) = notes.finish();
    debug!(
        atoms = stream.len(),
        resources = resources.len(),
        footnotes = footnotes.is_some(),
        endnotes = endnotes.is_some(),
        "reconstructed document"
    );

    Ok(DocumentTree {
        main: out,
        resources,
        footnotes,
        endnotes,
        last_modified_by: original.last_modified_by.clone(),
        reviewers: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wml::atom_list::create_comparison_unit_atom_list;
    use crate::wml::comparison_unit::get_comparison_unit_list;
    use crate::wml::document::Resource;
    use crate::wml::lcs_algorithm::{correlate, flatten_to_atoms};
    use crate::wml::revision::count_revisions;
    use crate::wml::revision_accepter::{accept_revisions, reject_revisions};
    use crate::wml::settings::CompareSettings;
    use crate::xml::builder::serialize_subtree;
    use pretty_assertions::assert_eq;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

    fn tree(body: &str) -> DocumentTree {
        DocumentTree::from_main_xml(&format!(r#"<w:document {}><w:body>{}</w:body></w:document>"#, NS, body)).unwrap()
    }

    fn para(text: &str) -> String {
        format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, text)
    }

    fn redline(original: &DocumentTree, revised: &DocumentTree) -> DocumentTree {
        let settings = CompareSettings::default();
        let mut ctx = CompareContext::new(&settings);
        let a1 = create_comparison_unit_atom_list(original, 0, &settings).unwrap();
        let a2 = create_comparison_unit_atom_list(revised, 1, &settings).unwrap();
        let u1 = get_comparison_unit_list(&a1.atoms, &original.main, &settings).unwrap();
        let u2 = get_comparison_unit_list(&a2.atoms, &revised.main, &settings).unwrap();
        let seqs = correlate(&u1, &u2, &mut ctx, 0).unwrap();
        let stream = flatten_to_atoms(&seqs).unwrap();
        let mut map = AncestorMap::new();
        map.learn(&stream);
        let stamp = RevisionStamp::new("Reviewer", "2024-01-01T00:00:00Z");
        reconstruct(&[original, revised], &stream, &map, &mut ctx, &stamp).unwrap()
    }

    fn body_xml(tree: &DocumentTree) -> String {
        serialize_subtree(&tree.main, tree.body().unwrap()).unwrap()
    }

    #[test]
    fn changed_word_is_deleted_and_inserted() {
        let original = tree(&para("The quick brown fox"));
        let revised = tree(&para("The quick red fox"));
        let result = redline(&original, &revised);
        let xml = body_xml(&result);

        assert!(xml.contains(
            r#"<w:del w:id="1" w:author="Reviewer" w:date="2024-01-01T00:00:00Z"><w:r><w:delText>brown</w:delText></w:r></w:del>"#
        ));
        assert!(xml.contains(
            r#"<w:ins w:id="2" w:author="Reviewer" w:date="2024-01-01T00:00:00Z"><w:r><w:t>red</w:t></w:r></w:ins>"#
        ));
        assert!(xml.contains(r#"<w:t xml:space="preserve">The quick </w:t>"#));
        assert_eq!(accept_revisions(&result).text(), "The quick red fox\n");
        assert_eq!(reject_revisions(&result).text(), "The quick brown fox\n");
    }

    #[test]
    fn identical_documents_round_trip() {
        let body = r#"<w:p><w:r><w:t>One</w:t></w:r></w:p><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>Two</w:t></w:r></w:p>"#;
        let result = redline(&tree(body), &tree(body));
        let root = result.body().unwrap();
        assert_eq!(count_revisions(&result.main, root).total(), 0);
        assert_eq!(body_xml(&result), body_xml(&tree(body)));
    }

    #[test]
    fn inserted_paragraph_marks_its_mark() {
        let original = tree(&format!("{}{}", para("Alpha beta gamma"), para("Omega end")));
        let revised = tree(&format!("{}{}{}", para("Alpha beta gamma"), para("Brand new"), para("Omega end")));
        let result = redline(&original, &revised);
        let xml = body_xml(&result);

        assert!(xml.contains(r#"<w:pPr><w:rPr><w:ins "#));
        assert_eq!(accept_revisions(&result).text(), "Alpha beta gamma\nBrand new\nOmega end\n");
        assert_eq!(reject_revisions(&result).text(), "Alpha beta gamma\nOmega end\n");
    }

    #[test]
    fn split_paragraph_gets_two_paragraphs() {
        let original = tree(&para("First half second half"));
        let revised = tree(&format!("{}{}", para("First half"), para(" second half")));
        let result = redline(&original, &revised);
        let accepted = accept_revisions(&result).text();
        assert_eq!(accepted, "First half\n second half\n");
        assert_eq!(reject_revisions(&result).text(), "First half second half\n");
    }

    #[test]
    fn deleted_row_is_marked() {
        let row = |text: &str| format!(r#"<w:tr><w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc></w:tr>"#, text);
        let table = |rows: &[&str]| {
            format!(
                r#"<w:tbl><w:tblPr/><w:tblGrid><w:gridCol/></w:tblGrid>{}</w:tbl>"#,
                rows.iter().map(|r| row(r)).collect::<String>()
            )
        };
        let original = tree(&table(&["keep this row", "drop this row", "and this one stays"]));
        let revised = tree(&table(&["keep this row", "and this one stays"]));
        let result = redline(&original, &revised);
        let xml = body_xml(&result);

        assert!(xml.contains(r#"<w:tblGrid><w:gridCol/></w:tblGrid>"#));
        assert!(xml.contains(r#"<w:trPr><w:del "#));
        assert_eq!(accept_revisions(&result).text(), "keep this row\nand this one stays\n");
        assert_eq!(
            reject_revisions(&result).text(),
            "keep this row\ndrop this row\nand this one stays\n"
        );
    }

    #[test]
    fn section_properties_stay_last() {
        let sect = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr>"#;
        let original = tree(&format!("{}{}", para("Hello there"), sect));
        let revised = tree(&format!("{}{}", para("Hello world"), sect));
        let result = redline(&original, &revised);
        let root = result.body().unwrap();
        let last = result.main.element_children(root).last().unwrap();
        assert!(result.main.has_name(last, W::NS, "sectPr"));
        assert_eq!(
            result
                .main
                .element_children(root)
                .filter(|&c| result.main.has_name(c, W::NS, "sectPr"))
                .count(),
            1
        );
    }

    #[test]
    fn revision_ids_are_unique() {
        let original = tree(&format!("{}{}", para("one two three four"), para("five six seven")));
        let revised = tree(&format!("{}{}", para("one 2 three 4"), para("five 6 seven eight")));
        let result = redline(&original, &revised);
        let root = result.body().unwrap();
        let ids: Vec<String> = result
            .main
            .descendants(root)
            .filter(|&d| result.main.has_name(d, W::NS, "ins") || result.main.has_name(d, W::NS, "del"))
            .filter_map(|d| result.main.attribute(d, &W::id()).map(str::to_string))
            .collect();
        let unique: HashSet<&String> = ids.iter().collect();
        assert!(!ids.is_empty());
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn inserted_hyperlink_is_relocated() {
        let original = tree(&para("See the site"));
        let revised = tree(r#"<w:p><w:r><w:t xml:space="preserve">See the site </w:t></w:r><w:hyperlink r:id="rId1"><w:r><w:t>here</w:t></w:r></w:hyperlink></w:p>"#)
            .with_resource(Resource::new("rId1", "hyperlink", "https://example.com").external());
        let original = original.with_resource(Resource::new("rId1", "styles", "styles.xml"));
        let result = redline(&original, &revised);

        let root = result.body().unwrap();
        let link = result.main.first_descendant_named(root, &W::hyperlink()).unwrap();
        let id = result.main.attribute(link, &crate::xml::namespaces::R::id()).unwrap();
        assert_ne!(id, "rId1");
        assert_eq!(result.resources.get(id).map(|r| r.target.as_str()), Some("https://example.com"));
        assert_eq!(result.resources.get("rId1").map(|r| r.target.as_str()), Some("styles.xml"));
    }

    #[test]
    fn ancestor_map_translates_revised_nodes() {
        let body = para("Same text");
        let original = tree(&body);
        let revised = tree(&body);
        let settings = CompareSettings::default();
        let a1 = create_comparison_unit_atom_list(&original, 0, &settings).unwrap();
        let a2 = create_comparison_unit_atom_list(&revised, 1, &settings).unwrap();
        let stream: Vec<AlignedAtom> = a1
            .atoms
            .iter()
            .zip(a2.atoms.iter())
            .map(|(x, y)| {
                let mut aligned = AlignedAtom::new(CorrelationStatus::Equal, x.clone());
                aligned.counterpart = Some(y.clone());
                aligned
            })
            .collect();
        let mut map = AncestorMap::new();
        map.learn(&stream);
        assert_eq!(map.len(), 2);

        let revised_p = a2.atoms[0].ancestors[0].node;
        let original_p = a1.atoms[0].ancestors[0].node;
        assert_eq!(
            map.translate(Link { source: 1, node: revised_p }),
            Link { source: 0, node: original_p }
        );
        let unknown = Link { source: 2, node: revised_p };
        assert_eq!(map.translate(unknown), unknown);
    }
}
