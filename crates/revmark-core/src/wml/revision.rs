use super::context::CompareContext;
use crate::xml::arena::XmlDocument;
use crate::xml::namespaces::W;
use crate::xml::node::XmlNodeData;
use crate::xml::xname::{XAttribute, XName};
use indextree::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionKind {
    Inserted,
    Deleted,
}

impl RevisionKind {
    pub fn element_name(self) -> XName {
        match self {
            Self::Inserted => W::ins(),
            Self::Deleted => W::del(),
        }
    }

    pub fn from_element(name: &XName) -> Option<Self> {
        if is_insertion(name) {
            Some(Self::Inserted)
        } else if is_deletion(name) {
            Some(Self::Deleted)
        } else {
            None
        }
    }
}

impl fmt::Display for RevisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted => write!(f, "Inserted"),
            Self::Deleted => write!(f, "Deleted"),
        }
    }
}

/// Author and date written on every revision element of one emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionStamp {
    pub author: String,
    pub date: String,
}

impl RevisionStamp {
    pub fn new(author: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            date: date.into(),
        }
    }

    /// Same date, different author.
    pub fn with_author(&self, author: &str) -> Self {
        Self {
            author: author.to_string(),
            date: self.date.clone(),
        }
    }
}

pub fn revision_element(kind: RevisionKind, stamp: &RevisionStamp, ctx: &mut CompareContext<'_>) -> XmlNodeData {
    let rev_id = ctx.next_revision_id();
    let attrs = vec![
        XAttribute::new(W::id(), &rev_id.to_string()), // w:id first
        XAttribute::new(W::author(), &stamp.author),
        XAttribute::new(W::date(), &stamp.date),
    ];
    XmlNodeData::element_with_attrs(kind.element_name(), attrs)
}

pub fn create_revision(
    doc: &mut XmlDocument,
    parent: NodeId,
    kind: RevisionKind,
    stamp: &RevisionStamp,
    ctx: &mut CompareContext<'_>,
) -> NodeId {
    let data = revision_element(kind, stamp, ctx);
    doc.add_child(parent, data)
}

/// Finds `name` among the children of `parent` or creates it. A new element
/// goes before the first child named in `before`, or at the end.
fn ensure_child(doc: &mut XmlDocument, parent: NodeId, name: XName, before: &[&str]) -> NodeId {
    if let Some(existing) = doc.first_child_named(parent, &name) {
        return existing;
    }
    let anchor = doc.element_children(parent).find(|&c| {
        doc.name(c)
            .map(|n| n.in_namespace(W::NS) && before.contains(&n.local_name.as_str()))
            .unwrap_or(false)
    });
    match anchor {
        Some(anchor) => doc.add_before(anchor, XmlNodeData::element(name)),
        None => doc.add_child(parent, XmlNodeData::element(name)),
    }
}

/// Marks the paragraph mark of `p` as inserted or deleted (`pPr/rPr/ins|del`).
pub fn mark_paragraph(
    doc: &mut XmlDocument,
    p: NodeId,
    kind: RevisionKind,
    stamp: &RevisionStamp,
    ctx: &mut CompareContext<'_>,
) {
    let ppr = match doc.first_child_named(p, &W::pPr()) {
        Some(ppr) => ppr,
        None => doc.add_first_child(p, XmlNodeData::element(W::pPr())),
    };
    let rpr = ensure_child(doc, ppr, W::rPr(), &["sectPr", "pPrChange"]);
    let data = revision_element(kind, stamp, ctx);
    doc.add_first_child(rpr, data);
}

/// Marks a whole table row as inserted or deleted (`trPr/ins|del`).
pub fn mark_row(
    doc: &mut XmlDocument,
    tr: NodeId,
    kind: RevisionKind,
    stamp: &RevisionStamp,
    ctx: &mut CompareContext<'_>,
) {
    let trpr = match doc.first_child_named(tr, &W::trPr()) {
        Some(trpr) => trpr,
        None => {
            let anchor = doc
                .element_children(tr)
                .find(|&c| !doc.has_name(c, W::NS, "tblPrEx"));
            match anchor {
                Some(anchor) => doc.add_before(anchor, XmlNodeData::element(W::trPr())),
                None => doc.add_child(tr, XmlNodeData::element(W::trPr())),
            }
        }
    };
    let data = revision_element(kind, stamp, ctx);
    match doc.first_child_named(trpr, &W::trPrChange()) {
        Some(change) => {
            doc.add_before(change, data);
        }
        None => {
            doc.add_child(trpr, data);
        }
    }
}

/// Turns `t` into `delText` and `instrText` into `delInstrText` below `node`.
pub fn convert_to_deleted_text(doc: &mut XmlDocument, node: NodeId) {
    let targets: Vec<(NodeId, XName)> = doc
        .descendants(node)
        .filter_map(|d| {
            let name = doc.name(d)?;
            if *name == W::t() {
                Some((d, W::delText()))
            } else if *name == W::instrText() {
                Some((d, W::delInstrText()))
            } else {
                None
            }
        })
        .collect();
    for (d, name) in targets {
        doc.rename(d, name);
    }
}

/// Inverse of [`convert_to_deleted_text`].
pub fn convert_to_live_text(doc: &mut XmlDocument, node: NodeId) {
    let targets: Vec<(NodeId, XName)> = doc
        .descendants(node)
        .filter_map(|d| {
            let name = doc.name(d)?;
            if *name == W::delText() {
                Some((d, W::t()))
            } else if *name == W::delInstrText() {
                Some((d, W::instrText()))
            } else {
                None
            }
        })
        .collect();
    for (d, name) in targets {
        doc.rename(d, name);
    }
}

/// The revision mark on a paragraph's mark, if any.
pub fn paragraph_mark_revision(doc: &XmlDocument, p: NodeId) -> Option<(RevisionKind, NodeId)> {
    let ppr = doc.first_child_named(p, &W::pPr())?;
    let rpr = doc.first_child_named(ppr, &W::rPr())?;
    doc.element_children(rpr)
        .find_map(|c| doc.name(c).and_then(RevisionKind::from_element).map(|k| (k, c)))
}

/// The revision mark on a row, if any.
pub fn row_revision(doc: &XmlDocument, tr: NodeId) -> Option<(RevisionKind, NodeId)> {
    let trpr = doc.first_child_named(tr, &W::trPr())?;
    doc.element_children(trpr)
        .find_map(|c| doc.name(c).and_then(RevisionKind::from_element).map(|k| (k, c)))
}

pub fn is_revision_element(name: &XName) -> bool {
    is_insertion(name) || is_deletion(name)
}

pub fn is_insertion(name: &XName) -> bool {
    name.namespace.as_deref() == Some(W::NS) && name.local_name == "ins"
}

pub fn is_deletion(name: &XName) -> bool {
    name.namespace.as_deref() == Some(W::NS) && name.local_name == "del"
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionCounts {
    pub insertions: usize,
    pub deletions: usize,
}

impl RevisionCounts {
    pub fn total(&self) -> usize {
        self.insertions + self.deletions
    }
}

/// Counts revisions, treating adjacent sibling marks with the same kind,
/// author and date as one.
pub fn count_revisions(doc: &XmlDocument, start: NodeId) -> RevisionCounts {
    let mut counts = RevisionCounts::default();
    count_revisions_in_subtree(doc, start, &mut counts);
    counts
}

/// Grouping key for a revision element: kind, author and date but not id.
fn get_revision_key(doc: &XmlDocument, node: NodeId) -> Option<(RevisionKind, String, String)> {
    let kind = RevisionKind::from_element(doc.name(node)?)?;
    let author = doc.attribute(node, &W::author()).unwrap_or_default().to_string();
    let date = doc.attribute(node, &W::date()).unwrap_or_default().to_string();
    Some((kind, author, date))
}

fn count_revisions_in_subtree(doc: &XmlDocument, node: NodeId, counts: &mut RevisionCounts) {
    let mut last_key = None;

    for child in doc.element_children(node) {
        if let Some(key) = get_revision_key(doc, child) {
            if last_key.as_ref() != Some(&key) {
                match key.0 {
                    RevisionKind::Inserted => counts.insertions += 1,
                    RevisionKind::Deleted => counts.deletions += 1,
                }
            }
            last_key = Some(key);
            // content of a revision element belongs to that revision
        } else {
            last_key = None;
            count_revisions_in_subtree(doc, child, counts);
        }
    }
}
