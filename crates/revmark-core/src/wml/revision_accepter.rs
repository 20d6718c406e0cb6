//! Accepting or rejecting every tracked insertion and deletion.
//!
//! Both passes work on a copy of the tree. Accept keeps inserted content and
//! drops deleted content; reject does the opposite and turns `delText` back
//! into `t`. A paragraph whose mark goes away merges into the paragraph that
//! follows it, and a row whose revision goes away is removed.

use super::document::DocumentTree;
use super::revision::{convert_to_live_text, paragraph_mark_revision, row_revision, RevisionKind};
use crate::xml::arena::XmlDocument;
use crate::xml::namespaces::W;
use indextree::NodeId;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Property-change markup. Formatting is not tracked, so these are dropped
/// by both passes.
static PROPERTY_CHANGES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "pPrChange",
        "rPrChange",
        "tblPrChange",
        "tblGridChange",
        "tcPrChange",
        "trPrChange",
        "tblPrExChange",
        "sectPrChange",
        "numberingChange",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Accept,
    Reject,
}

impl Resolution {
    /// The revision kind whose content is discarded.
    fn discarded(self) -> RevisionKind {
        match self {
            Self::Accept => RevisionKind::Deleted,
            Self::Reject => RevisionKind::Inserted,
        }
    }

    /// Content wrappers that are removed with their content, and the ones
    /// that are unwrapped.
    fn removed_wrappers(self) -> &'static [&'static str] {
        match self {
            Self::Accept => &["del", "moveFrom"],
            Self::Reject => &["ins", "moveTo"],
        }
    }

    fn unwrapped_wrappers(self) -> &'static [&'static str] {
        match self {
            Self::Accept => &["ins", "moveTo"],
            Self::Reject => &["del", "moveFrom"],
        }
    }
}

pub fn accept_revisions(tree: &DocumentTree) -> DocumentTree {
    resolve_tree(tree, Resolution::Accept)
}

pub fn reject_revisions(tree: &DocumentTree) -> DocumentTree {
    resolve_tree(tree, Resolution::Reject)
}

fn resolve_tree(tree: &DocumentTree, resolution: Resolution) -> DocumentTree {
    let mut result = tree.clone();
    resolve_part(&mut result.main, resolution);
    for notes in [&mut result.footnotes, &mut result.endnotes].into_iter().flatten() {
        resolve_part(&mut notes.doc, resolution);
    }
    result
}

fn resolve_part(doc: &mut XmlDocument, resolution: Resolution) {
    let Some(root) = doc.root() else { return };
    remove_rows(doc, root, resolution);
    merge_paragraphs(doc, root, resolution);
    resolve_wrappers(doc, root, resolution);
    if resolution == Resolution::Reject {
        convert_to_live_text(doc, root);
    }
}

fn elements_named(doc: &XmlDocument, root: NodeId, local: &str) -> Vec<NodeId> {
    doc.descendants(root)
        .filter(|&d| doc.has_name(d, W::NS, local))
        .collect()
}

fn remove_rows(doc: &mut XmlDocument, root: NodeId, resolution: Resolution) {
    for tr in elements_named(doc, root, "tr") {
        if !doc.is_live(tr) {
            continue;
        }
        match row_revision(doc, tr) {
            Some((kind, _)) if kind == resolution.discarded() => doc.remove(tr),
            Some((_, mark)) => doc.remove(mark),
            None => {}
        }
    }
}

/// A paragraph whose mark is discarded hands its content to the next
/// paragraph in the same container.
fn merge_paragraphs(doc: &mut XmlDocument, root: NodeId, resolution: Resolution) {
    for p in elements_named(doc, root, "p") {
        if !doc.is_live(p) {
            continue;
        }
        let Some((kind, mark)) = paragraph_mark_revision(doc, p) else {
            continue;
        };
        doc.remove(mark);
        if kind != resolution.discarded() {
            continue;
        }
        let Some(next) = next_paragraph(doc, p) else {
            // Nothing to merge into: the paragraph stays only if some of its
            // content survives.
            let survives = doc.children(p).any(|c| {
                doc.local_name(c)
                    .map(|local| local != "pPr" && !resolution.removed_wrappers().contains(&local))
                    .unwrap_or(false)
            });
            if !survives {
                doc.remove(p);
            }
            continue;
        };

        let content: Vec<NodeId> = doc
            .children(p)
            .filter(|&c| !doc.has_name(c, W::NS, "pPr"))
            .collect();
        let anchor = doc.children(next).find(|&c| !doc.has_name(c, W::NS, "pPr"));
        for child in content {
            match anchor {
                Some(anchor) => doc.move_before(anchor, child),
                None => doc.append(next, child),
            }
        }
        doc.remove(p);
    }
}

fn next_paragraph(doc: &XmlDocument, p: NodeId) -> Option<NodeId> {
    let mut sibling = doc.next_sibling(p);
    while let Some(s) = sibling {
        if doc.has_name(s, W::NS, "p") {
            return Some(s);
        }
        if doc.has_name(s, W::NS, "tbl") || doc.has_name(s, W::NS, "sectPr") {
            return None;
        }
        sibling = doc.next_sibling(s);
    }
    None
}

fn resolve_wrappers(doc: &mut XmlDocument, root: NodeId, resolution: Resolution) {
    let targets: Vec<(NodeId, bool)> = doc
        .descendants(root)
        .filter_map(|d| {
            let name = doc.name(d)?;
            if !name.in_namespace(W::NS) {
                return None;
            }
            let local = name.local_name.as_str();
            if resolution.removed_wrappers().contains(&local) || PROPERTY_CHANGES.contains(local) {
                Some((d, true))
            } else if resolution.unwrapped_wrappers().contains(&local) {
                Some((d, false))
            } else {
                None
            }
        })
        .collect();

    for (node, remove) in targets {
        // an earlier removal may have taken this node with it
        if !doc.is_live(node) {
            continue;
        }
        if remove {
            doc.remove(node);
        } else {
            doc.unwrap_node(node);
        }
    }

    if resolution == Resolution::Accept {
        for stray in elements_named(doc, root, "delText")
            .into_iter()
            .chain(elements_named(doc, root, "delInstrText"))
        {
            if doc.is_live(stray) {
                doc.remove(stray);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree(body: &str) -> DocumentTree {
        DocumentTree::from_main_xml(&format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        ))
        .unwrap()
    }

    const MIXED: &str = r#"<w:p><w:r><w:t xml:space="preserve">The quick </w:t></w:r><w:del w:id="1" w:author="a" w:date="d"><w:r><w:delText>brown</w:delText></w:r></w:del><w:ins w:id="2" w:author="a" w:date="d"><w:r><w:t>red</w:t></w:r></w:ins><w:r><w:t xml:space="preserve"> fox</w:t></w:r></w:p>"#;

    #[test]
    fn accept_keeps_insertions() {
        let result = accept_revisions(&tree(MIXED));
        assert_eq!(result.text(), "The quick red fox\n");
        let body = result.body().unwrap();
        assert!(result.main.first_descendant_named(body, &W::ins()).is_none());
        assert!(result.main.first_descendant_named(body, &W::del()).is_none());
    }

    #[test]
    fn reject_restores_deletions() {
        let result = reject_revisions(&tree(MIXED));
        assert_eq!(result.text(), "The quick brown fox\n");
        let body = result.body().unwrap();
        assert!(result.main.first_descendant_named(body, &W::delText()).is_none());
    }

    #[test]
    fn deleted_mark_merges_paragraphs_on_accept() {
        let body = r#"<w:p><w:pPr><w:rPr><w:del w:id="1" w:author="a" w:date="d"/></w:rPr></w:pPr><w:r><w:t>One</w:t></w:r></w:p><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>Two</w:t></w:r></w:p>"#;
        let accepted = accept_revisions(&tree(body));
        assert_eq!(accepted.text(), "OneTwo\n");
        let rejected = reject_revisions(&tree(body));
        assert_eq!(rejected.text(), "One\nTwo\n");
    }

    #[test]
    fn fully_deleted_last_paragraph_disappears() {
        let body = r#"<w:p><w:r><w:t>Keep</w:t></w:r></w:p><w:p><w:pPr><w:rPr><w:del w:id="1" w:author="a" w:date="d"/></w:rPr></w:pPr><w:del w:id="2" w:author="a" w:date="d"><w:r><w:delText>Gone</w:delText></w:r></w:del></w:p>"#;
        assert_eq!(accept_revisions(&tree(body)).text(), "Keep
");
        assert_eq!(reject_revisions(&tree(body)).text(), "Keep
Gone
");
    }

    #[test]
    fn inserted_mark_merges_paragraphs_on_reject() {
        let body = r#"<w:p><w:pPr><w:rPr><w:ins w:id="1" w:author="a" w:date="d"/></w:rPr></w:pPr><w:ins w:id="2" w:author="a" w:date="d"><w:r><w:t>New</w:t></w:r></w:ins></w:p><w:p><w:r><w:t>Old</w:t></w:r></w:p>"#;
        assert_eq!(reject_revisions(&tree(body)).text(), "Old\n");
        assert_eq!(accept_revisions(&tree(body)).text(), "New\nOld\n");
    }

    #[test]
    fn rows_follow_their_revision() {
        let body = r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>keep</w:t></w:r></w:p></w:tc></w:tr><w:tr><w:trPr><w:del w:id="1" w:author="a" w:date="d"/></w:trPr><w:tc><w:p><w:del w:id="2" w:author="a" w:date="d"><w:r><w:delText>gone</w:delText></w:r></w:del></w:p></w:tc></w:tr></w:tbl>"#;
        let accepted = accept_revisions(&tree(body));
        let root = accepted.body().unwrap();
        assert_eq!(accepted.main.descendants(root).filter(|&d| accepted.main.has_name(d, W::NS, "tr")).count(), 1);
        assert_eq!(accepted.text(), "keep\n");

        let rejected = reject_revisions(&tree(body));
        assert_eq!(rejected.text(), "keep\ngone\n");
        let root = rejected.body().unwrap();
        assert!(rejected.main.first_descendant_named(root, &W::del()).is_none());
    }

    #[test]
    fn notes_are_resolved_too() {
        let t = tree("<w:p/>")
            .with_footnotes_xml(r#"<w:footnotes xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:footnote w:id="1"><w:p><w:ins w:id="1" w:author="a" w:date="d"><w:r><w:t>note</w:t></w:r></w:ins></w:p></w:footnote></w:footnotes>"#)
            .unwrap();
        let rejected = reject_revisions(&t);
        let notes = rejected.footnotes.as_ref().unwrap();
        let root = notes.doc.root().unwrap();
        assert_eq!(notes.doc.text_content(root), "");
    }
}
