//! Document preparation before decomposition.
//!
//! 1. Reject constructs the comparison model has no representation for.
//! 2. Bound element nesting.
//! 3. Accept tracked revisions already present, on a copy of the input.

use super::document::{DocumentTree, NoteKind};
use super::revision_accepter::accept_revisions;
use super::settings::CompareSettings;
use crate::error::{CompareError, Result};
use crate::xml::arena::XmlDocument;
use crate::xml::namespaces::W;
use tracing::debug;

pub(crate) const MAIN_PART: &str = "word/document.xml";

/// Elements that abort a comparison.
const UNSUPPORTED_ELEMENTS: &[&str] = &[
    "moveFrom",
    "moveTo",
    "moveFromRangeStart",
    "moveFromRangeEnd",
    "moveToRangeStart",
    "moveToRangeEnd",
    "subDoc",
    "altChunk",
    "customXmlInsRangeStart",
    "customXmlInsRangeEnd",
    "customXmlDelRangeStart",
    "customXmlDelRangeEnd",
    "customXmlMoveFromRangeStart",
    "customXmlMoveFromRangeEnd",
    "customXmlMoveToRangeStart",
    "customXmlMoveToRangeEnd",
];

/// Parts of a tree with the path they are stored at.
pub(crate) fn parts(tree: &DocumentTree) -> Vec<(&'static str, &XmlDocument)> {
    let mut parts = vec![(MAIN_PART, &tree.main)];
    for kind in [NoteKind::Footnote, NoteKind::Endnote] {
        if let Some(notes) = tree.notes(kind) {
            parts.push((kind.part_path(), &notes.doc));
        }
    }
    parts
}

/// Fails on the first unsupported construct.
pub fn check_supported(tree: &DocumentTree) -> Result<()> {
    for (part, doc) in parts(tree) {
        let Some(root) = doc.root() else { continue };
        for node in doc.descendants(root) {
            let Some(name) = doc.name(node) else { continue };
            if name.in_namespace(W::NS) && UNSUPPORTED_ELEMENTS.contains(&name.local_name.as_str()) {
                return Err(CompareError::structural(name.local_name.clone(), part));
            }
        }
    }
    Ok(())
}

/// Levels between a part root and its block content (`w:document/w:body`,
/// `w:footnotes/w:footnote`).
const CONTENT_OFFSET: usize = 2;

/// Fails when content in any part nests deeper than `max_depth` below its
/// body or note element.
pub fn check_depth(tree: &DocumentTree, max_depth: usize) -> Result<()> {
    let allowed = max_depth + CONTENT_OFFSET;
    for (_, doc) in parts(tree) {
        let Some(root) = doc.root() else { continue };
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if depth > allowed {
                return Err(CompareError::NestingTooDeep {
                    limit: max_depth,
                    stage: "preparation",
                });
            }
            stack.extend(doc.element_children(node).map(|c| (c, depth + 1)));
        }
    }
    Ok(())
}

/// Checked copy of `tree` with every pre-existing revision accepted.
pub fn prepare(tree: &DocumentTree, settings: &CompareSettings) -> Result<DocumentTree> {
    check_supported(tree)?;
    check_depth(tree, settings.max_nesting_depth)?;
    let prepared = accept_revisions(tree);
    debug!(
        footnotes = prepared.footnotes.is_some(),
        endnotes = prepared.endnotes.is_some(),
        "prepared document"
    );
    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(body: &str) -> DocumentTree {
        DocumentTree::from_main_xml(&format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        ))
        .unwrap()
    }

    #[test]
    fn move_ranges_are_rejected() {
        let t = tree(r#"<w:p><w:moveFromRangeStart w:id="1" w:name="m"/><w:moveFrom w:id="2"><w:r><w:t>x</w:t></w:r></w:moveFrom></w:p>"#);
        let err = prepare(&t, &CompareSettings::default()).unwrap_err();
        assert!(err.is_structural());
        assert_eq!(
            err.to_string(),
            "Unsupported construct 'moveFromRangeStart' in word/document.xml"
        );
    }

    #[test]
    fn constructs_in_notes_name_the_notes_part() {
        let t = tree("<w:p/>")
            .with_endnotes_xml(r#"<w:endnotes xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:endnote w:id="1"><w:altChunk/></w:endnote></w:endnotes>"#)
            .unwrap();
        match check_supported(&t) {
            Err(CompareError::Structural { construct, part }) => {
                assert_eq!(construct, "altChunk");
                assert_eq!(part, "word/endnotes.xml");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn existing_revisions_are_accepted_on_a_copy() {
        let t = tree(r#"<w:p><w:ins w:id="1" w:author="a" w:date="d"><w:r><w:t>new</w:t></w:r></w:ins><w:del w:id="2" w:author="a" w:date="d"><w:r><w:delText>old</w:delText></w:r></w:del></w:p>"#);
        let prepared = prepare(&t, &CompareSettings::default()).unwrap();
        assert_eq!(prepared.text(), "new\n");
        let body = t.body().unwrap();
        assert!(t.main.first_descendant_named(body, &W::ins()).is_some());
    }

    #[test]
    fn deep_nesting_is_structural() {
        let mut body = String::new();
        for _ in 0..10 {
            body.push_str("<w:sdt><w:sdtContent>");
        }
        for _ in 0..10 {
            body.push_str("</w:sdtContent></w:sdt>");
        }
        let t = tree(&body);
        let settings = CompareSettings::default().with_max_nesting_depth(8);
        let err = prepare(&t, &settings).unwrap_err();
        assert!(matches!(err, CompareError::NestingTooDeep { limit: 8, stage: "preparation" }));
        assert!(prepare(&t, &CompareSettings::default()).is_ok());
    }
}
