//! Listing the tracked insertions and deletions of a document.
//!
//! Each part is read in document order. A paragraph's mark counts as coming
//! after its content and a row's mark before its cells, so a deleted
//! paragraph or an inserted row reads as one piece. Consecutive revisions
//! with the same kind, author and date, with no live content between them,
//! are reported as one [`Revision`].

use super::document::{Color, DocumentTree};
use super::preprocess::parts;
use super::revision::{paragraph_mark_revision, row_revision, RevisionKind};
use super::settings::CompareSettings;
use crate::error::{CompareError, Result};
use crate::xml::arena::XmlDocument;
use crate::xml::builder::serialize_subtree;
use crate::xml::namespaces::W;
use chrono::{DateTime, FixedOffset};
use indextree::NodeId;
use serde::Serialize;
use tracing::debug;

/// Run content that is visible when it is not inside a revision.
const LIVE_CONTENT: &[&str] = &[
    "t", "tab", "ptab", "br", "cr", "sym", "noBreakHyphen", "softHyphen", "drawing", "pict",
    "object", "fldChar", "instrText", "footnoteReference", "endnoteReference",
];

/// Element properties that never hold revisions of their own.
const PROPERTIES: &[&str] = &["pPr", "rPr", "tblPr", "tblGrid", "trPr", "tcPr", "sectPr", "tblPrEx", "sdtPr"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Revision {
    pub kind: RevisionKind,
    pub text: String,
    pub author: String,
    /// `w:date` as written.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Markup of the revision elements, concatenated.
    pub content_fragment: String,
    pub containing_part: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

#[derive(Debug)]
enum Item {
    Revision {
        kind: RevisionKind,
        author: String,
        date: String,
        text: String,
        node: NodeId,
    },
    Live,
}

/// Every revision of `tree`: main part first, then footnotes, then endnotes.
///
/// Text is reported as written; case folding in `settings` only affects
/// comparison.
pub fn extract_revisions(tree: &DocumentTree, settings: &CompareSettings) -> Result<Vec<Revision>> {
    let limit = settings.max_nesting_depth + 2;
    let mut revisions = Vec::new();

    for (part, doc) in parts(tree) {
        let Some(root) = doc.root() else { continue };
        let mut items = Vec::new();
        walk(doc, root, 0, limit, &mut items)?;
        let before = revisions.len();
        merge_items(tree, doc, part, items, &mut revisions)?;
        debug!(part, revisions = revisions.len() - before, "extracted revisions");
    }
    Ok(revisions)
}

fn walk(doc: &XmlDocument, node: NodeId, depth: usize, limit: usize, items: &mut Vec<Item>) -> Result<()> {
    if depth > limit {
        return Err(CompareError::NestingTooDeep {
            limit,
            stage: "extraction",
        });
    }
    let Some(name) = doc.name(node) else {
        return Ok(());
    };
    if !name.in_namespace(W::NS) {
        for child in doc.element_children(node) {
            walk(doc, child, depth + 1, limit, items)?;
        }
        return Ok(());
    }

    let local = name.local_name.as_str();
    if let Some(item) = revision_item(doc, node, None) {
        items.push(item);
        return Ok(());
    }
    if PROPERTIES.contains(&local) {
        return Ok(());
    }
    if LIVE_CONTENT.contains(&local) {
        items.push(Item::Live);
        return Ok(());
    }

    if local == "tr" {
        if let Some((_, mark)) = row_revision(doc, node) {
            items.extend(revision_item(doc, mark, Some(String::new())));
        }
    }
    for child in doc.element_children(node) {
        walk(doc, child, depth + 1, limit, items)?;
    }
    if local == "p" {
        match paragraph_mark_revision(doc, node) {
            Some((_, mark)) => items.extend(revision_item(doc, mark, Some("\n".to_string()))),
            None => items.push(Item::Live),
        }
    }
    Ok(())
}

/// Item for a revision element. `text` overrides the text read from its
/// content, for marks.
fn revision_item(doc: &XmlDocument, node: NodeId, text: Option<String>) -> Option<Item> {
    let kind = RevisionKind::from_element(doc.name(node)?)?;
    Some(Item::Revision {
        kind,
        author: doc.attribute(node, &W::author()).unwrap_or_default().to_string(),
        date: doc.attribute(node, &W::date()).unwrap_or_default().to_string(),
        text: text.unwrap_or_else(|| revision_text(doc, node)),
        node,
    })
}

fn revision_text(doc: &XmlDocument, node: NodeId) -> String {
    let mut text = String::new();
    for d in doc.descendants(node) {
        let Some(name) = doc.name(d).filter(|n| n.in_namespace(W::NS)) else {
            continue;
        };
        match name.local_name.as_str() {
            "t" | "delText" => text.push_str(&doc.text_content(d)),
            "tab" | "ptab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}

fn merge_items(
    tree: &DocumentTree,
    doc: &XmlDocument,
    part: &str,
    items: Vec<Item>,
    out: &mut Vec<Revision>,
) -> Result<()> {
    let mut open = false;
    for item in items {
        let Item::Revision {
            kind,
            author,
            date,
            text,
            node,
        } = item
        else {
            open = false;
            continue;
        };
        let fragment = serialize_subtree(doc, node)?;

        if open {
            if let Some(last) = out.last_mut() {
                if last.kind == kind && last.author == author && last.date == date {
                    last.text.push_str(&text);
                    last.content_fragment.push_str(&fragment);
                    continue;
                }
            }
        }

        let color = tree
            .reviewer_color(&author)
            .or_else(|| author.split(", ").next().and_then(|first| tree.reviewer_color(first)));
        out.push(Revision {
            kind,
            text,
            timestamp: DateTime::parse_from_rfc3339(&date).ok(),
            author,
            date,
            content_fragment: fragment,
            containing_part: part.to_string(),
            color,
        });
        open = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wml::document::Reviewer;
    use pretty_assertions::assert_eq;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn tree(body: &str) -> DocumentTree {
        DocumentTree::from_main_xml(&format!(r#"<w:document {}><w:body>{}</w:body></w:document>"#, NS, body)).unwrap()
    }

    fn summary(revisions: &[Revision]) -> Vec<(RevisionKind, &str, &str)> {
        revisions
            .iter()
            .map(|r| (r.kind, r.text.as_str(), r.author.as_str()))
            .collect()
    }

    #[test]
    fn changed_word_gives_two_revisions() {
        let t = tree(r#"<w:p><w:r><w:t xml:space="preserve">The quick </w:t></w:r><w:del w:id="1" w:author="Ann" w:date="2024-03-01T10:00:00Z"><w:r><w:delText>brown</w:delText></w:r></w:del><w:ins w:id="2" w:author="Ann" w:date="2024-03-01T10:00:00Z"><w:r><w:t>red</w:t></w:r></w:ins><w:r><w:t xml:space="preserve"> fox</w:t></w:r></w:p>"#);
        let revisions = extract_revisions(&t, &CompareSettings::default()).unwrap();
        assert_eq!(
            summary(&revisions),
            vec![(RevisionKind::Deleted, "brown", "Ann"), (RevisionKind::Inserted, "red", "Ann")]
        );
        assert_eq!(revisions[0].containing_part, "word/document.xml");
        assert_eq!(
            revisions[0].timestamp.map(|t| t.to_rfc3339()),
            Some("2024-03-01T10:00:00+00:00".to_string())
        );
        let fragment = &revisions[1].content_fragment;
        assert!(fragment.starts_with(r#"<w:ins w:id="2" w:author="Ann" w:date="2024-03-01T10:00:00Z""#));
        assert!(fragment.ends_with("<w:r><w:t>red</w:t></w:r></w:ins>"));
    }

    #[test]
    fn deleted_paragraphs_read_as_one_revision() {
        let del = |id: u32| format!(r#"w:id="{}" w:author="Bo" w:date="d""#, id);
        let body = format!(
            r#"<w:p><w:pPr><w:rPr><w:del {}/></w:rPr></w:pPr><w:del {}><w:r><w:delText>One</w:delText><w:tab/></w:r></w:del></w:p><w:p><w:pPr><w:rPr><w:del {}/></w:rPr></w:pPr><w:del {}><w:r><w:delText>Two</w:delText></w:r></w:del></w:p><w:p><w:r><w:t>Kept</w:t></w:r></w:p>"#,
            del(1),
            del(2),
            del(3),
            del(4)
        );
        let revisions = extract_revisions(&tree(&body), &CompareSettings::default()).unwrap();
        assert_eq!(summary(&revisions), vec![(RevisionKind::Deleted, "One\t\nTwo\n", "Bo")]);
        assert_eq!(revisions[0].timestamp, None);
    }

    #[test]
    fn live_text_separates_revisions() {
        let body = r#"<w:p><w:ins w:id="1" w:author="A" w:date="d"><w:r><w:t>x</w:t></w:r></w:ins><w:r><w:t>live</w:t></w:r><w:ins w:id="2" w:author="A" w:date="d"><w:r><w:t>y</w:t></w:r></w:ins></w:p>"#;
        let revisions = extract_revisions(&tree(body), &CompareSettings::default()).unwrap();
        assert_eq!(revisions.len(), 2);
    }

    #[test]
    fn inserted_row_includes_its_text() {
        let body = r#"<w:tbl><w:tr><w:trPr><w:ins w:id="1" w:author="A" w:date="d"/></w:trPr><w:tc><w:p><w:pPr><w:rPr><w:ins w:id="2" w:author="A" w:date="d"/></w:rPr></w:pPr><w:ins w:id="3" w:author="A" w:date="d"><w:r><w:t>cell</w:t></w:r></w:ins></w:p></w:tc></w:tr></w:tbl>"#;
        let revisions = extract_revisions(&tree(body), &CompareSettings::default()).unwrap();
        assert_eq!(summary(&revisions), vec![(RevisionKind::Inserted, "cell\n", "A")]);
    }

    #[test]
    fn notes_are_listed_after_the_body() {
        let t = tree(r#"<w:p><w:ins w:id="1" w:author="A" w:date="d"><w:r><w:t>body</w:t></w:r></w:ins></w:p>"#)
            .with_footnotes_xml(&format!(
                r#"<w:footnotes {}><w:footnote w:id="1"><w:p><w:del w:id="2" w:author="A" w:date="d"><w:r><w:delText>note</w:delText></w:r></w:del></w:p></w:footnote></w:footnotes>"#,
                NS
            ))
            .unwrap();
        let revisions = extract_revisions(&t, &CompareSettings::default()).unwrap();
        let parts: Vec<&str> = revisions.iter().map(|r| r.containing_part.as_str()).collect();
        assert_eq!(parts, vec!["word/document.xml", "word/footnotes.xml"]);
        assert_eq!(revisions[1].text, "note");
    }

    #[test]
    fn colors_come_from_reviewers() {
        let mut t = tree(r#"<w:p><w:ins w:id="1" w:author="Cy, Di" w:date="d"><w:r><w:t>x</w:t></w:r></w:ins><w:r><w:t>y</w:t></w:r><w:ins w:id="2" w:author="Ed" w:date="d"><w:r><w:t>z</w:t></w:r></w:ins></w:p>"#);
        t.reviewers = vec![Reviewer {
            name: "Cy".to_string(),
            color: Color(0x11, 0x22, 0x33),
        }];
        let revisions = extract_revisions(&t, &CompareSettings::default()).unwrap();
        assert_eq!(revisions[0].color, Some(Color(0x11, 0x22, 0x33)));
        assert_eq!(revisions[1].color, None);
    }

    #[test]
    fn deep_documents_are_rejected() {
        let mut body = String::new();
        for _ in 0..6 {
            body.push_str("<w:sdt><w:sdtContent>");
        }
        for _ in 0..6 {
            body.push_str("</w:sdtContent></w:sdt>");
        }
        let settings = CompareSettings::default().with_max_nesting_depth(4);
        let err = extract_revisions(&tree(&body), &settings).unwrap_err();
        assert!(matches!(err, CompareError::NestingTooDeep { stage: "extraction", .. }));
    }
}
