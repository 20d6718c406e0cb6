//! Footnote and endnote parts of a reconstructed document.
//!
//! Notes are compared as whole units through their references, so the notes
//! part of the output is rebuilt from scratch: special notes (separators and
//! the like) are kept from the original, then one note is copied for every
//! emitted reference under a fresh id.

use super::context::{CompareContext, PartScope};
use super::document::{DocumentTree, NoteKind, NotesPart};
use super::resources::{relocate_attributes, RelocationSource};
use super::revision::{convert_to_deleted_text, create_revision, mark_paragraph, RevisionKind, RevisionStamp};
use crate::error::{CompareError, Result};
use crate::xml::arena::XmlDocument;
use crate::xml::namespaces::W;
use indextree::NodeId;
use tracing::warn;

impl NoteKind {
    pub(crate) fn scope(self) -> PartScope {
        match self {
            NoteKind::Footnote => PartScope::Footnotes,
            NoteKind::Endnote => PartScope::Endnotes,
        }
    }
}

/// Output notes parts under construction.
pub(crate) struct NoteParts {
    footnotes: Option<NotesPart>,
    endnotes: Option<NotesPart>,
}

impl NoteParts {
    /// Starts both parts from the first source that has them (the original
    /// when it does) and seeds the note id counter past every special note.
    pub fn new(sources: &[&DocumentTree], ctx: &mut CompareContext<'_>) -> Self {
        let mut parts = Self {
            footnotes: None,
            endnotes: None,
        };
        let mut max_special: Option<i64> = None;

        for kind in [NoteKind::Footnote, NoteKind::Endnote] {
            let Some(template) = sources.iter().find_map(|s| s.notes(kind)) else {
                continue;
            };
            let specials = template.special_notes(kind);
            if specials.is_empty() {
                warn!(kind = %kind, "notes part has no separator notes");
            }
            for &note in &specials {
                if let Some(id) = template
                    .doc
                    .attribute(note, &W::id())
                    .and_then(|v| v.parse::<i64>().ok())
                {
                    max_special = Some(max_special.map_or(id, |m| m.max(id)));
                }
            }
            *parts.slot(kind) = Some(start_part(template, &specials));
        }

        if let Some(max) = max_special {
            ctx.seed_note_ids(u32::try_from(max + 1).unwrap_or(0));
        }
        parts
    }

    fn slot(&mut self, kind: NoteKind) -> &mut Option<NotesPart> {
        match kind {
            NoteKind::Footnote => &mut self.footnotes,
            NoteKind::Endnote => &mut self.endnotes,
        }
    }

    /// Copies note `old_id` of `sources[source]` into the output under a
    /// fresh id and returns that id. Deleted and inserted notes have all of
    /// their content marked.
    pub fn emit(
        &mut self,
        kind: NoteKind,
        status: Option<RevisionKind>,
        sources: &[&DocumentTree],
        source: usize,
        old_id: &str,
        stamp: &RevisionStamp,
        ctx: &mut CompareContext<'_>,
    ) -> Result<String> {
        let missing = || CompareError::resource(old_id, format!("referenced {} is not present", kind));
        let from_part = sources
            .get(source)
            .and_then(|tree| tree.notes(kind))
            .ok_or_else(missing)?;
        let from_note = from_part.find(kind, old_id).ok_or_else(missing)?;

        let slot = self.slot(kind);
        if slot.is_none() {
            *slot = Some(start_part(from_part, &[]));
        }
        let Some(NotesPart { doc, resources }) = slot.as_mut() else {
            return Err(missing());
        };
        let Some(root) = doc.root() else {
            return Err(missing());
        };

        let new_id = ctx.next_note_id().to_string();
        let note = if source == 0 {
            doc.import_subtree(&from_part.doc, from_note, Some(root))
        } else {
            let from = RelocationSource {
                source,
                scope: kind.scope(),
                resources: &from_part.resources,
            };
            doc.import_subtree_with(&from_part.doc, from_note, Some(root), &mut |attrs| {
                relocate_attributes(attrs, &from, resources, ctx)
            })?
        };
        let note = note.ok_or_else(missing)?;
        doc.set_attribute(note, &W::id(), &new_id);

        if let Some(kind) = status {
            mark_note_content(doc, note, kind, stamp, ctx);
        }
        Ok(new_id)
    }

    pub fn finish(self) -> (Option<NotesPart>, Option<NotesPart>) {
        (self.footnotes, self.endnotes)
    }
}

/// Empty copy of `template` holding only the given notes.
fn start_part(template: &NotesPart, keep: &[NodeId]) -> NotesPart {
    let mut doc = XmlDocument::new();
    if let Some(root) = template.doc.root() {
        if let Some(data) = template.doc.get(root) {
            let new_root = doc.add_root(data.clone());
            for &note in keep {
                doc.import_subtree(&template.doc, note, Some(new_root));
            }
        }
    }
    NotesPart {
        doc,
        resources: template.resources.clone(),
    }
}

/// Wraps every run of a note in `ins`/`del` and marks every paragraph mark.
fn mark_note_content(
    doc: &mut XmlDocument,
    note: NodeId,
    kind: RevisionKind,
    stamp: &RevisionStamp,
    ctx: &mut CompareContext<'_>,
) {
    let runs: Vec<NodeId> = doc
        .descendants(note)
        .filter(|&d| doc.has_name(d, W::NS, "r"))
        .filter(|&d| {
            doc.parent(d)
                .and_then(|p| doc.name(p))
                .map(|n| !(n.is(W::NS, "ins") || n.is(W::NS, "del")))
                .unwrap_or(true)
        })
        .collect();
    for run in runs {
        let Some(parent) = doc.parent(run) else { continue };
        let wrapper = create_revision(doc, parent, kind, stamp, ctx);
        doc.detach(wrapper);
        doc.move_before(run, wrapper);
        doc.detach(run);
        doc.append(wrapper, run);
        if kind == RevisionKind::Deleted {
            convert_to_deleted_text(doc, run);
        }
    }

    let paragraphs: Vec<NodeId> = doc
        .descendants(note)
        .filter(|&d| doc.has_name(d, W::NS, "p"))
        .collect();
    for p in paragraphs {
        mark_paragraph(doc, p, kind, stamp, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wml::settings::CompareSettings;
    use crate::xml::builder::serialize_subtree;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

    fn tree_with_footnotes(notes: &str) -> DocumentTree {
        DocumentTree::from_main_xml(&format!(r#"<w:document {}><w:body><w:p/></w:body></w:document>"#, NS))
            .unwrap()
            .with_footnotes_xml(&format!(r#"<w:footnotes {}>{}</w:footnotes>"#, NS, notes))
            .unwrap()
    }

    const SPECIALS: &str = r#"<w:footnote w:type="separator" w:id="-1"><w:p><w:r><w:separator/></w:r></w:p></w:footnote><w:footnote w:type="continuationSeparator" w:id="0"><w:p><w:r><w:continuationSeparator/></w:r></w:p></w:footnote>"#;

    #[test]
    fn special_notes_are_kept_and_ids_follow_them() {
        let original = tree_with_footnotes(&format!(r#"{}<w:footnote w:id="7"><w:p><w:r><w:t>Note</w:t></w:r></w:p></w:footnote>"#, SPECIALS));
        let settings = CompareSettings::default();
        let mut ctx = CompareContext::new(&settings);
        let sources = [&original];
        let mut parts = NoteParts::new(&sources, &mut ctx);
        let stamp = RevisionStamp::new("a", "d");

        let id = parts
            .emit(NoteKind::Footnote, None, &sources, 0, "7", &stamp, &mut ctx)
            .unwrap();
        assert_eq!(id, "1");

        let (footnotes, endnotes) = parts.finish();
        assert!(endnotes.is_none());
        let footnotes = footnotes.unwrap();
        let root = footnotes.doc.root().unwrap();
        let ids: Vec<_> = footnotes
            .doc
            .element_children(root)
            .filter_map(|n| footnotes.doc.attribute(n, &W::id()).map(str::to_string))
            .collect();
        assert_eq!(ids, vec!["-1", "0", "1"]);
    }

    #[test]
    fn counter_starts_after_large_special_ids() {
        let original = tree_with_footnotes(r#"<w:footnote w:type="separator" w:id="4"/>"#);
        let settings = CompareSettings::default();
        let mut ctx = CompareContext::new(&settings);
        NoteParts::new(&[&original], &mut ctx);
        assert_eq!(ctx.next_note_id(), 5);
    }

    #[test]
    fn deleted_note_has_all_content_marked() {
        let original = tree_with_footnotes(r#"<w:footnote w:id="2"><w:p><w:r><w:t>Gone</w:t></w:r></w:p></w:footnote>"#);
        let settings = CompareSettings::default();
        let mut ctx = CompareContext::new(&settings);
        let sources = [&original];
        let mut parts = NoteParts::new(&sources, &mut ctx);
        let stamp = RevisionStamp::new("Ann", "d");
        parts
            .emit(NoteKind::Footnote, Some(RevisionKind::Deleted), &sources, 0, "2", &stamp, &mut ctx)
            .unwrap();

        let footnotes = parts.finish().0.unwrap();
        let root = footnotes.doc.root().unwrap();
        let note = footnotes.doc.element_children(root).next().unwrap();
        let xml = serialize_subtree(&footnotes.doc, note).unwrap();
        assert!(xml.contains(r#"<w:del w:id="1" w:author="Ann" w:date="d"><w:r><w:delText>Gone</w:delText></w:r></w:del>"#));
        assert!(xml.contains(r#"<w:pPr><w:rPr><w:del w:id="2" w:author="Ann" w:date="d"/></w:rPr></w:pPr>"#));
    }

    #[test]
    fn inserted_note_relocates_its_resources() {
        use crate::wml::document::Resource;

        let original = tree_with_footnotes(SPECIALS);
        let mut revised = tree_with_footnotes(&format!(
            r#"{}<w:footnote w:id="1"><w:p><w:hyperlink r:id="rId1"><w:r><w:t>link</w:t></w:r></w:hyperlink></w:p></w:footnote>"#,
            SPECIALS
        ));
        if let Some(notes) = revised.footnotes.as_mut() {
            notes
                .resources
                .insert(Resource::new("rId1", "hyperlink", "https://example.com").external());
        }

        let settings = CompareSettings::default();
        let mut ctx = CompareContext::new(&settings);
        let sources = [&original, &revised];
        let mut parts = NoteParts::new(&sources, &mut ctx);
        let stamp = RevisionStamp::new("Bob", "d");
        let id = parts
            .emit(NoteKind::Footnote, Some(RevisionKind::Inserted), &sources, 1, "1", &stamp, &mut ctx)
            .unwrap();
        assert_eq!(id, "1");

        let footnotes = parts.finish().0.unwrap();
        assert_eq!(footnotes.resources.get("rId1").map(|r| r.target.as_str()), Some("https://example.com"));
        let root = footnotes.doc.root().unwrap();
        let note = footnotes.doc.element_children(root).last().unwrap();
        let xml = serialize_subtree(&footnotes.doc, note).unwrap();
        assert!(xml.contains(r#"<w:hyperlink r:id="rId1"><w:ins"#));
    }

    #[test]
    fn missing_note_is_a_resource_error() {
        let original = tree_with_footnotes(SPECIALS);
        let settings = CompareSettings::default();
        let mut ctx = CompareContext::new(&settings);
        let sources = [&original];
        let mut parts = NoteParts::new(&sources, &mut ctx);
        let err = parts
            .emit(NoteKind::Footnote, None, &sources, 0, "9", &RevisionStamp::new("a", "d"), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, CompareError::Resource { .. }));
    }
}
