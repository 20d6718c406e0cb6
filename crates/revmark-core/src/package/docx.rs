//! Reading and writing `.docx` packages as [`DocumentTree`]s.

use super::content_types::content_type_values;
use super::ooxml::OoxmlPackage;
use super::relationships::{relationship_types, resolve_target, Relationship};
use crate::error::Result;
use crate::wml::{DocumentTree, NoteKind, NotesPart, Resource, ResourceTable};
use tracing::{debug, warn};

const DEFAULT_MAIN_PART: &str = "word/document.xml";

fn note_kind(rel_type: &str) -> Option<NoteKind> {
    match rel_type {
        relationship_types::FOOTNOTES => Some(NoteKind::Footnote),
        relationship_types::ENDNOTES => Some(NoteKind::Endnote),
        _ => None,
    }
}

fn note_rel_type(kind: NoteKind) -> &'static str {
    match kind {
        NoteKind::Footnote => relationship_types::FOOTNOTES,
        NoteKind::Endnote => relationship_types::ENDNOTES,
    }
}

/// Loads the main document part, its notes parts and everything their
/// relationships reach. The package is returned for [`save_document`].
pub fn load_document(bytes: &[u8]) -> Result<(DocumentTree, OoxmlPackage)> {
    let package = OoxmlPackage::open(bytes)?;
    let main_part = package.main_document_part()?;
    let mut tree = DocumentTree::new(package.get_xml_part(&main_part)?)?;

    let mut chain = vec![resolve_target("", &main_part)];
    for rel in package.relationships(&main_part)? {
        if let Some(kind) = note_kind(&rel.rel_type) {
            let part = resolve_target(&main_part, &rel.target);
            let mut notes = NotesPart::new(package.get_xml_part(&part)?, kind)?;
            chain.push(part.clone());
            notes.resources = load_table(&package, &part, &mut chain)?;
            chain.pop();
            match kind {
                NoteKind::Footnote => tree.footnotes = Some(notes),
                NoteKind::Endnote => tree.endnotes = Some(notes),
            }
        } else {
            let resource = load_resource(&package, &main_part, &rel, &mut chain)?;
            tree.resources.insert(resource);
        }
    }
    tree.last_modified_by = package.last_modified_by();

    debug!(
        main_part = main_part.as_str(),
        resources = tree.resources.walk().len(),
        footnotes = tree.footnotes.is_some(),
        endnotes = tree.endnotes.is_some(),
        "loaded document"
    );
    Ok((tree, package))
}

fn load_table(package: &OoxmlPackage, source_part: &str, chain: &mut Vec<String>) -> Result<ResourceTable> {
    let mut table = ResourceTable::new();
    for rel in package.relationships(source_part)? {
        table.insert(load_resource(package, source_part, &rel, chain)?);
    }
    Ok(table)
}

fn load_resource(
    package: &OoxmlPackage,
    source_part: &str,
    rel: &Relationship,
    chain: &mut Vec<String>,
) -> Result<Resource> {
    let resource = Resource::new(&rel.id, &rel.rel_type, &rel.target);
    if rel.is_external() {
        return Ok(resource.external());
    }

    let part_name = resolve_target(source_part, &rel.target);
    let Some(data) = package.get_part(&part_name) else {
        warn!(id = rel.id.as_str(), target = part_name.as_str(), "relationship target is missing");
        return Ok(resource);
    };
    let content_type = package
        .get_content_type(&part_name)
        .unwrap_or("application/octet-stream")
        .to_string();
    let mut resource = resource.with_part(part_name.clone(), content_type, data.to_vec());

    // A part reachable from itself keeps its relationships only once.
    if !chain.contains(&part_name) {
        chain.push(part_name.clone());
        resource.children = load_table(package, &part_name, chain)?;
        chain.pop();
    }
    Ok(resource)
}

/// Writes `tree` over a copy of `package` and returns the archive bytes.
/// Parts of `package` that `tree` does not mention are kept.
pub fn save_document(tree: &DocumentTree, package: &OoxmlPackage) -> Result<Vec<u8>> {
    let mut out = package.clone();
    let main_part = match package.main_document_part() {
        Ok(part) => part,
        Err(_) => {
            let mut root_rels = package.relationships("")?;
            root_rels.push(Relationship::new(
                &free_id(root_rels.iter().map(|r| r.id.as_str())),
                relationship_types::OFFICE_DOCUMENT,
                DEFAULT_MAIN_PART,
            ));
            out.set_relationships("", &root_rels)?;
            DEFAULT_MAIN_PART.to_string()
        }
    };

    out.put_xml_part(&main_part, &tree.main)?;
    out.set_content_type(&main_part, content_type_values::WORD_DOCUMENT);

    let mut main_rels = Vec::new();
    write_table(&mut out, &tree.resources, &mut main_rels)?;

    let existing = package.relationships(&main_part)?;
    for kind in [NoteKind::Footnote, NoteKind::Endnote] {
        let Some(notes) = tree.notes(kind) else { continue };
        let rel_type = note_rel_type(kind);
        let (id, target) = match existing.iter().find(|r| r.rel_type == rel_type) {
            Some(rel) if !tree.resources.contains(&rel.id) => (rel.id.clone(), rel.target.clone()),
            _ => {
                let taken = main_rels.iter().map(|r: &Relationship| r.id.as_str());
                let file = kind.part_path().trim_start_matches("word/").to_string();
                (free_id(taken), file)
            }
        };
        let part = resolve_target(&main_part, &target);
        out.put_xml_part(&part, &notes.doc)?;
        out.set_content_type(
            &part,
            match kind {
                NoteKind::Footnote => content_type_values::WORD_FOOTNOTES,
                NoteKind::Endnote => content_type_values::WORD_ENDNOTES,
            },
        );
        let mut note_rels = Vec::new();
        write_table(&mut out, &notes.resources, &mut note_rels)?;
        out.set_relationships(&part, &note_rels)?;
        main_rels.push(Relationship::new(&id, rel_type, &target));
    }
    out.set_relationships(&main_part, &main_rels)?;

    debug!(main_part = main_part.as_str(), relationships = main_rels.len(), "saved document");
    out.save()
}

fn write_table(out: &mut OoxmlPackage, table: &ResourceTable, rels: &mut Vec<Relationship>) -> Result<()> {
    for resource in table.iter() {
        if resource.external {
            rels.push(Relationship::external(&resource.id, &resource.rel_type, &resource.target));
            continue;
        }
        rels.push(Relationship::new(&resource.id, &resource.rel_type, &resource.target));
        let (Some(part), Some(data)) = (&resource.part_name, &resource.data) else {
            continue;
        };
        out.set_part(part, data.clone());
        if let Some(content_type) = &resource.content_type {
            out.set_content_type(part, content_type);
        }
        if !resource.children.is_empty() {
            let mut child_rels = Vec::new();
            write_table(out, &resource.children, &mut child_rels)?;
            out.set_relationships(part, &child_rels)?;
        }
    }
    Ok(())
}

fn free_id<'a>(taken: impl Iterator<Item = &'a str>) -> String {
    let taken: Vec<&str> = taken.collect();
    (1..)
        .map(|n| format!("rId{}", n))
        .find(|id| !taken.contains(&id.as_str()))
        .unwrap_or_default()
}
