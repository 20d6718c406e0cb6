//! Consolidation of several revised copies of one original.
//!
//! Every copy is compared against the original on its own (in parallel).
//! Each pairwise result is reduced to a list of [`ConsolidationEntry`]
//! values anchored at original atom positions. Identical entries from
//! different reviewers collapse into one, then a single stream is laid out
//! over the original atoms and reconstructed with per-reviewer stamps.

use super::coalesce::{reconstruct, AncestorMap};
use super::comparer::{align, decompose, Decomposed};
use super::comparison_unit::{ComparisonUnitAtom, ContentElement};
use super::context::{AlignmentStats, CompareContext};
use super::document::{Color, DocumentTree, Reviewer};
use super::lcs_algorithm::{AlignedAtom, CorrelationStatus};
use super::revision::{RevisionKind, RevisionStamp};
use super::settings::CompareSettings;
use crate::error::Result;
use crate::hash::Sha1Accumulator;
use crate::util::group::group_adjacent;
use crate::xml::arena::XmlDocument;
use crate::xml::builder::serialize_subtree;
use crate::xml::namespaces::{W, XML};
use crate::xml::node::XmlNodeData;
use crate::xml::xname::XAttribute;
use indextree::NodeId;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info_span};

/// One reviewer's copy of the original.
#[derive(Debug, Clone)]
pub struct RevisedCopy {
    pub document: DocumentTree,
    pub author: String,
    pub color: Color,
}

impl RevisedCopy {
    pub fn new(document: DocumentTree, author: impl Into<String>, color: Color) -> Self {
        Self {
            document,
            author: author.into(),
            color,
        }
    }

    fn reviewer(&self) -> Reviewer {
        Reviewer {
            name: self.author.clone(),
            color: self.color,
        }
    }
}

/// A deletion of original atoms `start..end`, or an insertion before
/// original atom `start` (with `start == end`).
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationEntry {
    pub kind: RevisionKind,
    pub insert_before: bool,
    pub start: usize,
    pub end: usize,
    /// Digest of the kind and the atom hashes the entry covers.
    pub fingerprint: String,
    pub text: String,
    /// Every contributing author, sorted.
    pub authors: Vec<String>,
    /// Color of the first author.
    pub color: Color,
    /// Run markup of the changed content.
    pub fragment: String,
    /// Note references inside the change, as `footnote:<id>`/`endnote:<id>`.
    pub notes: Vec<String>,
    #[serde(skip)]
    contributors: Vec<Reviewer>,
    /// Inserted atoms, taken from the first contributor's copy.
    #[serde(skip)]
    pub(crate) atoms: Vec<Arc<ComparisonUnitAtom>>,
}

impl ConsolidationEntry {
    fn new(
        kind: RevisionKind,
        (start, end): (usize, usize),
        run: &[AlignedAtom],
        doc: &XmlDocument,
        reviewer: &Reviewer,
    ) -> Result<Self> {
        let mut acc = Sha1Accumulator::new();
        acc.push_str(&kind.to_string());
        for aligned in run {
            acc.push_str(&aligned.atom.hash);
        }
        let notes = run
            .iter()
            .filter_map(|a| match &a.atom.content {
                ContentElement::NoteReference { kind, id } => Some(format!("{}:{}", kind, id)),
                _ => None,
            })
            .collect();
        Ok(Self {
            kind,
            insert_before: kind == RevisionKind::Inserted,
            start,
            end,
            fingerprint: acc.finish(),
            text: run.iter().filter_map(|a| a.atom.content.text_value()).collect(),
            authors: vec![reviewer.name.clone()],
            color: reviewer.color,
            fragment: run_fragment(doc, run)?,
            notes,
            contributors: vec![reviewer.clone()],
            atoms: match kind {
                RevisionKind::Inserted => run.iter().map(|a| a.atom.clone()).collect(),
                RevisionKind::Deleted => Vec::new(),
            },
        })
    }

    /// Author names joined with `", "`.
    pub fn author_label(&self) -> String {
        self.authors.join(", ")
    }

    pub fn contributors(&self) -> &[Reviewer] {
        &self.contributors
    }

    fn absorb(&mut self, other: ConsolidationEntry) {
        let replaces_first = match (other.contributors.first(), self.contributors.first()) {
            (Some(theirs), Some(ours)) => reviewer_order(theirs, ours).is_lt(),
            _ => false,
        };
        if replaces_first {
            self.atoms = other.atoms;
            self.fragment = other.fragment;
            self.notes = other.notes;
        }
        self.contributors.extend(other.contributors);
        self.contributors.sort_by(reviewer_order);
        self.contributors.dedup();
        self.authors = self.contributors.iter().map(|r| r.name.clone()).collect();
        if let Some(first) = self.contributors.first() {
            self.color = first.color;
        }
    }
}

fn reviewer_order(a: &Reviewer, b: &Reviewer) -> std::cmp::Ordering {
    a.name.cmp(&b.name).then(a.color.cmp(&b.color))
}

fn owning_run(atom: &ComparisonUnitAtom) -> Option<NodeId> {
    atom.ancestors.iter().rev().find(|a| a.local_name == "r").map(|a| a.node)
}

/// One `w:r` per source run: its `rPr`, the changed text and any whole
/// elements. Paragraph marks have no run and add nothing.
fn run_fragment(doc: &XmlDocument, run: &[AlignedAtom]) -> Result<String> {
    let mut fragment = String::new();
    for (run_node, atoms) in group_adjacent(run, |a| owning_run(&a.atom)) {
        let Some(run_node) = run_node else { continue };
        let mut scratch = XmlDocument::new();
        let r = scratch.add_root(XmlNodeData::element(W::r()));
        if let Some(rpr) = doc.first_child_named(run_node, &W::rPr()) {
            scratch.import_subtree(doc, rpr, Some(r));
        }
        let mut text = String::new();
        for aligned in atoms {
            match &aligned.atom.content {
                ContentElement::Text(c) => text.push(*c),
                _ => {
                    flush_text(&mut scratch, r, &mut text);
                    scratch.import_subtree(doc, aligned.atom.node, Some(r));
                }
            }
        }
        flush_text(&mut scratch, r, &mut text);
        fragment.push_str(&serialize_subtree(&scratch, r)?);
    }
    Ok(fragment)
}

fn flush_text(scratch: &mut XmlDocument, r: NodeId, text: &mut String) {
    if text.is_empty() {
        return;
    }
    let t = scratch.add_child(
        r,
        XmlNodeData::element_with_attrs(W::t(), vec![XAttribute::new(XML::space(), "preserve")]),
    );
    scratch.add_child(t, XmlNodeData::text(text));
    text.clear();
}

/// Everything the merge step needs.
struct Plan {
    original: Decomposed,
    copies: Vec<DocumentTree>,
    entries: Vec<ConsolidationEntry>,
    map: AncestorMap,
    stats: AlignmentStats,
}

struct PairResult {
    tree: DocumentTree,
    entries: Vec<ConsolidationEntry>,
    map: AncestorMap,
    stats: AlignmentStats,
}

/// Entries of one pairwise stream. Insertions are anchored at the position
/// of the next original atom.
fn pair_entries(
    stream: &[AlignedAtom],
    original: &DocumentTree,
    revised: &DocumentTree,
    reviewer: &Reviewer,
) -> Result<Vec<ConsolidationEntry>> {
    let mut entries = Vec::new();
    let mut next_original = 0usize;
    for (status, run) in group_adjacent(stream, |a| a.status) {
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            continue;
        };
        match status {
            CorrelationStatus::Inserted => {
                let span = (next_original, next_original);
                entries.push(ConsolidationEntry::new(RevisionKind::Inserted, span, run, &revised.main, reviewer)?);
            }
            CorrelationStatus::Deleted => {
                let span = (first.atom.position, last.atom.position + 1);
                entries.push(ConsolidationEntry::new(RevisionKind::Deleted, span, run, &original.main, reviewer)?);
                next_original = span.1;
            }
            _ => next_original = last.atom.position + 1,
        }
    }
    Ok(entries)
}

fn compare_copy(original: &Decomposed, copy: &RevisedCopy, source: usize, settings: &CompareSettings) -> Result<PairResult> {
    let revised = decompose(&copy.document, source, settings)?;
    let mut ctx = CompareContext::new(settings);
    let stream = align(original, &revised, &mut ctx)?;
    let mut map = AncestorMap::new();
    map.learn(&stream);
    let entries = pair_entries(&stream, &original.tree, &revised.tree, &copy.reviewer())?;
    debug!(
        author = copy.author.as_str(),
        entries = entries.len(),
        lcs_invocations = ctx.stats.lcs_invocations,
        "compared copy"
    );
    Ok(PairResult {
        tree: revised.tree,
        entries,
        map,
        stats: ctx.stats,
    })
}

fn build_plan(original: &DocumentTree, copies: &[RevisedCopy], settings: &CompareSettings) -> Result<Plan> {
    let original = decompose(original, 0, settings)?;

    let pairs: Vec<PairResult> = copies
        .par_iter()
        .enumerate()
        .map(|(i, copy)| compare_copy(&original, copy, i + 1, settings))
        .collect::<Result<Vec<_>>>()?;

    let mut merged: BTreeMap<(RevisionKind, usize, usize, String), ConsolidationEntry> = BTreeMap::new();
    let mut map = AncestorMap::new();
    let mut stats = AlignmentStats::default();
    let mut trees = Vec::with_capacity(pairs.len());
    for pair in pairs {
        for entry in pair.entries {
            let key = (entry.kind, entry.start, entry.end, entry.fingerprint.clone());
            match merged.get_mut(&key) {
                Some(existing) => existing.absorb(entry),
                None => {
                    merged.insert(key, entry);
                }
            }
        }
        map.merge(pair.map);
        stats.merge(&pair.stats);
        trees.push(pair.tree);
    }

    let mut entries: Vec<ConsolidationEntry> = merged.into_values().collect();
    entries.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(a.kind.cmp(&b.kind))
            .then_with(|| a.authors.cmp(&b.authors))
            .then(a.color.cmp(&b.color))
            .then_with(|| a.fingerprint.cmp(&b.fingerprint))
            .then(a.end.cmp(&b.end))
    });

    Ok(Plan {
        original,
        copies: trees,
        entries,
        map,
        stats,
    })
}

/// The deduplicated revisions `consolidate` would apply, ordered by
/// position with insertions first.
pub fn plan_consolidation(
    original: &DocumentTree,
    copies: &[RevisedCopy],
    settings: &CompareSettings,
) -> Result<Vec<ConsolidationEntry>> {
    Ok(build_plan(original, copies, settings)?.entries)
}

/// One stream over the original atoms: insertions anchored at a position
/// come before the atom at that position.
fn merged_stream(atoms: &[Arc<ComparisonUnitAtom>], entries: &[ConsolidationEntry]) -> Vec<AlignedAtom> {
    let mut deleted_by: Vec<Vec<&str>> = vec![Vec::new(); atoms.len()];
    let mut insertions: BTreeMap<usize, Vec<&ConsolidationEntry>> = BTreeMap::new();
    for entry in entries {
        match entry.kind {
            RevisionKind::Deleted => {
                for covered in deleted_by.iter_mut().take(entry.end).skip(entry.start) {
                    covered.extend(entry.authors.iter().map(String::as_str));
                }
            }
            RevisionKind::Inserted => insertions.entry(entry.start).or_default().push(entry),
        }
    }

    let mut stream = Vec::with_capacity(atoms.len());
    for position in 0..=atoms.len() {
        for entry in insertions.get(&position).into_iter().flatten() {
            let author: Arc<str> = Arc::from(entry.author_label());
            for atom in &entry.atoms {
                let mut aligned = AlignedAtom::new(CorrelationStatus::Inserted, atom.clone());
                aligned.author = Some(author.clone());
                stream.push(aligned);
            }
        }
        let Some(atom) = atoms.get(position) else {
            continue;
        };
        let names = &mut deleted_by[position];
        if names.is_empty() {
            stream.push(AlignedAtom::new(CorrelationStatus::Equal, atom.clone()));
        } else {
            names.sort_unstable();
            names.dedup();
            let mut aligned = AlignedAtom::new(CorrelationStatus::Deleted, atom.clone());
            aligned.author = Some(Arc::from(names.join(", ")));
            stream.push(aligned);
        }
    }
    stream
}

/// Merges the revisions of every copy into one document.
///
/// The result does not depend on the order of `copies`. Any failing pair
/// fails the whole call.
pub fn consolidate(original: &DocumentTree, copies: &[RevisedCopy], settings: &CompareSettings) -> Result<DocumentTree> {
    let span = info_span!("consolidate", copies = copies.len());
    let _enter = span.enter();

    let plan = build_plan(original, copies, settings)?;
    let stream = merged_stream(&plan.original.atoms, &plan.entries);

    let sources: Vec<&DocumentTree> = std::iter::once(&plan.original.tree).chain(plan.copies.iter()).collect();
    let mut ctx = CompareContext::new(settings);
    let stamp = RevisionStamp::new(
        settings.resolved_author(original.last_modified_by.as_deref()),
        settings.resolved_date(),
    );
    let mut result = reconstruct(&sources, &stream, &plan.map, &mut ctx, &stamp)?;

    let mut reviewers: Vec<Reviewer> = copies.iter().map(RevisedCopy::reviewer).collect();
    reviewers.sort_by(reviewer_order);
    reviewers.dedup();
    result.reviewers = reviewers;

    debug!(
        entries = plan.entries.len(),
        lcs_invocations = plan.stats.lcs_invocations,
        fingerprint_short_circuits = plan.stats.fingerprint_short_circuits,
        "consolidated copies"
    );
    Ok(result)
}
