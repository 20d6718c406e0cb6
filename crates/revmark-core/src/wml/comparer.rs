//! Two-document comparison.

use super::atom_list::create_comparison_unit_atom_list;
use super::coalesce::{reconstruct, AncestorMap};
use super::comparison_unit::{get_comparison_unit_list, ComparisonUnit, ComparisonUnitAtom};
use super::context::{AlignmentStats, CompareContext};
use super::document::DocumentTree;
use super::lcs_algorithm::{correlate, flatten_to_atoms, AlignedAtom};
use super::preprocess::prepare;
use super::revision::RevisionStamp;
use super::settings::CompareSettings;
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, info_span};

/// A prepared document with its atoms and grouped units.
pub(crate) struct Decomposed {
    pub tree: DocumentTree,
    pub atoms: Vec<Arc<ComparisonUnitAtom>>,
    pub units: Vec<ComparisonUnit>,
}

pub(crate) fn decompose(tree: &DocumentTree, source: usize, settings: &CompareSettings) -> Result<Decomposed> {
    let prepared = prepare(tree, settings)?;
    let list = create_comparison_unit_atom_list(&prepared, source, settings)?;
    let units = get_comparison_unit_list(&list.atoms, &prepared.main, settings)?;
    Ok(Decomposed {
        tree: prepared,
        atoms: list.atoms,
        units,
    })
}

/// Aligned atom stream of `revised` against `original`.
pub(crate) fn align(
    original: &Decomposed,
    revised: &Decomposed,
    ctx: &mut CompareContext<'_>,
) -> Result<Vec<AlignedAtom>> {
    let correlated = correlate(&original.units, &revised.units, ctx, 0)?;
    flatten_to_atoms(&correlated)
}

/// Compares `revised` against `original` and returns `original` with the
/// differences marked as tracked insertions and deletions.
///
/// Neither input is modified. Revisions already tracked in either input are
/// accepted before comparing.
pub fn compare(original: &DocumentTree, revised: &DocumentTree, settings: &CompareSettings) -> Result<DocumentTree> {
    compare_with_stats(original, revised, settings).map(|(tree, _)| tree)
}

/// [`compare`], also returning how much alignment work was done.
pub fn compare_with_stats(
    original: &DocumentTree,
    revised: &DocumentTree,
    settings: &CompareSettings,
) -> Result<(DocumentTree, AlignmentStats)> {
    let span = info_span!("compare");
    let _enter = span.enter();

    let left = decompose(original, 0, settings)?;
    let right = decompose(revised, 1, settings)?;

    let mut ctx = CompareContext::new(settings);
    let stream = align(&left, &right, &mut ctx)?;
    let mut map = AncestorMap::new();
    map.learn(&stream);

    let stamp = RevisionStamp::new(
        settings.resolved_author(revised.last_modified_by.as_deref()),
        settings.resolved_date(),
    );
    let result = reconstruct(&[&left.tree, &right.tree], &stream, &map, &mut ctx, &stamp)?;

    debug!(
        original_atoms = left.atoms.len(),
        revised_atoms = right.atoms.len(),
        lcs_invocations = ctx.stats.lcs_invocations,
        fingerprint_short_circuits = ctx.stats.fingerprint_short_circuits,
        cells_expanded = ctx.stats.cells_expanded,
        "compared documents"
    );
    Ok((result, ctx.stats))
}
