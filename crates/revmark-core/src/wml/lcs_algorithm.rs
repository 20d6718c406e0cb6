//! Alignment of two comparison unit lists.
//!
//! The work list starts as one `Ambiguous` sequence covering both inputs.
//! The first ambiguous entry is repeatedly replaced by its resolution:
//!
//! 1. `process_correlated_hashes` - runs of groups with equal block
//!    fingerprints are settled without looking inside them.
//! 2. `find_common_at_beginning_and_end` - common prefix/suffix by hash.
//! 3. `do_lcs_algorithm` - longest common contiguous run.
//! 4. `handle_no_match_cases` - pairs of containers are expanded and aligned
//!    recursively, lists are flattened, or everything becomes deleted and
//!    inserted.

use super::comparison_unit::{ComparisonUnit, ComparisonUnitAtom, ComparisonUnitGroup, GroupKind};
use super::context::CompareContext;
use crate::error::{CompareError, Result};
use crate::util::lcs::{common_prefix_len, common_suffix_len, find_longest_match, LcsSettings};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrelationStatus {
    #[default]
    Unset,
    Equal,
    Deleted,
    Inserted,
    /// Differing content that still has to be resolved.
    Ambiguous,
    /// Aligned containers; the alignment of their children is in `children`.
    Group,
}

impl fmt::Display for CorrelationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unset => "Unset",
            Self::Equal => "Equal",
            Self::Deleted => "Deleted",
            Self::Inserted => "Inserted",
            Self::Ambiguous => "Ambiguous",
            Self::Group => "Group",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorrelatedSequence {
    pub status: CorrelationStatus,
    /// Units of the original document.
    pub units1: Vec<ComparisonUnit>,
    /// Units of the revised document.
    pub units2: Vec<ComparisonUnit>,
    pub children: Vec<CorrelatedSequence>,
    pub depth: usize,
}

impl CorrelatedSequence {
    pub fn ambiguous(units1: Vec<ComparisonUnit>, units2: Vec<ComparisonUnit>, depth: usize) -> Self {
        Self {
            status: CorrelationStatus::Ambiguous,
            units1,
            units2,
            children: Vec::new(),
            depth,
        }
    }

    pub fn deleted(units1: Vec<ComparisonUnit>, depth: usize) -> Self {
        Self {
            status: CorrelationStatus::Deleted,
            units1,
            units2: Vec::new(),
            children: Vec::new(),
            depth,
        }
    }

    pub fn inserted(units2: Vec<ComparisonUnit>, depth: usize) -> Self {
        Self {
            status: CorrelationStatus::Inserted,
            units1: Vec::new(),
            units2,
            children: Vec::new(),
            depth,
        }
    }

    fn group(unit1: ComparisonUnit, unit2: ComparisonUnit, children: Vec<CorrelatedSequence>, depth: usize) -> Self {
        Self {
            status: CorrelationStatus::Group,
            units1: vec![unit1],
            units2: vec![unit2],
            children,
            depth,
        }
    }
}

/// Equal sequence. Groups settled this way never get expanded.
fn mark_equal(
    units1: Vec<ComparisonUnit>,
    units2: Vec<ComparisonUnit>,
    ctx: &mut CompareContext<'_>,
    depth: usize,
) -> CorrelatedSequence {
    ctx.stats.fingerprint_short_circuits += units1.iter().filter(|u| u.is_group()).count();
    CorrelatedSequence {
        status: CorrelationStatus::Equal,
        units1,
        units2,
        children: Vec::new(),
        depth,
    }
}

/// Whatever is left of both sides after a split point.
fn remainder(units1: &[ComparisonUnit], units2: &[ComparisonUnit], depth: usize) -> Option<CorrelatedSequence> {
    match (units1.is_empty(), units2.is_empty()) {
        (false, true) => Some(CorrelatedSequence::deleted(units1.to_vec(), depth)),
        (true, false) => Some(CorrelatedSequence::inserted(units2.to_vec(), depth)),
        (false, false) => Some(CorrelatedSequence::ambiguous(units1.to_vec(), units2.to_vec(), depth)),
        (true, true) => None,
    }
}

fn is_word_level(units: &[ComparisonUnit]) -> bool {
    units.iter().all(|u| !u.is_group())
}

/// Aligns `units1` (original) against `units2` (revised).
pub fn correlate(
    units1: &[ComparisonUnit],
    units2: &[ComparisonUnit],
    ctx: &mut CompareContext<'_>,
    depth: usize,
) -> Result<Vec<CorrelatedSequence>> {
    let mut cs_list: Vec<CorrelatedSequence> = remainder(units1, units2, depth).into_iter().collect();

    while let Some(idx) = cs_list.iter().position(|cs| cs.status == CorrelationStatus::Ambiguous) {
        let unknown = cs_list.remove(idx);
        let new_sequences = match process_correlated_hashes(&unknown, ctx) {
            Some(found) => found,
            None => match find_common_at_beginning_and_end(&unknown, ctx) {
                Some(found) => found,
                None => do_lcs_algorithm(&unknown, ctx)?,
            },
        };
        cs_list.splice(idx..idx, new_sequences);
    }

    validate(&cs_list)?;
    Ok(cs_list)
}

fn validate(sequences: &[CorrelatedSequence]) -> Result<()> {
    for seq in sequences {
        if matches!(seq.status, CorrelationStatus::Unset | CorrelationStatus::Ambiguous) {
            let unit = seq.units1.first().or_else(|| seq.units2.first());
            return Err(CompareError::invariant(
                unit.map(|u| u.kind_name()).unwrap_or_else(|| "Sequence".to_string()),
                unit.map(|u| u.first_position()).unwrap_or(0),
                format!("sequence left {} after alignment", seq.status),
            ));
        }
    }
    Ok(())
}

fn group_atoms(units: &[ComparisonUnit]) -> usize {
    units.iter().map(|u| u.atom_count()).sum()
}

/// Longest run of equal-fingerprint groups among paragraph, table and row
/// lists.
fn process_correlated_hashes(
    unknown: &CorrelatedSequence,
    ctx: &mut CompareContext<'_>,
) -> Option<Vec<CorrelatedSequence>> {
    let units1 = &unknown.units1;
    let units2 = &unknown.units2;

    if units1.len().min(units2.len()) < 3 {
        return None;
    }

    let block_kind = |u: &ComparisonUnit| {
        matches!(
            u.group_kind(),
            Some(GroupKind::Paragraph | GroupKind::Table | GroupKind::Row)
        )
    };
    if !block_kind(units1.first()?) || !block_kind(units2.first()?) {
        return None;
    }

    let mut best_length = 0usize;
    let mut best_atom_count = 0usize;
    let mut best_i1 = 0usize;
    let mut best_i2 = 0usize;

    for i1 in 0..units1.len() {
        for i2 in 0..units2.len() {
            let mut seq_length = 0usize;
            let mut seq_atom_count = 0usize;
            while let (Some(ComparisonUnit::Group(g1)), Some(ComparisonUnit::Group(g2))) =
                (units1.get(i1 + seq_length), units2.get(i2 + seq_length))
            {
                if !g1.is_identical_to(g2) {
                    break;
                }
                seq_atom_count += g1.atom_count;
                seq_length += 1;
            }

            if seq_length > best_length || (seq_length == best_length && seq_atom_count > best_atom_count) {
                best_length = seq_length;
                best_atom_count = seq_atom_count;
                best_i1 = i1;
                best_i2 = i2;
            }
        }
    }

    let do_correlation = match best_length {
        0 => false,
        1 => units1[best_i1].atom_count() > 16 && units2[best_i2].atom_count() > 16,
        2 | 3 => {
            group_atoms(&units1[best_i1..best_i1 + best_length]) > 32
                && group_atoms(&units2[best_i2..best_i2 + best_length]) > 32
        }
        _ => true,
    };
    if !do_correlation {
        return None;
    }

    trace!(
        depth = unknown.depth,
        i1 = best_i1,
        i2 = best_i2,
        length = best_length,
        "fingerprint run"
    );

    let depth = unknown.depth;
    let end_i1 = best_i1 + best_length;
    let end_i2 = best_i2 + best_length;
    let mut result = Vec::new();
    result.extend(remainder(&units1[..best_i1], &units2[..best_i2], depth));
    result.push(mark_equal(
        units1[best_i1..end_i1].to_vec(),
        units2[best_i2..end_i2].to_vec(),
        ctx,
        depth,
    ));
    result.extend(remainder(&units1[end_i1..], &units2[end_i2..], depth));
    Some(result)
}

fn find_common_at_beginning_and_end(
    unknown: &CorrelatedSequence,
    ctx: &mut CompareContext<'_>,
) -> Option<Vec<CorrelatedSequence>> {
    let units1 = &unknown.units1;
    let units2 = &unknown.units2;
    let depth = unknown.depth;
    let min_ratio = ctx.settings.min_match_ratio();

    let length_to_compare = units1.len().min(units2.len());
    if length_to_compare == 0 {
        return None;
    }
    let word_level = is_word_level(units1) && is_word_level(units2);

    let mut count_common_at_beginning = common_prefix_len(units1, units2);
    if count_common_at_beginning > 0
        && word_level
        && (count_common_at_beginning as f64 / length_to_compare as f64) < min_ratio
    {
        count_common_at_beginning = 0;
    }

    if count_common_at_beginning > 0 {
        let mut result = vec![mark_equal(
            units1[..count_common_at_beginning].to_vec(),
            units2[..count_common_at_beginning].to_vec(),
            ctx,
            depth,
        )];
        result.extend(remainder(
            &units1[count_common_at_beginning..],
            &units2[count_common_at_beginning..],
            depth,
        ));
        return Some(result);
    }

    let mut count_common_at_end = common_suffix_len(units1, units2);

    // never start a common section with a paragraph mark
    while count_common_at_end > 1 && units1[units1.len() - count_common_at_end].is_paragraph_mark() {
        count_common_at_end -= 1;
    }

    let is_only_paragraph_mark =
        count_common_at_end == 1 && units1[units1.len() - 1].is_paragraph_mark();

    if is_only_paragraph_mark {
        // a lone mark only counts when it is all that is left of one side
        if units1.len() != 1 && units2.len() != 1 {
            count_common_at_end = 0;
        }
    } else if count_common_at_end > 0
        && word_level
        && (count_common_at_end as f64 / length_to_compare as f64) < min_ratio
    {
        count_common_at_end = 0;
    }

    if count_common_at_end == 0 {
        return None;
    }

    // When the common end closes a paragraph, the rest of that paragraph on
    // each side is resolved on its own.
    let common_end_start1 = units1.len() - count_common_at_end;
    let common_end_start2 = units2.len() - count_common_at_end;
    let mut remaining_in_left_paragraph = 0usize;
    let mut remaining_in_right_paragraph = 0usize;

    let ends_paragraph = !units1[common_end_start1].is_group()
        && units1[common_end_start1..].iter().any(|u| u.is_paragraph_mark());
    if ends_paragraph {
        let in_paragraph = |u: &&ComparisonUnit| !u.is_group() && !u.is_paragraph_mark();
        remaining_in_left_paragraph = units1[..common_end_start1].iter().rev().take_while(in_paragraph).count();
        remaining_in_right_paragraph = units2[..common_end_start2].iter().rev().take_while(in_paragraph).count();
    }

    let before_left = common_end_start1 - remaining_in_left_paragraph;
    let before_right = common_end_start2 - remaining_in_right_paragraph;

    let mut new_sequence = Vec::new();
    new_sequence.extend(remainder(&units1[..before_left], &units2[..before_right], depth));
    new_sequence.extend(remainder(
        &units1[before_left..common_end_start1],
        &units2[before_right..common_end_start2],
        depth,
    ));
    new_sequence.push(mark_equal(
        units1[common_end_start1..].to_vec(),
        units2[common_end_start2..].to_vec(),
        ctx,
        depth,
    ));
    Some(new_sequence)
}

fn do_lcs_algorithm(unknown: &CorrelatedSequence, ctx: &mut CompareContext<'_>) -> Result<Vec<CorrelatedSequence>> {
    let units1 = &unknown.units1;
    let units2 = &unknown.units2;
    let depth = unknown.depth;
    ctx.stats.lcs_invocations += 1;

    let skip: &dyn Fn(&ComparisonUnit) -> bool = &|u: &ComparisonUnit| u.is_paragraph_mark();
    let lcs_settings = LcsSettings {
        skip_as_anchor: Some(skip),
    };
    let mut best = find_longest_match(units1, units2, &lcs_settings);

    if let Some(m) = best {
        let run = &units1[m.i1..m.i1 + m.length];
        let is_only_paragraph_mark = m.length == 1 && run[0].is_paragraph_mark();

        // don't match only word break characters
        if m.length <= 3 && run.iter().all(|u| u.is_separator_only(ctx.settings)) {
            best = None;
        } else if !is_only_paragraph_mark
            && is_word_level(units1)
            && is_word_level(units2)
            && m.coverage(units1.len(), units2.len()) < ctx.settings.min_match_ratio()
        {
            best = None;
        }
    }

    let Some(m) = best else {
        return handle_no_match_cases(unknown, ctx);
    };

    trace!(depth, i1 = m.i1, i2 = m.i2, length = m.length, "longest common run");

    let end_i1 = m.i1 + m.length;
    let end_i2 = m.i2 + m.length;
    let mut result = Vec::new();
    result.extend(remainder(&units1[..m.i1], &units2[..m.i2], depth));
    result.push(mark_equal(
        units1[m.i1..end_i1].to_vec(),
        units2[m.i2..end_i2].to_vec(),
        ctx,
        depth,
    ));
    result.extend(remainder(&units1[end_i1..], &units2[end_i2..], depth));
    Ok(result)
}

fn deleted_then_inserted(units1: &[ComparisonUnit], units2: &[ComparisonUnit], depth: usize) -> Vec<CorrelatedSequence> {
    vec![
        CorrelatedSequence::deleted(units1.to_vec(), depth),
        CorrelatedSequence::inserted(units2.to_vec(), depth),
    ]
}

/// Replaces paragraph groups (and tables, when `tables` is set) by their
/// children.
fn flatten_one_level(units: &[ComparisonUnit], tables: bool) -> Vec<ComparisonUnit> {
    let mut out = Vec::new();
    for unit in units {
        match unit.as_group() {
            Some(g) if g.kind == GroupKind::Paragraph || (tables && g.kind == GroupKind::Table) => {
                out.extend(g.children.iter().cloned())
            }
            _ => out.push(unit.clone()),
        }
    }
    out
}

fn handle_no_match_cases(unknown: &CorrelatedSequence, ctx: &mut CompareContext<'_>) -> Result<Vec<CorrelatedSequence>> {
    let units1 = &unknown.units1;
    let units2 = &unknown.units2;
    let depth = unknown.depth;

    // one container against one container of the same kind
    if let ([ComparisonUnit::Group(g1)], [ComparisonUnit::Group(g2)]) = (units1.as_slice(), units2.as_slice()) {
        if g1.kind == g2.kind {
            return expand_group_pair(g1, g2, ctx, depth);
        }
    }

    let all_of = |units: &[ComparisonUnit], kinds: &[GroupKind]| {
        units.iter().all(|u| u.group_kind().map(|k| kinds.contains(&k)).unwrap_or(false))
    };
    let any_of = |units: &[ComparisonUnit], kind: GroupKind| units.iter().any(|u| u.group_kind() == Some(kind));

    if all_of(units1, &[GroupKind::Paragraph]) && all_of(units2, &[GroupKind::Paragraph]) {
        trace!(depth, "flattening paragraphs to words");
        return Ok(vec![CorrelatedSequence::ambiguous(
            flatten_one_level(units1, false),
            flatten_one_level(units2, false),
            depth,
        )]);
    }

    let blocks = [GroupKind::Paragraph, GroupKind::Table];
    if all_of(units1, &blocks)
        && all_of(units2, &blocks)
        && (any_of(units1, GroupKind::Table) || any_of(units2, GroupKind::Table))
        && (any_of(units1, GroupKind::Paragraph) || any_of(units2, GroupKind::Paragraph))
    {
        trace!(depth, "flattening mixed tables and paragraphs");
        return Ok(vec![CorrelatedSequence::ambiguous(
            flatten_one_level(units1, true),
            flatten_one_level(units2, true),
            depth,
        )]);
    }

    // several containers of one kind: pair the first ones, the rest stays open
    if let (Some(k1), Some(k2)) = (
        units1.first().and_then(|u| u.group_kind()),
        units2.first().and_then(|u| u.group_kind()),
    ) {
        if k1 == k2 && all_of(units1, &[k1]) && all_of(units2, &[k1]) {
            let mut result = vec![CorrelatedSequence::ambiguous(
                vec![units1[0].clone()],
                vec![units2[0].clone()],
                depth,
            )];
            result.extend(remainder(&units1[1..], &units2[1..], depth));
            return Ok(result);
        }
    }

    // one word against one word: align characters when they share enough
    if let ([w1 @ ComparisonUnit::Word(a)], [w2 @ ComparisonUnit::Word(b)]) = (units1.as_slice(), units2.as_slice()) {
        let atoms1 = w1.split_into_atoms();
        let atoms2 = w2.split_into_atoms();
        let shortest = a.atoms.len().min(b.atoms.len());
        let prefix = common_prefix_len(&atoms1, &atoms2).min(shortest);
        let suffix = common_suffix_len(&atoms1, &atoms2).min(shortest - prefix);
        let longest = a.atoms.len().max(b.atoms.len());
        if (prefix + suffix) * 2 >= longest {
            trace!(depth, prefix, suffix, "aligning word at character level");
            return Ok(vec![CorrelatedSequence::ambiguous(atoms1, atoms2, depth)]);
        }
    }

    Ok(deleted_then_inserted(units1, units2, depth))
}

fn expand_group_pair(
    g1: &Arc<ComparisonUnitGroup>,
    g2: &Arc<ComparisonUnitGroup>,
    ctx: &mut CompareContext<'_>,
    depth: usize,
) -> Result<Vec<CorrelatedSequence>> {
    let child_depth = depth + 1;
    if child_depth > ctx.settings.max_nesting_depth {
        return Err(CompareError::NestingTooDeep {
            limit: ctx.settings.max_nesting_depth,
            stage: "alignment",
        });
    }

    let unit1 = ComparisonUnit::Group(g1.clone());
    let unit2 = ComparisonUnit::Group(g2.clone());

    match g1.kind {
        GroupKind::Table if g1.grid_columns != g2.grid_columns => {
            trace!(depth, "table grids differ");
            return Ok(deleted_then_inserted(&[unit1], &[unit2], depth));
        }
        GroupKind::Row if g1.cell_count() != g2.cell_count() => {
            trace!(depth, "row cell counts differ");
            return Ok(deleted_then_inserted(&[unit1], &[unit2], depth));
        }
        _ => {}
    }

    *ctx.stats.groups_expanded.entry(g1.kind).or_insert(0) += 1;

    let children = if g1.kind == GroupKind::Row && all_cells(g1) && all_cells(g2) {
        correlate_cells(g1, g2, ctx, child_depth)?
    } else {
        correlate(&g1.children, &g2.children, ctx, child_depth)?
    };

    if g1.kind == GroupKind::Paragraph {
        let words = unit1.content_word_count() + unit2.content_word_count();
        let changed = count_changed(&children);
        if words > 0 && (changed as f64 / words as f64) > ctx.settings.detail_threshold {
            trace!(depth, changed, words, "paragraph over detail threshold");
            return Ok(deleted_then_inserted(&[unit1], &[unit2], depth));
        }
    }

    Ok(vec![CorrelatedSequence::group(unit1, unit2, children, depth)])
}

fn all_cells(row: &ComparisonUnitGroup) -> bool {
    row.children.iter().all(|c| c.group_kind() == Some(GroupKind::Cell))
}

/// Cells of two rows with the same cell count, aligned by position.
fn correlate_cells(
    row1: &ComparisonUnitGroup,
    row2: &ComparisonUnitGroup,
    ctx: &mut CompareContext<'_>,
    depth: usize,
) -> Result<Vec<CorrelatedSequence>> {
    let mut result = Vec::with_capacity(row1.children.len());
    for (c1, c2) in row1.children.iter().zip(&row2.children) {
        let (Some(cell1), Some(cell2)) = (c1.as_group(), c2.as_group()) else {
            continue;
        };
        if cell1.is_identical_to(cell2) {
            result.push(mark_equal(vec![c1.clone()], vec![c2.clone()], ctx, depth));
            continue;
        }
        if depth + 1 > ctx.settings.max_nesting_depth {
            return Err(CompareError::NestingTooDeep {
                limit: ctx.settings.max_nesting_depth,
                stage: "alignment",
            });
        }
        ctx.stats.cells_expanded += 1;
        *ctx.stats.groups_expanded.entry(GroupKind::Cell).or_insert(0) += 1;
        let children = correlate(&cell1.children, &cell2.children, ctx, depth + 1)?;
        result.push(CorrelatedSequence::group(c1.clone(), c2.clone(), children, depth));
    }
    Ok(result)
}

/// Changed words below a set of sequences. A character-level change counts
/// as one word.
fn count_changed(sequences: &[CorrelatedSequence]) -> usize {
    let units_changed = |units: &[ComparisonUnit]| {
        if units.iter().all(|u| matches!(u, ComparisonUnit::Atom(_))) {
            usize::from(units.iter().any(|u| !u.is_paragraph_mark()))
        } else {
            units.iter().map(|u| u.content_word_count()).sum()
        }
    };
    sequences
        .iter()
        .map(|seq| match seq.status {
            CorrelationStatus::Deleted => units_changed(&seq.units1),
            CorrelationStatus::Inserted => units_changed(&seq.units2),
            CorrelationStatus::Group => count_changed(&seq.children),
            _ => 0,
        })
        .sum()
}

/// One atom of the aligned stream.
#[derive(Debug, Clone)]
pub struct AlignedAtom {
    pub status: CorrelationStatus,
    /// Original atom for equal and deleted content, revised atom for inserted.
    pub atom: Arc<ComparisonUnitAtom>,
    /// The revised atom an equal atom was matched with.
    pub counterpart: Option<Arc<ComparisonUnitAtom>>,
    /// Author override for consolidated streams.
    pub author: Option<Arc<str>>,
}

impl AlignedAtom {
    pub fn new(status: CorrelationStatus, atom: Arc<ComparisonUnitAtom>) -> Self {
        Self {
            status,
            atom,
            counterpart: None,
            author: None,
        }
    }
}

fn collect_atoms(units: &[ComparisonUnit]) -> Vec<Arc<ComparisonUnitAtom>> {
    units.iter().flat_map(|u| u.atoms()).collect()
}

/// Flattens an alignment tree into one status-tagged atom stream.
pub fn flatten_to_atoms(correlated: &[CorrelatedSequence]) -> Result<Vec<AlignedAtom>> {
    let mut result = Vec::new();
    flatten_into(correlated, &mut result)?;
    Ok(result)
}

fn flatten_into(correlated: &[CorrelatedSequence], result: &mut Vec<AlignedAtom>) -> Result<()> {
    for seq in correlated {
        match seq.status {
            CorrelationStatus::Equal => {
                let atoms1 = collect_atoms(&seq.units1);
                let atoms2 = collect_atoms(&seq.units2);
                if atoms1.len() != atoms2.len() {
                    let unit = &seq.units1[0];
                    return Err(CompareError::invariant(
                        unit.kind_name(),
                        unit.first_position(),
                        format!("equal units hold {} and {} atoms", atoms1.len(), atoms2.len()),
                    ));
                }
                for (a1, a2) in atoms1.into_iter().zip(atoms2) {
                    let mut aligned = AlignedAtom::new(CorrelationStatus::Equal, a1);
                    aligned.counterpart = Some(a2);
                    result.push(aligned);
                }
            }
            CorrelationStatus::Deleted => {
                result.extend(
                    collect_atoms(&seq.units1)
                        .into_iter()
                        .map(|a| AlignedAtom::new(CorrelationStatus::Deleted, a)),
                );
            }
            CorrelationStatus::Inserted => {
                result.extend(
                    collect_atoms(&seq.units2)
                        .into_iter()
                        .map(|a| AlignedAtom::new(CorrelationStatus::Inserted, a)),
                );
            }
            CorrelationStatus::Group => flatten_into(&seq.children, result)?,
            CorrelationStatus::Unset | CorrelationStatus::Ambiguous => {
                let unit = seq.units1.first().or_else(|| seq.units2.first());
                return Err(CompareError::invariant(
                    unit.map(|u| u.kind_name()).unwrap_or_else(|| "Sequence".to_string()),
                    unit.map(|u| u.first_position()).unwrap_or(0),
                    format!("cannot flatten a {} sequence", seq.status),
                ));
            }
        }
    }
    Ok(())
}
