//! Comparison unit hierarchy.
//!
//! - [`ComparisonUnitAtom`]: one character, one run-level element, one note
//!   reference or one paragraph mark, with its ancestor chain.
//! - [`ComparisonUnitWord`]: consecutive atoms of one word.
//! - [`ComparisonUnitGroup`]: a paragraph, table, row, cell or text box with
//!   its child units and block fingerprint.
//!
//! Units are shared through `Arc`, so lists can be sliced and re-aligned
//! without copying atoms.

use super::document::NoteKind;
use super::settings::CompareSettings;
use crate::error::{CompareError, Result};
use crate::hash::Sha1Accumulator;
use crate::util::group::group_adjacent;
use crate::util::lcs::Hashable;
use crate::xml::arena::XmlDocument;
use crate::xml::namespaces::W;
use indextree::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupKind {
    Paragraph,
    Table,
    Row,
    Cell,
    Textbox,
}

impl GroupKind {
    pub fn from_local_name(local: &str) -> Option<Self> {
        match local {
            "p" => Some(Self::Paragraph),
            "tbl" => Some(Self::Table),
            "tr" => Some(Self::Row),
            "tc" => Some(Self::Cell),
            "txbxContent" => Some(Self::Textbox),
            _ => None,
        }
    }

    pub fn local_name(self) -> &'static str {
        match self {
            Self::Paragraph => "p",
            Self::Table => "tbl",
            Self::Row => "tr",
            Self::Cell => "tc",
            Self::Textbox => "txbxContent",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Paragraph => "Paragraph",
            Self::Table => "Table",
            Self::Row => "Row",
            Self::Cell => "Cell",
            Self::Textbox => "Textbox",
        };
        write!(f, "{}", name)
    }
}

/// One element on the path from the body down to an atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorInfo {
    pub node: NodeId,
    pub local_name: String,
    /// Set for grouping containers (p, tbl, tr, tc, txbxContent).
    pub kind: Option<GroupKind>,
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentElement {
    Text(char),
    /// A run-level element compared as a whole (break, tab, drawing, field
    /// char, math, ...).
    Element { local_name: String },
    NoteReference { kind: NoteKind, id: String },
    ParagraphMark,
}

impl ContentElement {
    /// Visible text of the atom, as used in revision text.
    pub fn text_value(&self) -> Option<char> {
        match self {
            Self::Text(c) => Some(*c),
            Self::Element { local_name } => match local_name.as_str() {
                "tab" | "ptab" => Some('\t'),
                "br" | "cr" => Some('\n'),
                _ => None,
            },
            Self::ParagraphMark => Some('\n'),
            Self::NoteReference { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComparisonUnitAtom {
    pub content: ContentElement,
    /// Index of the document the atom was decomposed from.
    pub source: usize,
    pub node: NodeId,
    /// Outermost first. Paragraph marks include their own `p`.
    pub ancestors: Arc<[AncestorInfo]>,
    pub hash: String,
    pub position: usize,
}

impl ComparisonUnitAtom {
    pub fn is_paragraph_mark(&self) -> bool {
        matches!(self.content, ContentElement::ParagraphMark)
    }

    /// Grouping containers of this atom, outermost first.
    pub fn grouping_chain(&self) -> impl Iterator<Item = &AncestorInfo> {
        self.ancestors.iter().filter(|a| a.kind.is_some())
    }

    fn innermost_group(&self) -> Option<NodeId> {
        self.ancestors.iter().rev().find(|a| a.kind.is_some()).map(|a| a.node)
    }
}

impl Hashable for ComparisonUnitAtom {
    fn hash(&self) -> &str {
        &self.hash
    }
}

#[derive(Debug, Clone)]
pub struct ComparisonUnitWord {
    pub atoms: Vec<Arc<ComparisonUnitAtom>>,
    pub hash: String,
}

impl ComparisonUnitWord {
    pub fn new(atoms: Vec<Arc<ComparisonUnitAtom>>) -> Self {
        let mut acc = Sha1Accumulator::new();
        for atom in &atoms {
            acc.push_str(&atom.hash);
        }
        Self {
            atoms,
            hash: acc.finish(),
        }
    }

    pub fn is_paragraph_mark(&self) -> bool {
        self.atoms.len() == 1 && self.atoms[0].is_paragraph_mark()
    }

    pub fn text(&self) -> String {
        self.atoms.iter().filter_map(|a| a.content.text_value()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct ComparisonUnitGroup {
    pub kind: GroupKind,
    pub node: NodeId,
    pub fingerprint: String,
    pub children: Vec<ComparisonUnit>,
    pub atom_count: usize,
    /// Column count of a table's grid.
    pub grid_columns: Option<usize>,
}

impl ComparisonUnitGroup {
    /// Identical subtrees share a fingerprint.
    pub fn is_identical_to(&self, other: &ComparisonUnitGroup) -> bool {
        self.kind == other.kind && self.fingerprint == other.fingerprint
    }

    /// Number of child cells of a row.
    pub fn cell_count(&self) -> usize {
        self.children
            .iter()
            .filter(|c| matches!(c, ComparisonUnit::Group(g) if g.kind == GroupKind::Cell))
            .count()
    }
}

impl Hashable for ComparisonUnitGroup {
    fn hash(&self) -> &str {
        &self.fingerprint
    }
}

#[derive(Debug, Clone)]
pub enum ComparisonUnit {
    Atom(Arc<ComparisonUnitAtom>),
    Word(Arc<ComparisonUnitWord>),
    Group(Arc<ComparisonUnitGroup>),
}

impl Hashable for ComparisonUnit {
    fn hash(&self) -> &str {
        match self {
            Self::Atom(a) => &a.hash,
            Self::Word(w) => &w.hash,
            Self::Group(g) => &g.fingerprint,
        }
    }
}

impl ComparisonUnit {
    pub fn as_group(&self) -> Option<&Arc<ComparisonUnitGroup>> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn group_kind(&self) -> Option<GroupKind> {
        self.as_group().map(|g| g.kind)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    pub fn is_paragraph_mark(&self) -> bool {
        match self {
            Self::Atom(a) => a.is_paragraph_mark(),
            Self::Word(w) => w.is_paragraph_mark(),
            Self::Group(_) => false,
        }
    }

    /// A word made only of separator characters.
    pub fn is_separator_only(&self, settings: &CompareSettings) -> bool {
        let atoms: &[Arc<ComparisonUnitAtom>] = match self {
            Self::Word(w) => &w.atoms,
            Self::Atom(a) => std::slice::from_ref(a),
            Self::Group(_) => return false,
        };
        !atoms.is_empty()
            && atoms
                .iter()
                .all(|a| matches!(a.content, ContentElement::Text(c) if settings.is_word_separator(c)))
    }

    pub fn atom_count(&self) -> usize {
        match self {
            Self::Atom(_) => 1,
            Self::Word(w) => w.atoms.len(),
            Self::Group(g) => g.atom_count,
        }
    }

    /// Every atom below this unit in document order.
    pub fn atoms(&self) -> Vec<Arc<ComparisonUnitAtom>> {
        let mut out = Vec::with_capacity(self.atom_count());
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms(&self, out: &mut Vec<Arc<ComparisonUnitAtom>>) {
        match self {
            Self::Atom(a) => out.push(a.clone()),
            Self::Word(w) => out.extend(w.atoms.iter().cloned()),
            Self::Group(g) => {
                for child in &g.children {
                    child.collect_atoms(out);
                }
            }
        }
    }

    /// Number of words below this unit, excluding paragraph marks.
    pub fn content_word_count(&self) -> usize {
        match self {
            Self::Atom(a) => usize::from(!a.is_paragraph_mark()),
            Self::Word(w) => usize::from(!w.is_paragraph_mark()),
            Self::Group(g) => g.children.iter().map(|c| c.content_word_count()).sum(),
        }
    }

    pub fn kind_name(&self) -> String {
        match self {
            Self::Atom(_) => "Atom".to_string(),
            Self::Word(_) => "Word".to_string(),
            Self::Group(g) => g.kind.to_string(),
        }
    }

    /// Position of the first atom, for error reports.
    pub fn first_position(&self) -> usize {
        match self {
            Self::Atom(a) => a.position,
            Self::Word(w) => w.atoms.first().map(|a| a.position).unwrap_or(0),
            Self::Group(g) => g.children.first().map(|c| c.first_position()).unwrap_or(0),
        }
    }

    /// Splits a word into its atoms; other units are returned unchanged.
    pub fn split_into_atoms(&self) -> Vec<ComparisonUnit> {
        match self {
            Self::Word(w) => w.atoms.iter().cloned().map(ComparisonUnit::Atom).collect(),
            other => vec![other.clone()],
        }
    }

    pub fn text(&self) -> String {
        self.atoms().iter().filter_map(|a| a.content.text_value()).collect()
    }
}

/// Builds the word and group hierarchy for one atom sequence. `doc` is the
/// document the atoms came from.
pub fn get_comparison_unit_list(
    atoms: &[Arc<ComparisonUnitAtom>],
    doc: &XmlDocument,
    settings: &CompareSettings,
) -> Result<Vec<ComparisonUnit>> {
    if atoms.is_empty() {
        return Ok(Vec::new());
    }
    let keys = assign_grouping_keys(atoms, settings);
    let words: Vec<Arc<ComparisonUnitWord>> = group_adjacent(
        &atoms.iter().zip(keys).collect::<Vec<_>>(),
        |(_, key)| *key,
    )
    .into_iter()
    .map(|(_, members)| Arc::new(ComparisonUnitWord::new(members.iter().map(|(a, _)| (*a).clone()).collect())))
    .collect();

    get_hierarchical_comparison_units(&words, 0, doc, settings.max_nesting_depth)
}

/// Word keys: atoms sharing a key form one word.
fn assign_grouping_keys(atoms: &[Arc<ComparisonUnitAtom>], settings: &CompareSettings) -> Vec<usize> {
    let mut result = Vec::with_capacity(atoms.len());
    let mut next_index = 0usize;
    let mut previous_group: Option<Option<NodeId>> = None;

    let is_digit_at = |i: Option<usize>| {
        i.and_then(|i| atoms.get(i))
            .map(|a| matches!(a.content, ContentElement::Text(c) if c.is_ascii_digit()))
            .unwrap_or(false)
    };

    for (i, atom) in atoms.iter().enumerate() {
        let group = atom.innermost_group();
        if previous_group.is_some_and(|g| g != group) {
            next_index += 1;
        }
        previous_group = Some(group);

        let stands_alone = match atom.content {
            // "1,000.50" stays one word
            ContentElement::Text('.' | ',') => !(is_digit_at(i.checked_sub(1)) && is_digit_at(Some(i + 1))),
            ContentElement::Text(ch) => is_chinese_character(ch) || settings.is_word_separator(ch),
            _ => true,
        };

        if stands_alone {
            next_index += 1;
            result.push(next_index);
            next_index += 1;
        } else {
            result.push(next_index);
        }
    }

    result
}

fn is_chinese_character(ch: char) -> bool {
    (0x4e00..=0x9fff).contains(&(ch as u32))
}

/// Grouping ancestor of a word at `level`, taken from its first atom.
fn hierarchy_key(word: &ComparisonUnitWord, level: usize) -> Option<(NodeId, GroupKind, String)> {
    let atom = word.atoms.first()?;
    let info = atom.grouping_chain().nth(level)?;
    Some((info.node, info.kind?, info.fingerprint.clone().unwrap_or_default()))
}

fn get_hierarchical_comparison_units(
    words: &[Arc<ComparisonUnitWord>],
    level: usize,
    doc: &XmlDocument,
    max_depth: usize,
) -> Result<Vec<ComparisonUnit>> {
    if level > max_depth {
        return Err(CompareError::NestingTooDeep {
            limit: max_depth,
            stage: "grouping",
        });
    }

    let mut result = Vec::new();
    for (key, members) in group_adjacent(words, |w| hierarchy_key(w, level)) {
        match key {
            None => result.extend(members.iter().cloned().map(ComparisonUnit::Word)),
            Some((node, kind, fingerprint)) => {
                let children = get_hierarchical_comparison_units(members, level + 1, doc, max_depth)?;
                let atom_count = children.iter().map(|c| c.atom_count()).sum();
                if atom_count == 0 {
                    return Err(CompareError::invariant(kind.to_string(), level, "group has no atoms"));
                }
                let grid_columns = (kind == GroupKind::Table).then(|| grid_column_count(doc, node));
                result.push(ComparisonUnit::Group(Arc::new(ComparisonUnitGroup {
                    kind,
                    node,
                    fingerprint,
                    children,
                    atom_count,
                    grid_columns,
                })));
            }
        }
    }
    Ok(result)
}

fn grid_column_count(doc: &XmlDocument, table: NodeId) -> usize {
    doc.first_child_named(table, &W::tblGrid())
        .map(|grid| doc.elements_by_name(grid, &W::gridCol()).count())
        .unwrap_or(0)
}
