mod atom_list;
mod block_hash;
mod coalesce;
mod comparer;
mod comparison_unit;
mod consolidate;
mod context;
mod document;
mod get_revisions;
mod lcs_algorithm;
mod notes;
mod preprocess;
mod resources;
mod revision;
mod revision_accepter;
mod settings;

pub use atom_list::{create_comparison_unit_atom_list, AtomList};
pub use block_hash::{FingerprintTable, HashScope, NoteHashes, TextNormalizer};
pub use coalesce::{reconstruct, AncestorMap, Link};
pub use comparer::{compare, compare_with_stats};
pub use comparison_unit::{
    get_comparison_unit_list, AncestorInfo, ComparisonUnit, ComparisonUnitAtom, ComparisonUnitGroup,
    ComparisonUnitWord, ContentElement, GroupKind,
};
pub use consolidate::{consolidate, plan_consolidation, ConsolidationEntry, RevisedCopy};
pub use context::{AlignmentStats, CompareContext, PartScope};
pub use document::{Color, DocumentTree, NoteKind, NotesPart, Resource, ResourceTable, Reviewer};
pub use get_revisions::{extract_revisions, Revision};
pub use lcs_algorithm::{correlate, flatten_to_atoms, AlignedAtom, CorrelatedSequence, CorrelationStatus};
pub use preprocess::{check_depth, check_supported, prepare};
pub use resources::{relocate_attributes, relocate_resource, RelocationSource};
pub use revision::{
    count_revisions, is_deletion, is_insertion, is_revision_element, RevisionCounts, RevisionKind, RevisionStamp,
};
pub use revision_accepter::{accept_revisions, reject_revisions};
pub use settings::CompareSettings;
