//! Structural comparison of WordprocessingML documents.
//!
//! [`compare`] marks the differences between two documents as tracked
//! insertions and deletions, [`consolidate`] merges several reviewed copies
//! of one original into a single multi-author redline and
//! [`extract_revisions`] lists the tracked changes of any document.
//! The [`package`] module reads and writes `.docx` archives.

pub mod error;
pub mod hash;
pub mod package;
pub mod util;
pub mod wml;
pub mod xml;

pub use error::{CompareError, Result};

pub use wml::{
    accept_revisions, compare, compare_with_stats, consolidate, extract_revisions, plan_consolidation,
    reject_revisions, AlignmentStats, Color, CompareSettings, ConsolidationEntry, DocumentTree, RevisedCopy,
    Reviewer, Revision, RevisionKind,
};
