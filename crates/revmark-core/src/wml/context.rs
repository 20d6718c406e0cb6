//! Per-call mutable state.
//!
//! Every `compare`/`consolidate` call builds a fresh [`CompareContext`], so
//! revision ids, relationship ids and note ids never leak between calls.

use super::comparison_unit::GroupKind;
use super::document::{DocumentTree, ResourceTable};
use super::settings::CompareSettings;
use crate::hash::sha1_hash_bytes;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Counters describing how much work alignment did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignmentStats {
    /// Group pairs whose children were aligned recursively, per kind.
    pub groups_expanded: BTreeMap<GroupKind, usize>,
    /// Cell pairs inside a matched row that had to be aligned.
    pub cells_expanded: usize,
    /// Groups settled as equal by fingerprint alone.
    pub fingerprint_short_circuits: usize,
    pub lcs_invocations: usize,
}

impl AlignmentStats {
    pub fn expanded(&self, kind: GroupKind) -> usize {
        self.groups_expanded.get(&kind).copied().unwrap_or(0)
    }

    pub fn merge(&mut self, other: &AlignmentStats) {
        for (kind, count) in &other.groups_expanded {
            *self.groups_expanded.entry(*kind).or_insert(0) += count;
        }
        self.cells_expanded += other.cells_expanded;
        self.fingerprint_short_circuits += other.fingerprint_short_circuits;
        self.lcs_invocations += other.lcs_invocations;
    }
}

/// Which part a relationship id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartScope {
    Main,
    Footnotes,
    Endnotes,
}

const RESERVED_PARTS: [&str; 3] = ["/word/document.xml", "/word/footnotes.xml", "/word/endnotes.xml"];

pub struct CompareContext<'a> {
    pub settings: &'a CompareSettings,
    pub stats: AlignmentStats,
    next_revision_id: u32,
    next_rel_id: u32,
    next_note_id: u32,
    relocations: HashMap<(usize, PartScope, String), String>,
    /// Part name to SHA-1 of its bytes, for every part the output will hold.
    part_names: HashMap<String, String>,
}

impl<'a> CompareContext<'a> {
    pub fn new(settings: &'a CompareSettings) -> Self {
        let mut part_names = HashMap::new();
        for reserved in RESERVED_PARTS {
            part_names.insert(reserved.to_string(), String::new());
        }
        Self {
            settings,
            stats: AlignmentStats::default(),
            next_revision_id: 1,
            next_rel_id: 1,
            next_note_id: settings.starting_id_for_footnotes_endnotes,
            relocations: HashMap::new(),
            part_names,
        }
    }

    /// Records every part the destination already holds so relocated parts
    /// never overwrite them.
    pub fn register_parts(&mut self, tree: &DocumentTree) {
        self.register_table(&tree.resources);
        for notes in [&tree.footnotes, &tree.endnotes].into_iter().flatten() {
            self.register_table(&notes.resources);
        }
    }

    fn register_table(&mut self, table: &ResourceTable) {
        for resource in table.walk() {
            if let (Some(name), Some(data)) = (&resource.part_name, &resource.data) {
                self.part_names
                    .entry(name.clone())
                    .or_insert_with(|| sha1_hash_bytes(data));
            }
        }
    }

    pub fn next_revision_id(&mut self) -> u32 {
        let id = self.next_revision_id;
        self.next_revision_id += 1;
        id
    }

    /// A relationship id not yet used in `dest`.
    pub fn fresh_rel_id(&mut self, dest: &ResourceTable) -> String {
        loop {
            let candidate = format!("rId{}", self.next_rel_id);
            self.next_rel_id += 1;
            if !dest.contains(&candidate) {
                return candidate;
            }
        }
    }

    pub fn seed_note_ids(&mut self, first: u32) {
        self.next_note_id = self.next_note_id.max(first);
    }

    pub fn next_note_id(&mut self) -> u32 {
        let id = self.next_note_id;
        self.next_note_id += 1;
        id
    }

    pub fn cached_relocation(&self, source: usize, scope: PartScope, id: &str) -> Option<&str> {
        self.relocations
            .get(&(source, scope, id.to_string()))
            .map(String::as_str)
    }

    pub fn remember_relocation(&mut self, source: usize, scope: PartScope, id: &str, new_id: &str) {
        self.relocations
            .insert((source, scope, id.to_string()), new_id.to_string());
    }

    /// Picks the part name a copied part will live at. A part already holding
    /// identical bytes is shared; otherwise `_N` is appended to the stem until
    /// the name is free. The flag is true when the name was newly claimed.
    pub fn claim_part_name(&mut self, desired: &str, data: &[u8]) -> (String, bool) {
        let digest = sha1_hash_bytes(data);
        match self.part_names.get(desired) {
            None => {
                self.part_names.insert(desired.to_string(), digest);
                return (desired.to_string(), true);
            }
            Some(existing) if *existing == digest => return (desired.to_string(), false),
            Some(_) => {}
        }

        let (stem, ext) = split_extension(desired);
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}{}", stem, n, ext);
            match self.part_names.get(&candidate) {
                None => {
                    self.part_names.insert(candidate.clone(), digest);
                    return (candidate, true);
                }
                Some(existing) if *existing == digest => return (candidate, false),
                Some(_) => n += 1,
            }
        }
    }
}

fn split_extension(part_name: &str) -> (&str, &str) {
    let file_start = part_name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match part_name[file_start..].rfind('.') {
        Some(dot) => part_name.split_at(file_start + dot),
        None => (part_name, ""),
    }
}
