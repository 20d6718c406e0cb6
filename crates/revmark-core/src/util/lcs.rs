//! Longest common contiguous run between two hashed sequences.
//!
//! This is not the classic LCS over non-contiguous matches. It finds the
//! single longest run of consecutive items with equal hashes; callers apply it
//! again to the portions before and after the run.

/// Items that can be matched by content hash.
pub trait Hashable {
    fn hash(&self) -> &str;
}

pub type SkipPredicate<'a, T> = &'a dyn Fn(&T) -> bool;

/// Filters applied to the raw longest match.
pub struct LcsSettings<'a, T> {
    /// Items that may not begin a match longer than one item. They are
    /// trimmed from the front of the best run.
    pub skip_as_anchor: Option<SkipPredicate<'a, T>>,
}

impl<T> Default for LcsSettings<'_, T> {
    fn default() -> Self {
        Self { skip_as_anchor: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub i1: usize,
    pub i2: usize,
    pub length: usize,
}

impl MatchResult {
    /// Share of the longer input covered by the match.
    pub fn coverage(&self, len1: usize, len2: usize) -> f64 {
        let max_len = len1.max(len2);
        if max_len == 0 {
            return 0.0;
        }
        self.length as f64 / max_len as f64
    }
}

/// Finds the longest common contiguous run. On ties the earliest `i1`, then
/// the earliest `i2`, wins, so repeated application keeps matches contiguous.
pub fn find_longest_match<T: Hashable>(
    items1: &[T],
    items2: &[T],
    settings: &LcsSettings<'_, T>,
) -> Option<MatchResult> {
    let mut best_length = 0usize;
    let mut best_i1 = 0usize;
    let mut best_i2 = 0usize;

    for i1 in 0..items1.len() {
        // no remaining start position can beat the current best
        if items1.len() - i1 <= best_length {
            break;
        }
        for i2 in 0..items2.len() {
            if items2.len() - i2 <= best_length {
                break;
            }
            let mut match_length = 0usize;
            while i1 + match_length < items1.len()
                && i2 + match_length < items2.len()
                && items1[i1 + match_length].hash() == items2[i2 + match_length].hash()
            {
                match_length += 1;
            }

            if match_length > best_length {
                best_length = match_length;
                best_i1 = i1;
                best_i2 = i2;
            }
        }
    }

    if let Some(skip) = settings.skip_as_anchor {
        while best_length > 1 && skip(&items1[best_i1]) {
            best_i1 += 1;
            best_i2 += 1;
            best_length -= 1;
        }
    }

    if best_length == 0 {
        return None;
    }

    Some(MatchResult {
        i1: best_i1,
        i2: best_i2,
        length: best_length,
    })
}

pub fn common_prefix_len<T: Hashable>(items1: &[T], items2: &[T]) -> usize {
    items1
        .iter()
        .zip(items2.iter())
        .take_while(|(a, b)| a.hash() == b.hash())
        .count()
}

pub fn common_suffix_len<T: Hashable>(items1: &[T], items2: &[T]) -> usize {
    items1
        .iter()
        .rev()
        .zip(items2.iter().rev())
        .take_while(|(a, b)| a.hash() == b.hash())
        .count()
}
