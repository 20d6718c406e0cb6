pub mod culture;
pub mod group;
pub mod lcs;

pub use culture::{parse_culture, to_upper_culture, to_upper_invariant, to_upper_langid};
pub use group::group_adjacent;
pub use lcs::{common_prefix_len, common_suffix_len, find_longest_match, Hashable, LcsSettings, MatchResult};
