use serde::{Deserialize, Serialize};

/// Settings for a comparison or consolidation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareSettings {
    /// Characters that separate words for comparison purposes.
    /// Default includes space, punctuation, currency symbols and CJK punctuation.
    pub word_separators: Vec<char>,

    /// Author name for tracked revisions. If None, the revised document's
    /// `lastModifiedBy` is used, then "Unknown".
    pub author_for_revisions: Option<String>,

    /// Date/time for tracked revisions in ISO 8601 format. If None, the time
    /// of the call is used.
    pub date_time_for_revisions: Option<String>,

    /// Maximum fraction of changed words (0.0-1.0) a paragraph pair may have
    /// before it is shown as one deleted and one inserted paragraph. The
    /// complement is the minimum share a common run must cover to count.
    pub detail_threshold: f64,

    /// Whether to perform case-insensitive comparison.
    pub case_insensitive: bool,

    /// Locale used to upper-case text when comparing case-insensitively
    /// (e.g. "tr-TR"). None means locale-neutral mapping.
    pub culture_info: Option<String>,

    /// Whether to treat breaking and non-breaking spaces as equivalent.
    pub conflate_breaking_and_nonbreaking_spaces: bool,

    /// Lowest id given to renumbered footnotes and endnotes.
    pub starting_id_for_footnotes_endnotes: u32,

    /// Deepest element nesting accepted before the call fails.
    pub max_nesting_depth: usize,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            word_separators: vec![
                ' ', '-', ')', '(', ';', ',',
                // "$100" vs "$200" shows "$" as equal, only the number changed
                '$', '€', '£', '¥', '¢', '₹', '₽', '₩', '₪', '฿',
                '（', // U+FF08 FULLWIDTH LEFT PARENTHESIS
                '）', // U+FF09 FULLWIDTH RIGHT PARENTHESIS
                '，', // U+FF0C FULLWIDTH COMMA
                '、', // U+3001 IDEOGRAPHIC COMMA
                '；', // U+FF1B FULLWIDTH SEMICOLON
                '。', // U+3002 IDEOGRAPHIC FULL STOP
                '：', // U+FF1A FULLWIDTH COLON
                '的', // U+7684 possessive particle
            ],
            author_for_revisions: None,
            date_time_for_revisions: None,
            detail_threshold: 0.85,
            case_insensitive: false,
            culture_info: None,
            conflate_breaking_and_nonbreaking_spaces: true,
            starting_id_for_footnotes_endnotes: 1,
            max_nesting_depth: 64,
        }
    }
}

impl CompareSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author_for_revisions = Some(author.into());
        self
    }

    pub fn with_date_time(mut self, date_time: impl Into<String>) -> Self {
        self.date_time_for_revisions = Some(date_time.into());
        self
    }

    pub fn with_detail_threshold(mut self, threshold: f64) -> Self {
        self.detail_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn with_culture_info(mut self, culture: impl Into<String>) -> Self {
        self.culture_info = Some(culture.into());
        self
    }

    pub fn with_conflated_spaces(mut self, conflate: bool) -> Self {
        self.conflate_breaking_and_nonbreaking_spaces = conflate;
        self
    }

    pub fn with_starting_note_id(mut self, id: u32) -> Self {
        self.starting_id_for_footnotes_endnotes = id;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn is_word_separator(&self, c: char) -> bool {
        self.word_separators.contains(&c)
    }

    /// Minimum share of the longer side a common run must cover.
    pub fn min_match_ratio(&self) -> f64 {
        (1.0 - self.detail_threshold).clamp(0.0, 1.0)
    }

    /// Timestamp stamped on revision marks.
    pub(crate) fn resolved_date(&self) -> String {
        self.date_time_for_revisions
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string())
    }

    /// Author stamped on revision marks: explicit setting, then the revised
    /// document's last editor, then "Unknown".
    pub(crate) fn resolved_author(&self, last_modified_by: Option<&str>) -> String {
        self.author_for_revisions
            .clone()
            .or_else(|| {
                last_modified_by
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_have_expected_values() {
        let settings = CompareSettings::default();

        assert!(!settings.case_insensitive);
        assert!(settings.conflate_breaking_and_nonbreaking_spaces);
        assert!((settings.detail_threshold - 0.85).abs() < f64::EPSILON);
        assert!((settings.min_match_ratio() - 0.15).abs() < 1e-9);
        assert_eq!(settings.starting_id_for_footnotes_endnotes, 1);
        assert_eq!(settings.max_nesting_depth, 64);
        assert!(settings.author_for_revisions.is_none());
        assert!(settings.culture_info.is_none());

        assert!(settings.word_separators.contains(&' '));
        assert!(settings.word_separators.contains(&'（'));
        assert!(settings.word_separators.contains(&'$'));
        assert_eq!(settings.word_separators.len(), 24);
    }

    #[test]
    fn builder_pattern_works() {
        let settings = CompareSettings::new()
            .with_author("Test Author")
            .with_case_insensitive(true)
            .with_culture_info("en-US")
            .with_date_time("2025-12-28T12:00:00Z")
            .with_detail_threshold(1.5);

        assert_eq!(settings.author_for_revisions.as_deref(), Some("Test Author"));
        assert!(settings.case_insensitive);
        assert_eq!(settings.culture_info.as_deref(), Some("en-US"));
        assert_eq!(settings.resolved_date(), "2025-12-28T12:00:00Z");
        assert_eq!(settings.detail_threshold, 1.0);
    }

    #[test]
    fn author_falls_back_to_last_editor_then_unknown() {
        let settings = CompareSettings::default();
        assert_eq!(settings.resolved_author(Some("Dana")), "Dana");
        assert_eq!(settings.resolved_author(Some("  ")), "Unknown");
        assert_eq!(settings.resolved_author(None), "Unknown");
        assert_eq!(settings.with_author("Lee").resolved_author(Some("Dana")), "Lee");
    }

    #[test]
    fn partial_json_uses_defaults() {
        let settings: CompareSettings =
            serde_json::from_str(r#"{"case_insensitive": true, "max_nesting_depth": 8}"#).unwrap();
        assert!(settings.case_insensitive);
        assert_eq!(settings.max_nesting_depth, 8);
        assert!(settings.is_word_separator(' '));
        assert!(!settings.is_word_separator('a'));
    }
}
