use icu::casemap::CaseMapper;
use icu::locid::LanguageIdentifier;

/// Locale-neutral full Unicode upper-casing.
pub fn to_upper_invariant(s: &str) -> String {
    CaseMapper::new().uppercase_to_string(s, &LanguageIdentifier::UND)
}

/// Upper-cases with the tailoring of `culture` (a BCP-47 tag such as "tr-TR").
/// Unparseable tags fall back to the invariant mapping.
pub fn to_upper_culture(s: &str, culture: &str) -> String {
    to_upper_langid(s, &parse_culture(culture))
}

pub fn to_upper_langid(s: &str, langid: &LanguageIdentifier) -> String {
    CaseMapper::new().uppercase_to_string(s, langid)
}

/// Parses a BCP-47 tag, falling back to the undetermined language.
pub fn parse_culture(culture: &str) -> LanguageIdentifier {
    culture.parse().unwrap_or(LanguageIdentifier::UND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_upper_invariant_basic() {
        assert_eq!(to_upper_invariant("Hello World"), "HELLO WORLD");
        assert_eq!(to_upper_invariant("café"), "CAFÉ");
    }

    #[test]
    fn turkish_dotted_i_is_tailored() {
        assert_eq!(to_upper_culture("i", "tr-TR"), "İ");
        assert_eq!(to_upper_culture("i", "en-US"), "I");
    }

    #[test]
    fn bad_tag_falls_back_to_invariant() {
        assert_eq!(to_upper_culture("straße", "not a tag!"), "STRASSE");
    }
}
