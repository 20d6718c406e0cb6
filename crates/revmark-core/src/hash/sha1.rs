use sha1::{Digest, Sha1};

/// Fingerprint of a UTF-8 string as 40 lowercase hex characters.
pub fn sha1_hash_string(s: &str) -> String {
    sha1_hash_bytes(s.as_bytes())
}

pub fn sha1_hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Incremental fingerprint over several pieces, equivalent to hashing their
/// concatenation.
#[derive(Clone, Default)]
pub struct Sha1Accumulator {
    hasher: Sha1,
}

impl Sha1Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update(bytes);
        self
    }

    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_empty_string() {
        assert_eq!(
            sha1_hash_string(""),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn sha1_classic_test_phrase() {
        assert_eq!(
            sha1_hash_string("The quick brown fox jumps over the lazy dog"),
            "2fd4e1c67a2d28fced849ee1bb76e7391b93eb12"
        );
    }

    #[test]
    fn string_and_bytes_agree() {
        let text = "line1\r\nline2 \u{00A0}你好";
        assert_eq!(sha1_hash_string(text), sha1_hash_bytes(text.as_bytes()));
    }

    #[test]
    fn accumulator_matches_concatenation() {
        let mut acc = Sha1Accumulator::new();
        acc.push_str("The quick ").push_str("brown").push_bytes(b" fox");
        assert_eq!(acc.finish(), sha1_hash_string("The quick brown fox"));
    }

    #[test]
    fn digest_is_forty_hex_chars() {
        let digest = sha1_hash_bytes(&[0u8, 159, 146, 150]);
        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
