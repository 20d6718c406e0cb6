pub mod sha1;

pub use self::sha1::{sha1_hash_bytes, sha1_hash_string, Sha1Accumulator};
