use sha2::{Digest, Sha256};

/// First four bytes of the SHA-256 digest, hex encoded.
pub(crate) fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::short_hash;

    #[test]
    fn hash_is_stable_and_short() {
        let a = short_hash("div|ckeditor");
        assert_eq!(a.len(), 8);
        assert_eq!(a, short_hash("div|ckeditor"));
        assert_ne!(a, short_hash("div|other"));
    }
}
