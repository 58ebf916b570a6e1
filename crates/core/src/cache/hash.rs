//! Cache entry key generation.

use sha2::{Digest, Sha256};

/// Compute the storage key for a (method, URL) pair.
pub fn compute_entry_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = compute_entry_key("GET", "http://localhost:5000/static/style.css");
        let key2 = compute_entry_key("get", "http://localhost:5000/static/style.css");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_differs_by_url() {
        let a = compute_entry_key("GET", "http://localhost:5000/search?q=a");
        let b = compute_entry_key("GET", "http://localhost:5000/search?q=b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = compute_entry_key("GET", "https://cdn.jsdelivr.net/npm/bootstrap.css");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
