//! State Hashing
//!
//! Digest of a client's world view. Two observers fed the same snapshots must
//! produce the same digest, which makes convergence cheap to assert and log.

use sha2::{Sha256, Digest};
use super::vec2::Vec2;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Ordered hasher for world state.
///
/// Wraps SHA-256 with helpers for the simulation's value types.
/// Callers must feed values in a canonical order.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for the world view.
    pub fn for_world_state() -> Self {
        Self::new(b"HIDESEEK_WORLD_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an f64 value (IEEE-754 bits, little-endian).
    #[inline]
    pub fn update_f64(&mut self, value: f64) {
        self.hasher.update(value.to_bits().to_le_bytes());
    }

    /// Update with a Vec2.
    #[inline]
    pub fn update_vec2(&mut self, value: Vec2) {
        self.update_f64(value.x);
        self.update_f64(value.y);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Update with an optional string; `None` and `Some("")` hash differently.
    pub fn update_opt_str(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.update_u8(1);
                self.update_str(s);
            }
            None => self.update_u8(0),
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        let digest = |v: f64| {
            let mut h = StateHasher::for_world_state();
            h.update_str("alice");
            h.update_vec2(Vec2::new(v, 2.0));
            h.finalize()
        };
        assert_eq!(digest(1.0), digest(1.0));
        assert_ne!(digest(1.0), digest(1.5));
    }

    #[test]
    fn test_domain_separation() {
        let a = StateHasher::new(b"A").finalize();
        let b = StateHasher::new(b"B").finalize();
        assert_ne!(a, b);
    }

    #[test]
    fn test_optional_string_tagging() {
        let mut a = StateHasher::for_world_state();
        a.update_opt_str(None);
        let mut b = StateHasher::for_world_state();
        b.update_opt_str(Some(""));
        assert_ne!(a.finalize(), b.finalize());
    }
}
