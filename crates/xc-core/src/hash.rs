//! Hash map aliases and content hashing.
//!
//! Internal indices use the Fx hash from `rustc-hash`, which is fast for the
//! short string keys this workspace deals in and needs no denial-of-service
//! resistance. File contents are hashed with xxh3, whose output is stable
//! across runs and platforms and can therefore key the persisted cache.
//!
//! # Examples
//!
//! ```
//! use xc_core::{FxHashMap, content_hash, fx_hash_map};
//!
//! let mut map: FxHashMap<&str, u64> = fx_hash_map();
//! map.insert("a.ts", content_hash(b"export {}"));
//! assert_eq!(map["a.ts"], content_hash(b"export {}"));
//! ```

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// Creates a new empty [`FxHashMap`].
#[inline]
#[must_use]
pub fn fx_hash_map<K, V>() -> FxHashMap<K, V> {
    FxHashMap::default()
}

/// Creates a new empty [`FxHashSet`].
#[inline]
#[must_use]
pub fn fx_hash_set<V>() -> FxHashSet<V> {
    FxHashSet::default()
}

/// Computes the stable 64-bit xxh3 hash of a file's contents.
///
/// Unlike the Fx hasher this value does not depend on the process, so it is
/// safe to persist.
#[inline]
#[must_use]
pub fn content_hash(bytes: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fx_hash_map_operations() {
        let mut map: FxHashMap<&str, i32> = fx_hash_map();
        map.insert("one", 1);
        map.insert("two", 2);
        assert_eq!(map.get("one"), Some(&1));
        assert_eq!(map.get("three"), None);
    }

    #[test]
    fn test_fx_hash_set_operations() {
        let mut set: FxHashSet<&str> = fx_hash_set();
        set.insert("one");
        assert!(set.contains("one"));
        assert!(!set.contains("two"));
    }

    #[test]
    fn test_content_hash_is_deterministic() {
        let a = content_hash(b"fetch('/api/users')");
        let b = content_hash(b"fetch('/api/users')");
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_hash_differs_on_single_byte() {
        assert_ne!(content_hash(b"const a = 1;"), content_hash(b"const a = 2;"));
    }
}
