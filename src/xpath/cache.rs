//! Compiled-path cache
//!
//! Repeated queries usually reuse a small set of path expressions, so
//! compiling them once pays off. A `PathCache` owns the prefix map the
//! paths compile against and a capacity-bounded LRU of compiled paths
//! keyed by expression text.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::rc::Rc;

use lru::LruCache;

use crate::error::Result;
use crate::xpath::Path;

/// Default number of compiled paths kept.
const DEFAULT_CAPACITY: usize = 64;

/// An LRU cache of compiled paths sharing one prefix map.
pub struct PathCache {
    xmlns: HashMap<String, String>,
    cache: LruCache<String, Rc<Path>>,
}

impl PathCache {
    /// A cache compiling against `xmlns`, with the default capacity.
    pub fn new(xmlns: HashMap<String, String>) -> Self {
        Self::with_capacity(xmlns, DEFAULT_CAPACITY)
    }

    /// A cache compiling against `xmlns`, keeping at most `capacity`
    /// compiled paths.
    pub fn with_capacity(xmlns: HashMap<String, String>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        PathCache {
            xmlns,
            cache: LruCache::new(capacity),
        }
    }

    /// Fetch the compiled form of `expr`, compiling on a miss.
    pub fn get(&mut self, expr: &str) -> Result<Rc<Path>> {
        if let Some(path) = self.cache.get(expr) {
            return Ok(Rc::clone(path));
        }
        let compiled = Rc::new(Path::parse_with(expr, &self.xmlns)?);
        self.cache.put(expr.to_string(), Rc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of compiled paths currently held.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// True when nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_returns_same_compilation() {
        let mut cache = PathCache::new(HashMap::new());
        let first = cache.get("//a").unwrap();
        let again = cache.get("//a").unwrap();
        assert!(Rc::ptr_eq(&first, &again));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = PathCache::with_capacity(HashMap::new(), 2);
        let a = cache.get("//a").unwrap();
        cache.get("//b").unwrap();
        cache.get("//c").unwrap();
        assert_eq!(cache.len(), 2);
        let a_again = cache.get("//a").unwrap();
        assert!(!Rc::ptr_eq(&a, &a_again));
    }

    #[test]
    fn test_compile_error_not_cached() {
        let mut cache = PathCache::new(HashMap::new());
        assert!(cache.get("//x:b").is_err());
        assert!(cache.is_empty());
    }
}
