//! Resolution Cache.
//!
//! Per-import memoization of property resolution, keyed by
//! `(system-url, property-code)`. Created empty at the start of each
//! orchestrator call and discarded at the end; it never spans transactions.
//!
//! Some terminology import engines guard this lookup with a prototype-less
//! dictionary so keys like `__proto__` can't shadow built-in object members.
//! That attack vector does not exist for a plain Rust `HashMap<(String,
//! String), _>` — there is no prototype chain to pollute — so this is an
//! ordinary hash map with a plain tuple key. The regression test for crafted
//! keys is kept anyway, as a cheap guard against any future switch to a
//! key representation that could reintroduce the hazard.

use std::collections::HashMap;

use uuid::Uuid;

/// The resolved `(id, is_relationship)` pair for one property code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedProperty {
    pub id: Uuid,
    pub is_relationship: bool,
}

/// Hit/miss counters for one cache's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// A per-import cache of resolved properties, keyed by `(system_url, property_code)`.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<(String, String), ResolvedProperty>,
    stats: CacheStats,
}

impl ResolutionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a previously resolved property, recording a hit or miss.
    pub fn get(&mut self, system_url: &str, property_code: &str) -> Option<ResolvedProperty> {
        let key = (system_url.to_string(), property_code.to_string());
        match self.entries.get(&key) {
            Some(resolved) => {
                self.stats.hits += 1;
                Some(*resolved)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Inserts a resolution result, to be found by subsequent `get` calls.
    pub fn insert(&mut self, system_url: &str, property_code: &str, resolved: ResolvedProperty) {
        self.entries
            .insert((system_url.to_string(), property_code.to_string()), resolved);
    }

    /// Returns hit/miss counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
