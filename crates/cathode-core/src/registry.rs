//! Identifier generation and reverse lookup.
//!
//! [`IdentifierRegistry`] pairs two [`NameCache`]s:
//! - the **factory** cache of well-known names, loaded once per process from
//!   the dataset shipped with this crate and shared immutably;
//! - the **custom** cache of names introduced by the archive currently being
//!   edited. It is replaced when an archive is attached and written back to
//!   the archive's side table on save.
//!
//! The registry is a plain value rather than global state. Callers that need
//! concurrent access must serialize it themselves.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::id::Identifier;
use crate::names::NameCache;

/// Well-known names shipped with the crate, one per line.
const FACTORY_NAMES: &str = include_str!("../data/factory_names.txt");

/// Consecutive rejected candidates before the random search is diversified.
const RANDOM_RETRY_LIMIT: u32 = 1000;

static FACTORY: Lazy<Arc<NameCache>> = Lazy::new(|| {
    let cache = NameCache::from_names(FACTORY_NAMES.lines());
    debug!(entries = cache.len(), "loaded factory name cache");
    Arc::new(cache)
});

/// Returns the process-wide factory cache, loading it on first use.
pub fn factory_cache() -> Arc<NameCache> {
    Arc::clone(&FACTORY)
}

/// Generates and resolves identifiers against the factory and custom caches.
#[derive(Debug, Clone)]
pub struct IdentifierRegistry {
    factory: Arc<NameCache>,
    custom: NameCache,
}

impl IdentifierRegistry {
    /// Creates a registry over the shipped factory cache with an empty
    /// custom cache.
    pub fn new() -> Self {
        Self::with_factory(factory_cache())
    }

    /// Creates a registry over an explicit factory cache.
    pub fn with_factory(factory: Arc<NameCache>) -> Self {
        IdentifierRegistry {
            factory,
            custom: NameCache::new(),
        }
    }

    pub fn factory(&self) -> &NameCache {
        &self.factory
    }

    pub fn custom(&self) -> &NameCache {
        &self.custom
    }

    /// Drops every custom name, e.g. when an archive is detached.
    pub fn reset_custom(&mut self) {
        self.custom = NameCache::new();
    }

    /// Swaps in the custom cache of a newly attached archive, returning the
    /// previous one.
    pub fn replace_custom(&mut self, cache: NameCache) -> NameCache {
        std::mem::replace(&mut self.custom, cache)
    }

    /// Returns the identifier for `name` and records it in the custom cache.
    ///
    /// Well-known names resolve through the factory cache and are never
    /// copied into the custom cache.
    pub fn generate(&mut self, name: &str) -> Identifier {
        if let Some(id) = self.factory.id_of(name) {
            return id;
        }
        let id = Identifier::from_name(name);
        self.custom.insert(name, id);
        id
    }

    /// Same as [`generate`](Self::generate) but leaves the custom cache
    /// untouched.
    pub fn generate_uncached(&self, name: &str) -> Identifier {
        self.factory
            .id_of(name)
            .unwrap_or_else(|| Identifier::from_name(name))
    }

    /// Resolves an identifier to its name: custom cache first, then factory
    /// cache, then the raw byte string. Never fails.
    pub fn find_string(&self, id: Identifier) -> String {
        self.custom
            .name_of(id)
            .or_else(|| self.factory.name_of(id))
            .map(str::to_string)
            .unwrap_or_else(|| id.to_byte_string())
    }

    /// Returns `true` if either cache knows `id`.
    pub fn contains(&self, id: Identifier) -> bool {
        self.custom.contains_id(id) || self.factory.contains_id(id)
    }

    /// Produces an identifier that exists in neither cache and records it in
    /// the custom cache.
    ///
    /// The search is seeded from the current local timestamp.
    pub fn generate_random(&mut self) -> Identifier {
        let seed = chrono::Local::now()
            .format("%d/%m/%Y %H:%M:%S%.f")
            .to_string();
        self.generate_random_from(seed)
    }

    fn generate_random_from(&mut self, seed: String) -> Identifier {
        let mut candidate = seed;
        let mut rejections = 0u32;
        let mut extra = 0u32;

        loop {
            let id = Identifier::from_name(&candidate);
            if !self.collides(&candidate, id) {
                self.custom.insert(&candidate, id);
                return id;
            }

            candidate = id.to_byte_string();
            rejections += 1;

            if rejections >= RANDOM_RETRY_LIMIT {
                // Printable ASCII, cycling.
                let suffix = char::from(b'!' + (extra % 94) as u8);
                extra += 1;
                candidate.push(suffix);
                rejections = 0;
                debug!(%candidate, "random identifier search diversified");
            }
        }
    }

    fn collides(&self, candidate: &str, id: Identifier) -> bool {
        id.is_terminator()
            || self.factory.contains_name(candidate)
            || self.custom.contains_name(candidate)
            || self.contains(id)
    }
}

impl Default for IdentifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}
