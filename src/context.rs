//! Application context providing dependency injection root.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::di::Context as ContextDerive;
use crate::error::AppError;
use crate::models::{DocumentPart, UniverseCounts};
use crate::repositories::Store;

/// Per-part document sets for batched pair lookups, keyed by
/// `(subject, object, part)`.
pub type PairDocuments = HashMap<(String, String, DocumentPart), Vec<String>>;

const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Shared HTTP client for the normalizer and biolink model collaborators.
#[derive(Clone)]
pub struct HttpClient(pub reqwest::Client);

/// Universe counters the metric formulas divide by. Populated at startup
/// and replaced wholesale by `/refresh`.
#[derive(Clone, Default)]
pub struct Universe(pub Arc<RwLock<UniverseCounts>>);

/// Lowercased biolink class names (mixin/abstract/deprecated) excluded from
/// knowledge node categories.
#[derive(Clone, Default)]
pub struct InvalidClasses(pub Arc<RwLock<HashSet<String>>>);

/// Named read-through caches shared across requests.
#[derive(Clone)]
pub struct Caches {
    /// category -> corpus CURIEs tagged with it.
    pub category_curies: TtlCache<String, Vec<String>>,
    /// CURIE -> corpus label.
    pub labels: TtlCache<String, String>,
    /// CURIE -> corpus categories.
    pub categories: TtlCache<String, Vec<String>>,
    /// query CURIE -> text-mined synonym CURIEs.
    pub synonyms: TtlCache<String, Vec<String>>,
    /// batched pair lookup -> per-part document sets.
    pub pair_documents: TtlCache<(Vec<String>, Vec<String>), PairDocuments>,
}

impl Caches {
    pub fn new(ttl: Duration) -> Self {
        Self {
            category_curies: TtlCache::new(ttl),
            labels: TtlCache::new(ttl),
            categories: TtlCache::new(ttl),
            synonyms: TtlCache::new(ttl),
            pair_documents: TtlCache::new(ttl),
        }
    }
}

/// Root application context.
///
/// Holds all shared dependencies; `#[derive(Context)]` generates `FromRef`
/// implementations for each field so repositories and services can be
/// resolved with `#[derive(FromContext)]`.
#[derive(ContextDerive, Clone)]
pub struct Context {
    /// Connection pool for the co-occurrence store.
    pub store: Store,
    /// Application configuration.
    pub config: Arc<Config>,
    /// HTTP client for external collaborators.
    pub http: HttpClient,
    /// Read-through caches.
    pub caches: Caches,
    /// Universe counters for metric denominators.
    pub universe: Universe,
    /// Biolink classes filtered from node categories.
    pub invalid_classes: InvalidClasses,
}

impl Context {
    /// Creates a context with the given store and configuration.
    pub fn new(store: Store, config: Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.normalizer.connect_timeout_secs))
            .build()?;
        Ok(Self {
            store,
            config: Arc::new(config),
            http: HttpClient(http),
            caches: Caches::new(CACHE_TTL),
            universe: Universe::default(),
            invalid_classes: InvalidClasses::default(),
        })
    }
}
