//! # Configuration-scoped context cache
//!
//! Components that are configured from a [`Store`](ctxcache_store::Store) are expensive to set up
//! and, once built, immutable. The [`ContextCache`] makes sure that there is exactly one instance
//! of each such component per *effective configuration*, and hands out shared references to it.
//!
//! ## Groups and Lineage
//!
//! Every [`Context`] reads the properties of one group, and inherits the groups of its
//! [`Parent`](Context::Parent). The effective configuration of a type are all properties in these
//! groups. Properties of unrelated groups never cause a new instance to be created:
//!
//! - Type `A` reads group `A`.
//! - Type `B` extends `A` and reads groups `A` and `B`.
//! - Type `C` extends `B` and reads groups `A`, `B` and `C`.
//!
//! Setting `C.f3.b` therefore yields a new `C`, but the same `A` and `B` instances as before.
//!
//! ## Canonical Stores
//!
//! An instance keeps the first store it was constructed from. Requesting the same type again with
//! a store that is equal in all relevant groups returns that instance, and thus the *canonical*
//! store for that configuration, which can be compared by identity.
//!
//! ## Failures
//!
//! Construction failures are reported as [`ContextError::ConstructionFailed`] and are never
//! cached. Concurrent callers that were waiting on the failed construction all receive the
//! error, and the next request tries again.
//!
//! ### Metrics
//!
//! Each of these metrics is tagged with a `context` field containing the type name:
//!
//! - `contexts.access`: All requests.
//! - `contexts.memory.hit`: Requests served by an existing instance.
//! - `contexts.construction`: Constructions that were actually run.
//! - `contexts.construction.failed`: Constructions that returned an error.
//!
//! Additionally, the `contexts.entries` gauge reports the number of cached instances whenever a
//! new one is registered.

#[macro_use]
pub mod metrics;

mod cache;
pub mod config;
mod context;
mod error;
pub mod logging;
mod registry;

pub use cache::{BuildContext, ContextCache};
pub use config::{CacheConfig, Config};
pub use context::{Ancestor, Context, Lineage};
pub use error::{ConstructionError, ContextError};
pub use registry::{ContextType, TypeRegistry};

/// Sets up logging, metrics and the process-wide [`ContextCache`] from `config`.
///
/// Logging is left alone if a global subscriber is already installed, and so is a cache that was
/// installed before.
///
/// # Errors
///
/// Fails if statsd is configured but the client cannot be created, or if metrics were already
/// configured.
pub fn init(config: &Config) -> anyhow::Result<()> {
    if !logging::init_logging(config) {
        tracing::debug!("Logging is already initialized");
    }
    if let Some(ref statsd) = config.metrics.statsd {
        metrics::configure_statsd(
            &config.metrics.prefix,
            statsd.as_str(),
            config.metrics.custom_tags.clone(),
        )?;
    }
    ContextCache::init(&config.cache);
    Ok(())
}
