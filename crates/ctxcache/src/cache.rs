use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, OnceLock};

use ctxcache_store::{Digest, Store, StoreBuilder};

use crate::config::CacheConfig;
use crate::context::Context;
use crate::error::{ConstructionError, ContextError};
use crate::registry::{ContextType, TypeRegistry};

type Instance = Arc<dyn Any + Send + Sync>;

/// The in-memory registry of canonical instances, keyed by type and relevant digest.
type InstanceCache = moka::sync::Cache<(TypeId, Digest), Instance>;

static GLOBAL: OnceLock<ContextCache> = OnceLock::new();

/// Canonicalizes [`Context`] instances by their effective configuration.
///
/// Two calls to [`create`](Self::create) for the same type return the same instance if the
/// stores agree on all groups in the lineage of that type, even if they differ in unrelated
/// groups. The returned instance holds the first store that was observed for its configuration.
///
/// Construction is coalesced per key: concurrent callers asking for the same type and
/// configuration wait for a single construction, while callers for other keys are never blocked.
/// Construction failures are returned to every waiting caller and never cached.
pub struct ContextCache {
    config: CacheConfig,

    /// Resolved lineages of all types seen so far.
    types: TypeRegistry,

    /// Canonical instances. This is `None` if caching is disabled.
    instances: Option<InstanceCache>,
}

impl ContextCache {
    pub fn new(config: &CacheConfig) -> Self {
        let instances = config.enabled.then(|| {
            let mut builder = InstanceCache::builder().name("contexts");
            if let Some(max_capacity) = config.max_capacity {
                builder = builder.max_capacity(max_capacity);
            }
            if let Some(time_to_idle) = config.time_to_idle {
                builder = builder.time_to_idle(time_to_idle);
            }
            builder.build()
        });

        Self {
            config: config.clone(),
            types: TypeRegistry::default(),
            instances,
        }
    }

    /// Installs the process-wide cache.
    ///
    /// Returns `false` if a cache was already installed, either by an earlier call or
    /// implicitly through [`global`](Self::global). In that case `config` is ignored.
    pub fn init(config: &CacheConfig) -> bool {
        let mut installed = false;
        GLOBAL.get_or_init(|| {
            installed = true;
            Self::new(config)
        });
        if !installed {
            tracing::warn!("Context cache is already initialized, ignoring configuration");
        }
        installed
    }

    /// Returns the process-wide cache, installing a default one on first use.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::default)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the canonical instance of `T` for the configuration in `store`.
    ///
    /// Only the groups read by `T` and its ancestors are considered when looking up an existing
    /// instance. If there is none, `T` is constructed from `store` and registered.
    ///
    /// # Errors
    ///
    /// Fails if the lineage of `T` is invalid, or if constructing `T` fails. In the latter case
    /// the error is [`ContextError::ConstructionFailed`] and the next call retries.
    pub fn create<T: Context>(&self, store: &Store) -> Result<Arc<T>, ContextError> {
        let ty = self.types.resolve::<T>()?;
        let name = ty.type_name();
        metric!(counter("contexts.access") += 1, "context" => name);

        let Some(instances) = &self.instances else {
            return construct::<T>(&ty, store).map(Arc::new);
        };

        let digest = store.digest(ty.groups());
        let entry = instances
            .entry((TypeId::of::<T>(), digest))
            .or_try_insert_with(|| {
                tracing::debug!(context = name, %digest, "Constructing context");
                let instance = construct::<T>(&ty, store)?;
                Ok::<_, ContextError>(Arc::new(instance) as Instance)
            })
            .map_err(|err| (*err).clone())?;

        if entry.is_fresh() {
            metric!(gauge("contexts.entries") = instances.entry_count());
        } else {
            tracing::trace!(context = name, %digest, "Found cached context");
            metric!(counter("contexts.memory.hit") += 1, "context" => name);
        }

        entry
            .into_value()
            .downcast::<T>()
            .map_err(|_| ContextError::construction(name, ConstructionError::UnexpectedType))
    }

    /// The approximate number of cached instances.
    pub fn entry_count(&self) -> u64 {
        self.instances
            .as_ref()
            .map(InstanceCache::entry_count)
            .unwrap_or_default()
    }

    /// Discards all cached instances.
    ///
    /// Instances that are still referenced elsewhere stay alive, but are no longer returned.
    pub fn clear(&self) {
        if let Some(instances) = &self.instances {
            instances.invalidate_all();
        }
    }
}

fn construct<T: Context>(ty: &ContextType, store: &Store) -> Result<T, ContextError> {
    let name = ty.type_name();
    metric!(counter("contexts.construction") += 1, "context" => name);

    T::construct(store).map_err(|cause| {
        metric!(counter("contexts.construction.failed") += 1, "context" => name);
        tracing::debug!(context = name, error = %cause, "Construction failed");
        ContextError::construction(name, cause)
    })
}

impl Default for ContextCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl fmt::Debug for ContextCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextCache")
            .field("config", &self.config)
            .field("types", &self.types)
            .field("in-memory items", &self.entry_count())
            .finish()
    }
}

/// Builds [`Context`]s directly from a [`StoreBuilder`].
pub trait BuildContext {
    /// Builds the store and returns the canonical instance of `T` from the
    /// [global](ContextCache::global) cache.
    fn build_context<T: Context>(&self) -> Result<Arc<T>, ContextError>;
}

impl BuildContext for StoreBuilder {
    fn build_context<T: Context>(&self) -> Result<Arc<T>, ContextError> {
        ContextCache::global().create(&self.build())
    }
}
