use std::sync::Arc;

use ctxcache_store::StoreError;
use thiserror::Error;

/// The reason a [`Context`](crate::Context) could not be constructed.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// The type does not provide a construction procedure.
    #[error("no construction procedure available")]
    NoConstructor,
    /// A property could not be read from the store.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The construction procedure failed.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
    /// A cached instance did not have the type it was requested as.
    ///
    /// Instances are keyed by the `TypeId` of their type, so this indicates a bug in the cache.
    #[error("cached instance has an unexpected type")]
    UnexpectedType,
}

/// An error returned by [`ContextCache::create`](crate::ContextCache::create).
#[derive(Debug, Clone, Error)]
pub enum ContextError {
    /// Constructing the context failed.
    ///
    /// Failures are never cached, every call retries construction.
    #[error("Could not create instance of class '{type_name}'")]
    ConstructionFailed {
        type_name: &'static str,
        #[source]
        cause: Arc<ConstructionError>,
    },
    /// A type in the lineage of the context declares an unusable group name.
    #[error("type '{type_name}' declares the invalid group '{group}'")]
    InvalidGroup {
        type_name: &'static str,
        group: &'static str,
    },
    /// The lineage of a context refers back to itself.
    #[error("type '{type_name}' is its own ancestor")]
    CyclicLineage { type_name: &'static str },
}

impl ContextError {
    pub(crate) fn construction(type_name: &'static str, cause: ConstructionError) -> Self {
        Self::ConstructionFailed {
            type_name,
            cause: Arc::new(cause),
        }
    }

    /// The underlying [`ConstructionError`], if this is a construction failure.
    pub fn cause(&self) -> Option<&ConstructionError> {
        match self {
            Self::ConstructionFailed { cause, .. } => Some(&**cause),
            _ => None,
        }
    }
}
