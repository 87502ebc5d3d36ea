use std::any::{Any, TypeId, type_name};

use ctxcache_store::Store;

use crate::error::{ConstructionError, ContextError};

/// A component that is configured from a [`Store`].
///
/// A context reads its settings from the properties of its own [`GROUP`](Self::GROUP), and from
/// the groups of all its ancestors, declared through [`Parent`](Self::Parent). Only changes to
/// these groups lead to a different instance being created by the
/// [`ContextCache`](crate::ContextCache).
///
/// ```
/// use ctxcache::{ConstructionError, Context};
/// use ctxcache_store::Store;
///
/// struct Serializer {
///     store: Store,
///     indent: i64,
/// }
///
/// impl Context for Serializer {
///     const GROUP: &'static str = "Serializer";
///     type Parent = ();
///
///     fn construct(store: &Store) -> Result<Self, ConstructionError> {
///         Ok(Self {
///             store: store.clone(),
///             indent: store.get("Serializer.indent.i", 0)?,
///         })
///     }
///
///     fn store(&self) -> &Store {
///         &self.store
///     }
/// }
/// ```
pub trait Context: Any + Send + Sync + Sized {
    /// The group of properties this type reads from.
    const GROUP: &'static str;

    /// The context this type extends, or `()` for root types.
    type Parent: Lineage;

    /// Constructs a new instance from the given `store`.
    ///
    /// Types that cannot be constructed on their own keep the default, which always fails with
    /// [`ConstructionError::NoConstructor`].
    fn construct(_store: &Store) -> Result<Self, ConstructionError> {
        Err(ConstructionError::NoConstructor)
    }

    /// The store this instance was constructed from.
    fn store(&self) -> &Store;
}

/// A single type in the lineage of a [`Context`].
#[derive(Clone, Copy, Debug)]
pub struct Ancestor {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub group: &'static str,
}

/// The chain of ancestors of a [`Context`].
///
/// This is implemented for `()`, terminating the chain, and for every [`Context`].
pub trait Lineage: 'static {
    /// Pushes this type and all its ancestors onto `chain`, most derived type first.
    fn walk(chain: &mut Vec<Ancestor>) -> Result<(), ContextError>;
}

impl Lineage for () {
    fn walk(_chain: &mut Vec<Ancestor>) -> Result<(), ContextError> {
        Ok(())
    }
}

impl<T: Context> Lineage for T {
    fn walk(chain: &mut Vec<Ancestor>) -> Result<(), ContextError> {
        let type_id = TypeId::of::<T>();
        if chain.iter().any(|ancestor| ancestor.type_id == type_id) {
            return Err(ContextError::CyclicLineage {
                type_name: type_name::<T>(),
            });
        }
        chain.push(Ancestor {
            type_id,
            type_name: type_name::<T>(),
            group: T::GROUP,
        });
        T::Parent::walk(chain)
    }
}
