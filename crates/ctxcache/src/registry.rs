use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::context::{Ancestor, Context, Lineage};
use crate::error::ContextError;

/// Resolved metadata about a [`Context`] type.
#[derive(Debug)]
pub struct ContextType {
    type_name: &'static str,
    groups: Box<[&'static str]>,
}

impl ContextType {
    /// Resolves the metadata of `T` by walking its lineage.
    ///
    /// # Errors
    ///
    /// Fails if any type in the lineage declares an empty group or one containing a `.`, or if
    /// the lineage is cyclic.
    pub fn of<T: Context>() -> Result<Self, ContextError> {
        let mut chain = Vec::new();
        T::walk(&mut chain)?;

        let mut groups: Vec<&'static str> = Vec::with_capacity(chain.len());
        for &Ancestor {
            type_name, group, ..
        } in chain.iter().rev()
        {
            if group.is_empty() || group.contains('.') {
                return Err(ContextError::InvalidGroup { type_name, group });
            }
            if !groups.contains(&group) {
                groups.push(group);
            }
        }

        Ok(Self {
            type_name: type_name::<T>(),
            groups: groups.into(),
        })
    }

    /// The fully qualified name of the type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The groups read by this type and all its ancestors, root first.
    pub fn groups(&self) -> &[&'static str] {
        &self.groups
    }
}

/// A registry of resolved [`ContextType`]s, keyed by type identity.
///
/// Each type is resolved at most once and then published. Later lookups only take a shared lock.
#[derive(Default)]
pub struct TypeRegistry {
    types: RwLock<FxHashMap<TypeId, Arc<ContextType>>>,
}

impl TypeRegistry {
    /// Returns the [`ContextType`] of `T`, resolving it on first use.
    ///
    /// Resolution errors are not published, so they are reported again on every call.
    pub fn resolve<T: Context>(&self) -> Result<Arc<ContextType>, ContextError> {
        let type_id = TypeId::of::<T>();
        if let Some(ty) = self
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
        {
            return Ok(Arc::clone(ty));
        }

        let ty = Arc::new(ContextType::of::<T>()?);
        tracing::trace!(
            context = ty.type_name(),
            groups = ?ty.groups(),
            "Resolved context type"
        );

        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(types.entry(type_id).or_insert(ty)))
    }

    /// The number of resolved types.
    pub fn len(&self) -> usize {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.len())
            .finish()
    }
}
