use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Serialize, Serializer};

use crate::builder::StoreBuilder;
use crate::digest::{Digest, DigestBuilder};
use crate::error::StoreError;
use crate::value::{FromValue, Value};

/// All the entries of a [`Store`] belonging to one group.
///
/// Groups are immutable once they are part of a [`Store`] and are shared between all the stores
/// built from the same unchanged group, together with their lazily computed digest.
#[derive(Clone, Debug, Default)]
pub(crate) struct PropertyGroup {
    pub(crate) entries: BTreeMap<String, Value>,
    pub(crate) digest: OnceLock<Digest>,
}

impl PropertyGroup {
    fn digest(&self) -> &Digest {
        self.digest.get_or_init(|| {
            let mut builder = DigestBuilder::default();
            for (key, value) in &self.entries {
                // writing into a `String` cannot fail
                let _ = builder.write_entry(key, value);
            }
            builder.build()
        })
    }
}

impl PartialEq for PropertyGroup {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

pub(crate) type Groups = BTreeMap<String, Arc<PropertyGroup>>;

/// An immutable, hierarchical set of typed configuration properties.
///
/// Properties are keyed by `"<Group>.<Name>[.<Kind>]"`, see [`PropertyKey`](crate::PropertyKey).
/// A [`Store`] is cheap to clone, and clones share identity as checked by [`Store::ptr_eq`].
/// New stores are created through a [`StoreBuilder`].
#[derive(Clone, Default)]
pub struct Store {
    groups: Arc<Groups>,
}

impl Store {
    /// Creates a new, empty [`StoreBuilder`].
    pub fn create() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Creates an empty store.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_groups(groups: Groups) -> Self {
        Self {
            groups: Arc::new(groups),
        }
    }

    /// Returns a [`StoreBuilder`] pre-populated with all the entries of this store.
    pub fn builder(&self) -> StoreBuilder {
        StoreBuilder::from_groups(Groups::clone(&self.groups))
    }

    pub(crate) fn raw_groups(&self) -> &Groups {
        &self.groups
    }

    /// Whether both stores are the very same instance.
    pub fn ptr_eq(a: &Store, b: &Store) -> bool {
        Arc::ptr_eq(&a.groups, &b.groups)
    }

    /// Returns the raw value stored under `key`.
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        let group = key.split_once('.').map_or("", |(group, _)| group);
        self.groups.get(group)?.entries.get(key)
    }

    /// Reads the property `key` as a `T`.
    ///
    /// Returns `Ok(None)` if the property is not set.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::TypeMismatch`] if the property is set, but its value cannot be
    /// converted into a `T`.
    pub fn get_opt<T: FromValue>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(value) = self.get_value(key) else {
            return Ok(None);
        };
        match T::from_value(value) {
            Some(value) => Ok(Some(value)),
            None => Err(StoreError::TypeMismatch {
                key: key.to_owned(),
                expected: T::EXPECTED,
                actual: value.kind(),
            }),
        }
    }

    /// Reads the property `key` as a `T`, falling back to `default` if it is not set.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::TypeMismatch`] if the property is set, but its value cannot be
    /// converted into a `T`.
    pub fn get<T: FromValue>(&self, key: &str, default: T) -> Result<T, StoreError> {
        Ok(self.get_opt(key)?.unwrap_or(default))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// The names of all non-empty groups, in sorted order.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// All keys, sorted by group and then by key.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups
            .values()
            .flat_map(|group| group.entries.keys().map(String::as_str))
    }

    /// The total number of entries.
    pub fn len(&self) -> usize {
        self.groups.values().map(|group| group.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Computes a [`Digest`] over all entries whose group is one of `groups`.
    ///
    /// Entries of any other group do not influence the result, and neither does the order or
    /// multiplicity of `groups`. Per-group digests are memoized, so digesting the same groups of
    /// stores derived from each other is cheap.
    pub fn digest<I, S>(&self, groups: I) -> Digest
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<S> = groups.into_iter().collect();
        names.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        names.dedup_by(|a, b| a.as_ref() == b.as_ref());

        let mut builder = DigestBuilder::default();
        for name in &names {
            let name = name.as_ref();
            if let Some(group) = self.groups.get(name) {
                // writing into a `String` cannot fail
                let _ = builder.write_group(name, group.digest());
            }
        }
        builder.build()
    }
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        Store::ptr_eq(self, other) || self.groups == other.groups
    }
}

impl Eq for Store {}

impl Serialize for Store {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(
            self.groups
                .iter()
                .map(|(name, group)| (name, &group.entries)),
        )
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Store").field(&format_args!("{self}")).finish()
    }
}
