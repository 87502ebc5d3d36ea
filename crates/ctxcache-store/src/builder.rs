use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::error::StoreError;
use crate::key::PropertyKey;
use crate::store::{Groups, Store};
use crate::value::Value;

/// A mutable builder for [`Store`]s.
///
/// Builders share all unchanged groups with the store they were created from. Mutating a group
/// copies it on first write, so building after an edit to group `B` reuses the very same group
/// `A`, including its memoized digest.
///
/// Collections that become empty are removed, and so are groups without any entries. A store
/// where an entry was emptied is thus equal to one that never had it.
#[derive(Clone, Debug, Default)]
pub struct StoreBuilder {
    groups: Groups,
}

impl StoreBuilder {
    pub(crate) fn from_groups(groups: Groups) -> Self {
        Self { groups }
    }

    /// Sets the property `key` to `value`, replacing any previous value.
    ///
    /// The value is coerced into the type declared by the key suffix where possible.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let key = PropertyKey::parse(key);
        let value = value.into().normalize(key.property_type());
        self.update(&key, |slot| *slot = Some(value));
        self
    }

    /// Sets all the given properties, see [`set`](Self::set).
    pub fn set_all<I, K, V>(&mut self, properties: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (key, value) in properties {
            self.set(key.as_ref(), value);
        }
        self
    }

    /// Adds `value` to the collection property `key`.
    ///
    /// Lists are appended to, sets and maps are extended. Adding a collection adds each of its
    /// elements. For properties of a scalar type this is the same as [`set`](Self::set).
    ///
    /// Values that cannot be added to a map are dropped and the map is left unchanged, see
    /// [`try_add`](Self::try_add) to detect this.
    pub fn add(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let _ = self.try_add(key, value);
        self
    }

    /// Adds `value` to the collection property `key`, see [`add`](Self::add).
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::IncompatibleAdd`] if `key` holds a map and `value` is not a map.
    /// The builder is left unchanged in that case.
    pub fn try_add(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self, StoreError> {
        let key = PropertyKey::parse(key);
        let value = value.into().normalize(key.property_type());

        let mut rejected = None;
        self.update(&key, |slot| {
            if let Err(value) = Value::merge(slot, value) {
                rejected = Some(value);
            }
        });

        match rejected {
            None => Ok(self),
            Some(value) => Err(StoreError::IncompatibleAdd {
                key: key.as_str().to_owned(),
                added: value.kind(),
            }),
        }
    }

    /// Inserts the entry `map_key` into the map property `key`.
    pub fn add_to(&mut self, key: &str, map_key: &str, value: impl Into<Value>) -> &mut Self {
        let entry = BTreeMap::from([(map_key.to_owned(), value.into())]);
        self.add(key, Value::Map(entry))
    }

    /// Removes `value` from the list or set property `key`.
    ///
    /// For scalar properties, the property is removed if it currently holds `value`.
    pub fn remove(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let key = PropertyKey::parse(key);
        let value = value.into().normalize(key.property_type().element());
        self.update(&key, |slot| match slot {
            Some(Value::List(list)) => list.retain(|item| *item != value),
            Some(Value::Set(set)) => {
                set.remove(&value);
            }
            _ => {
                if slot.as_ref() == Some(&value) {
                    *slot = None;
                }
            }
        });
        self
    }

    /// Removes the entry `map_key` from the map property `key`.
    pub fn remove_from(&mut self, key: &str, map_key: &str) -> &mut Self {
        let key = PropertyKey::parse(key);
        self.update(&key, |slot| {
            if let Some(Value::Map(map)) = slot {
                map.remove(map_key);
            }
        });
        self
    }

    /// Removes the property `key` altogether.
    pub fn unset(&mut self, key: &str) -> &mut Self {
        let key = PropertyKey::parse(key);
        self.update(&key, |slot| *slot = None);
        self
    }

    /// Removes all properties.
    pub fn clear(&mut self) -> &mut Self {
        self.groups.clear();
        self
    }

    /// Copies all properties of `store` into this builder, overriding existing ones.
    pub fn apply(&mut self, store: &Store) -> &mut Self {
        for (name, group) in store.raw_groups() {
            match self.groups.get(name) {
                None => {
                    self.groups.insert(name.clone(), Arc::clone(group));
                }
                Some(current) if Arc::ptr_eq(current, group) => {}
                Some(_) => {
                    for (key, value) in &group.entries {
                        let key = PropertyKey::parse(key.as_str());
                        let value = value.clone();
                        self.update(&key, |slot| *slot = Some(value));
                    }
                }
            }
        }
        self
    }

    /// Builds a new immutable [`Store`].
    ///
    /// This does not consume the builder. Building repeatedly without any mutations in between
    /// returns equal stores.
    pub fn build(&self) -> Store {
        Store::from_groups(self.groups.clone())
    }

    /// Applies `f` to the current value of `key`.
    ///
    /// Groups are only copied if the value actually changes.
    fn update<F>(&mut self, key: &PropertyKey, f: F)
    where
        F: FnOnce(&mut Option<Value>),
    {
        let current = self
            .groups
            .get(key.group())
            .and_then(|group| group.entries.get(key.as_str()));

        let mut slot = current.cloned();
        f(&mut slot);
        let slot = slot.filter(|value| !value.is_empty_collection());
        if slot.as_ref() == current {
            return;
        }

        let group = Arc::make_mut(self.groups.entry(key.group().to_owned()).or_default());
        group.digest = OnceLock::new();
        match slot {
            Some(value) => {
                group.entries.insert(key.as_str().to_owned(), value);
            }
            None => {
                group.entries.remove(key.as_str());
            }
        }

        if group.entries.is_empty() {
            self.groups.remove(key.group());
        }
    }
}
