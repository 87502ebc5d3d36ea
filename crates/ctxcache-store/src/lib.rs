//! # Configuration stores
//!
//! A [`Store`] is an immutable set of typed configuration properties. Every property belongs to a
//! *group*, which is the first segment of its key. By convention the group is the name of the
//! component family that reads the property:
//!
//! ```
//! use ctxcache_store::Store;
//!
//! let store = Store::create()
//!     .set("A.f1", "foo")
//!     .set("B.f2.i", "123")
//!     .build();
//!
//! assert_eq!(store.get("A.f1", String::from("xxx")).unwrap(), "foo");
//! assert_eq!(store.get("B.f2.i", -1).unwrap(), 123);
//! assert_eq!(store.get("C.f3.b", false).unwrap(), false);
//! ```
//!
//! ## Keys and Types
//!
//! Keys have the form `"<Group>.<Name>[.<Kind>]"`. The optional kind suffix declares the type of
//! the property, see [`PropertyType`] for the full list. Values are coerced into that type when
//! they are stored, so `"123"` stored under an `.i` key becomes the integer `123`. Values that
//! cannot be coerced are kept as-is, and reading them fails with [`StoreError::TypeMismatch`].
//! Reading a property that is not set never fails and returns the supplied default.
//!
//! ## Builders
//!
//! Stores never change once built. A [`StoreBuilder`], created through [`Store::create`] or
//! [`Store::builder`], collects edits and materializes new stores with
//! [`build`](StoreBuilder::build). Builders share all groups that were not edited with the store
//! they started from.
//!
//! ## Digests
//!
//! [`Store::digest`] computes a SHA-256 [`Digest`] over only the entries of the requested groups.
//! Two stores that differ only in other groups have the same digest. Each group memoizes its own
//! digest, and since unchanged groups are shared between stores, repeatedly digesting derived
//! stores only hashes the groups that actually changed.
//!
//! **NOTE**: The digest is stable within a process, and in fact across processes, but nothing
//! should rely on the latter.

mod builder;
mod digest;
mod error;
mod key;
mod store;
mod value;

pub use builder::StoreBuilder;
pub use digest::Digest;
pub use error::StoreError;
pub use key::{PropertyKey, PropertyType, Shape};
pub use store::Store;
pub use value::{FromValue, Value};
