use thiserror::Error;

/// An error reading or editing a property of a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The stored value cannot be converted into the requested type.
    #[error("property '{key}' holds a {actual} which cannot be converted to {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
    /// A value that is not a map was added to a map property.
    #[error("cannot add a {added} to the map property '{key}'")]
    IncompatibleAdd { key: String, added: &'static str },
}
