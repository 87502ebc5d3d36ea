use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write};

use serde::Serialize;

use crate::key::{PropertyType, Shape};

/// A configuration value.
///
/// Values are totally ordered and hashable so that they can be members of sets and be digested
/// deterministically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Set(BTreeSet<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// A short human readable name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
        }
    }

    pub(crate) fn is_empty_collection(&self) -> bool {
        match self {
            Value::List(list) => list.is_empty(),
            Value::Set(set) => set.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Coerces this value into the representation mandated by `ty`.
    ///
    /// Values that cannot be coerced are returned unchanged, reads of them will then fail with a
    /// type mismatch.
    pub fn normalize(self, ty: PropertyType) -> Value {
        let element = ty.element();
        match (ty.shape(), self) {
            (Shape::Scalar, value) => value.normalize_scalar(element),
            (Shape::Set, Value::List(list)) => {
                Value::Set(list.into_iter().map(|v| v.normalize_scalar(element)).collect())
            }
            (Shape::Set, Value::Set(set)) => {
                Value::Set(set.into_iter().map(|v| v.normalize_scalar(element)).collect())
            }
            (Shape::List, Value::List(list)) => {
                Value::List(list.into_iter().map(|v| v.normalize_scalar(element)).collect())
            }
            (Shape::List, Value::Set(set)) => {
                Value::List(set.into_iter().map(|v| v.normalize_scalar(element)).collect())
            }
            (Shape::Map, Value::Map(map)) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, v.normalize_scalar(element)))
                    .collect(),
            ),
            (Shape::Set, value @ (Value::Bool(_) | Value::Int(_) | Value::Str(_))) => {
                Value::Set(BTreeSet::from([value.normalize_scalar(element)]))
            }
            (Shape::List, value @ (Value::Bool(_) | Value::Int(_) | Value::Str(_))) => {
                Value::List(vec![value.normalize_scalar(element)])
            }
            (_, value) => value,
        }
    }

    fn normalize_scalar(self, ty: PropertyType) -> Value {
        match (ty, self) {
            (PropertyType::String, Value::Int(i)) => Value::Str(i.to_string()),
            (PropertyType::String, Value::Bool(b)) => Value::Str(b.to_string()),
            (PropertyType::Boolean, Value::Str(s)) => match parse_bool(&s) {
                Some(b) => Value::Bool(b),
                None => Value::Str(s),
            },
            (PropertyType::Integer, Value::Str(s)) => match s.trim().parse() {
                Ok(i) => Value::Int(i),
                Err(_) => Value::Str(s),
            },
            (_, value) => value,
        }
    }

    /// Merges `added` into the value in `current`, as done by
    /// [`StoreBuilder::add`](crate::StoreBuilder::add).
    ///
    /// Lists are appended to, sets and maps are extended. A single value is pushed into a list or
    /// inserted into a set. Scalars are replaced. Anything but a map added to a map is handed back
    /// and the map stays as it is.
    pub(crate) fn merge(current: &mut Option<Value>, added: Value) -> Result<(), Value> {
        match (current, added) {
            (Some(Value::List(list)), Value::List(more)) => list.extend(more),
            (Some(Value::List(list)), added) => list.push(added),
            (Some(Value::Set(set)), Value::Set(more)) => set.extend(more),
            (Some(Value::Set(set)), added) => {
                set.insert(added);
            }
            (Some(Value::Map(map)), Value::Map(more)) => map.extend(more),
            (Some(Value::Map(_)), added) => return Err(added),
            (slot, added) => *slot = Some(added),
        }
        Ok(())
    }

    /// Writes an unambiguous, type-tagged representation of this value.
    ///
    /// Strings are length-prefixed so that no two distinct values share a representation.
    pub fn write_canonical<W: Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(out, "b:{b}"),
            Value::Int(i) => write!(out, "i:{i}"),
            Value::Str(s) => write!(out, "s:{}:{s}", s.len()),
            Value::List(list) => {
                out.write_str("l[")?;
                for item in list {
                    item.write_canonical(out)?;
                    out.write_char(',')?;
                }
                out.write_char(']')
            }
            Value::Set(set) => {
                out.write_str("S[")?;
                for item in set {
                    item.write_canonical(out)?;
                    out.write_char(',')?;
                }
                out.write_char(']')
            }
            Value::Map(map) => {
                out.write_str("m{")?;
                for (key, item) in map {
                    write!(out, "{}:{key}=", key.len())?;
                    item.write_canonical(out)?;
                    out.write_char(',')?;
                }
                out.write_char('}')
            }
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => f.write_str(s),
            other => {
                let json = serde_json::to_string(other).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(i: $ty) -> Self {
                Value::Int(i as i64)
            }
        })*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(list: Vec<T>) -> Self {
        Value::List(list.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(list: [T; N]) -> Self {
        Value::List(list.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeSet<T>> for Value {
    fn from(set: BTreeSet<T>) -> Self {
        Value::Set(set.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, T: Into<Value>> From<BTreeMap<K, T>> for Value {
    fn from(map: BTreeMap<K, T>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Types that can be read out of a [`Value`].
///
/// Conversions are lenient: strings parse into numbers and booleans, scalars print into strings,
/// and lists and sets convert into each other.
pub trait FromValue: Sized {
    /// The name of the expected type, used in error messages.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Str(s) => parse_bool(s),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

macro_rules! from_value_int {
    ($($ty:ty),*) => {
        $(impl FromValue for $ty {
            const EXPECTED: &'static str = "integer";

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Int(i) => <$ty>::try_from(*i).ok(),
                    Value::Str(s) => s.trim().parse().ok(),
                    _ => None,
                }
            }
        })*
    };
}

from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(list) => list.iter().map(T::from_value).collect(),
            Value::Set(set) => set.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromValue + Ord> FromValue for BTreeSet<T> {
    const EXPECTED: &'static str = "set";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(list) => list.iter().map(T::from_value).collect(),
            Value::Set(set) => set.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    const EXPECTED: &'static str = "map";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| Some((k.clone(), T::from_value(v)?)))
                .collect(),
            _ => None,
        }
    }
}
