use std::fmt;
use std::str::FromStr;

/// The kind of value a property holds, encoded in the last segment of its key.
///
/// A key like `"B.f2.i"` declares an integer, `"C.f3.b"` a boolean, and a key without a known
/// suffix such as `"A.f1"` defaults to [`PropertyType::String`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
pub enum PropertyType {
    #[default]
    String,
    Boolean,
    Integer,
    /// The name of a type.
    Class,
    /// Any value, stored as-is.
    Object,
    SetString,
    SetInteger,
    SetClass,
    SetObject,
    ListString,
    ListInteger,
    ListClass,
    ListObject,
    MapString,
    MapInteger,
    MapClass,
    MapObject,
}

/// The collection shape of a [`PropertyType`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Shape {
    Scalar,
    Set,
    List,
    Map,
}

impl PropertyType {
    /// Returns the key suffix for this type.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::String => "s",
            Self::Boolean => "b",
            Self::Integer => "i",
            Self::Class => "c",
            Self::Object => "o",
            Self::SetString => "ss",
            Self::SetInteger => "si",
            Self::SetClass => "sc",
            Self::SetObject => "so",
            Self::ListString => "ls",
            Self::ListInteger => "li",
            Self::ListClass => "lc",
            Self::ListObject => "lo",
            Self::MapString => "sms",
            Self::MapInteger => "smi",
            Self::MapClass => "smc",
            Self::MapObject => "smo",
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            Self::String | Self::Boolean | Self::Integer | Self::Class | Self::Object => {
                Shape::Scalar
            }
            Self::SetString | Self::SetInteger | Self::SetClass | Self::SetObject => Shape::Set,
            Self::ListString | Self::ListInteger | Self::ListClass | Self::ListObject => {
                Shape::List
            }
            Self::MapString | Self::MapInteger | Self::MapClass | Self::MapObject => Shape::Map,
        }
    }

    /// The scalar type of the elements of a collection type.
    ///
    /// Scalar types return themselves.
    pub fn element(self) -> PropertyType {
        match self {
            Self::SetString | Self::ListString | Self::MapString => Self::String,
            Self::SetInteger | Self::ListInteger | Self::MapInteger => Self::Integer,
            Self::SetClass | Self::ListClass | Self::MapClass => Self::Class,
            Self::SetObject | Self::ListObject | Self::MapObject => Self::Object,
            scalar => scalar,
        }
    }
}

impl FromStr for PropertyType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        Ok(match s {
            "s" => Self::String,
            "b" => Self::Boolean,
            "i" => Self::Integer,
            "c" => Self::Class,
            "o" => Self::Object,
            "ss" => Self::SetString,
            "si" => Self::SetInteger,
            "sc" => Self::SetClass,
            "so" => Self::SetObject,
            "ls" => Self::ListString,
            "li" => Self::ListInteger,
            "lc" => Self::ListClass,
            "lo" => Self::ListObject,
            "sms" => Self::MapString,
            "smi" => Self::MapInteger,
            "smc" => Self::MapClass,
            "smo" => Self::MapObject,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// A parsed property key of the form `"<Group>.<Name>[.<Kind>]"`.
///
/// The group is everything before the first `.`. A key without any `.` belongs to the empty
/// group, which no context can read from.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PropertyKey {
    key: String,
    group_len: usize,
    name_end: usize,
    property_type: PropertyType,
}

impl PropertyKey {
    pub fn parse(key: impl Into<String>) -> Self {
        let key = key.into();
        let Some((group, rest)) = key.split_once('.') else {
            return Self {
                group_len: 0,
                name_end: key.len(),
                property_type: PropertyType::String,
                key,
            };
        };
        let group_len = group.len();

        let (name_end, property_type) = match rest.rsplit_once('.') {
            Some((name, suffix)) => match suffix.parse() {
                Ok(ty) => (group_len + 1 + name.len(), ty),
                Err(()) => (key.len(), PropertyType::String),
            },
            None => (key.len(), PropertyType::String),
        };

        Self {
            key,
            group_len,
            name_end,
            property_type,
        }
    }

    /// The full key, exactly as it was given.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn group(&self) -> &str {
        &self.key[..self.group_len]
    }

    pub fn name(&self) -> &str {
        if self.group_len == 0 && !self.key.starts_with('.') {
            return &self.key[..self.name_end];
        }
        &self.key[self.group_len + 1..self.name_end]
    }

    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
