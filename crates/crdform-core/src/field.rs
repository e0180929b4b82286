//! Tri-state field presence

/// A field that is either absent, explicitly null, or holds a value
///
/// `Unset` and `Null` are never conflated with a zero value: a field missing
/// from a document decodes to `Unset`, an explicit `null` decodes to `Null`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field<T> {
    #[default]
    Unset,
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the field holds a value
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Self::Unset => Field::Unset,
            Self::Null => Field::Null,
            Self::Value(v) => Field::Value(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Unset => Field::Unset,
            Self::Null => Field::Null,
            Self::Value(v) => Field::Value(f(v)),
        }
    }

    /// Keep `self` when it holds a value, otherwise fall back to `other`
    pub fn or(self, other: Field<T>) -> Field<T> {
        match self {
            Self::Value(_) => self,
            _ => other,
        }
    }

    /// `None` maps to `Unset`
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Unset,
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}
