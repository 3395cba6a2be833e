use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar attribute value stored on a document node.
///
/// Values are the only payload a node attribute can carry. They map
/// directly onto YAML scalars (and sequences of scalars), so a saved
/// document stays human-readable and hand-editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Real(f64),
    /// A free-form or enumerated string.
    Str(String),
    /// An ordered list of scalar values.
    List(Vec<Value>),
}

impl Value {
    /// Returns the boolean payload, if this value is a [`Value::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer payload, if this value is a [`Value::Int`].
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric payload as a float.
    ///
    /// Integers are widened, since a hand-edited document will often
    /// contain `1` where the model expects `1.0`.
    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(r) => Some(*r),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the string payload, if this value is a [`Value::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list payload, if this value is a [`Value::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_widens_to_real() {
        assert_eq!(Value::Int(3).as_real(), Some(3.0));
        assert_eq!(Value::Real(3.5).as_real(), Some(3.5));
        assert_eq!(Value::Str("3".to_string()).as_real(), None);
    }

    #[test]
    fn typed_accessors_reject_other_variants() {
        let value = Value::Str("wall".to_string());
        assert_eq!(value.as_str(), Some("wall"));
        assert_eq!(value.as_bool(), None);
        assert_eq!(value.as_int(), None);
        assert_eq!(value.as_list(), None);
    }

    #[test]
    fn yaml_representation_is_scalar() {
        let yaml = serde_yaml::to_string(&Value::Real(1.5)).unwrap();
        assert_eq!(yaml.trim(), "1.5");

        let back: Value = serde_yaml::from_str("true").unwrap();
        assert_eq!(back, Value::Bool(true));

        let list: Value = serde_yaml::from_str("[1, 2, 3]").unwrap();
        assert_eq!(
            list,
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn display_joins_lists() {
        let value = Value::List(vec![Value::Int(1), Value::Str("a".to_string())]);
        assert_eq!(value.to_string(), "[1, a]");
    }
}
