use std::fmt::{self};

use serde::{Deserialize, Serialize};

use super::{ElementError, Value};

/// A coordinate label along one dimension of a table.
///
/// Labels are the keys of label-keyed mappings as well, which is why
/// [`Value::Map`] is keyed by `Label`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Str(String),
}

impl Label {
    /// Returns the label as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// The text used for matching and display.
    pub fn text(&self) -> String { self.to_string() }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self { Self::Str(s.to_string()) }
}

impl From<String> for Label {
    fn from(s: String) -> Self { Self::Str(s) }
}

impl From<&String> for Label {
    fn from(s: &String) -> Self { Self::Str(s.clone()) }
}

impl From<i64> for Label {
    fn from(i: i64) -> Self { Self::Int(i) }
}

impl From<i32> for Label {
    fn from(i: i32) -> Self { Self::Int(i64::from(i)) }
}

impl From<usize> for Label {
    fn from(i: usize) -> Self { Self::Int(i as i64) }
}

impl From<Label> for Value {
    fn from(l: Label) -> Self {
        match l {
            Label::Int(i) => Value::Int(i),
            Label::Str(s) => Value::Str(s),
        }
    }
}

impl TryFrom<&Value> for Label {
    type Error = ElementError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Int(i) => Ok(Self::Int(*i)),
            Value::Str(s) => Ok(Self::Str(s.clone())),
            other => Err(ElementError::type_error(format!(
                "unhashable label type: '{}'", other.type_name(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Label::from("row1"), Label::Str("row1".into()));
        assert_eq!(Label::from(3usize), Label::Int(3));
        assert_eq!(Label::try_from(&Value::Int(2)).ok(), Some(Label::Int(2)));
        assert!(Label::try_from(&Value::Float(2.0)).is_err());
        assert_eq!(Label::Int(7).to_string(), "7");
    }

    #[test]
    fn serde_untagged() {
        let labels: Vec<Label> = serde_json::from_str(r#"["a", 1]"#).unwrap();
        assert_eq!(labels, vec![Label::from("a"), Label::Int(1)]);
    }
}
