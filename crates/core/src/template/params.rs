//! Parameter substitution for `{name}` placeholders.
//!
//! Substitution is all-or-nothing: every supplied parameter must appear in
//! the text at least once, and only string or integer values are accepted.
//! Values are spliced in verbatim and the result is tokenized afterwards,
//! so a value that contains marker text will introduce a marker. That is
//! accepted behavior; parameters come from the conversation owner.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Named values to splice into a template.
///
/// Values are held as loosely typed JSON values so that whatever the
/// configuration document contained reaches [`substitute`], which is
/// where unsupported kinds are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, Value>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameters in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Replace every `{name}` in `text` with its value.
///
/// Parameters are applied one at a time in ascending name order; each
/// placeholder must be present in the text as it stands when its turn
/// comes. The first failure aborts the whole substitution.
pub fn substitute(text: &str, params: &ParameterSet) -> Result<String> {
    let mut out = text.to_string();

    for (name, value) in params.iter() {
        let placeholder = format!("{{{name}}}");
        if !out.contains(&placeholder) {
            return Err(Error::Parameter {
                name: name.to_string(),
            });
        }

        let rendered = render(name, value)?;
        out = out.replace(&placeholder, &rendered);
        tracing::trace!(param = name, "Substituted template parameter");
    }

    Ok(out)
}

fn render(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(Error::Type {
            name: name.to_string(),
            kind: kind_of(other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_value_replaced_everywhere() {
        let params = ParameterSet::new().with("topic", "rainbows");
        let out = substitute("Write a haiku about {topic}. Only {topic}!", &params).unwrap();
        assert_eq!(out, "Write a haiku about rainbows. Only rainbows!");
    }

    #[test]
    fn integer_value_rendered_in_decimal() {
        let params = ParameterSet::new().with("lines", -3).with("count", 17);
        let out = substitute("{count} haiku of {lines} lines", &params).unwrap();
        assert_eq!(out, "17 haiku of -3 lines");
    }

    #[test]
    fn no_supplied_placeholder_survives() {
        let params: ParameterSet = [("a", "x"), ("b", "y")].into_iter().collect();
        let out = substitute("{a}{b}{a} {c}", &params).unwrap();
        assert!(!out.contains("{a}"));
        assert!(!out.contains("{b}"));
        assert!(out.contains("{c}"));
    }

    #[test]
    fn unused_parameter_fails_with_its_name() {
        let params = ParameterSet::new().with("color", "blue");
        let err = substitute("# user\nno placeholders here", &params).unwrap_err();
        match err {
            Error::Parameter { name } => assert_eq!(name, "color"),
            other => panic!("expected parameter error, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_kinds_fail_with_their_type() {
        let cases = [
            (json!(0.5), "float"),
            (json!(true), "boolean"),
            (json!(["a"]), "array"),
            (json!({"k": 1}), "table"),
            (Value::Null, "null"),
        ];
        for (value, expected) in cases {
            let params = ParameterSet::new().with("p", value);
            match substitute("{p}", &params).unwrap_err() {
                Error::Type { name, kind } => {
                    assert_eq!(name, "p");
                    assert_eq!(kind, expected);
                }
                other => panic!("expected type error, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_set_is_identity() {
        let text = "# system\n{literal braces stay}";
        assert_eq!(substitute(text, &ParameterSet::new()).unwrap(), text);
    }

    #[test]
    fn deserializes_from_mixed_map() {
        let params: ParameterSet =
            serde_json::from_value(json!({"topic": "rain", "count": 3})).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("count"), Some(&json!(3)));
    }
}
