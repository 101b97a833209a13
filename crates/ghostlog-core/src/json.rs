//! JSON serialization of console values.
//!
//! [`JsonView`] serializes a [`Value`] through serde with the semantics a
//! scripting host's `JSON.stringify` has: `undefined`, functions and symbols
//! are skipped inside objects and become `null` inside arrays, non-finite
//! numbers become `null`, dates become ISO strings and patterns empty objects.
//! Cycles, big integers, errors and unserializable top-level values are
//! serialization failures the caller must fall back from.

use std::cell::RefCell;

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::inspect::date_to_iso;
use crate::value::{Object, PropertyKey, Value};

/// Serializable view over a value.
pub struct JsonView<'a> {
    value: &'a Value,
    path: &'a RefCell<Vec<usize>>,
}

/// Serializes `value` as compact JSON.
pub fn to_json(value: &Value) -> serde_json::Result<String> {
    let path = RefCell::new(Vec::new());
    serde_json::to_string(&JsonView::new(value, &path)?)
}

/// Serializes `value` as JSON indented by two spaces.
pub fn to_json_pretty(value: &Value) -> serde_json::Result<String> {
    let path = RefCell::new(Vec::new());
    serde_json::to_string_pretty(&JsonView::new(value, &path)?)
}

impl<'a> JsonView<'a> {
    fn new(value: &'a Value, path: &'a RefCell<Vec<usize>>) -> serde_json::Result<Self> {
        if is_skipped(value) {
            return Err(serde_json::Error::custom(format!(
                "{} is not serializable",
                value.kind()
            )));
        }
        Ok(Self { value, path })
    }

    fn child<'b>(&self, value: &'b Value) -> JsonView<'b>
    where
        'a: 'b,
    {
        JsonView {
            value,
            path: self.path,
        }
    }
}

fn is_skipped(value: &Value) -> bool {
    matches!(
        value,
        Value::Undefined | Value::Function(_) | Value::Symbol(_)
    )
}

impl Serialize for JsonView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Undefined | Value::Function(_) | Value::Symbol(_) | Value::Null => {
                serializer.serialize_unit()
            }
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if !n.is_finite() => serializer.serialize_unit(),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::BigInt(_) => Err(S::Error::custom("BigInt value can't be serialized")),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(date) => serializer.serialize_str(&date_to_iso(date)),
            Value::Pattern(_) => serializer.serialize_map(Some(0))?.end(),
            Value::Error(_) => Err(S::Error::custom("error values are not serialized")),
            Value::Object(object) => self.serialize_object(object, serializer),
        }
    }
}

impl JsonView<'_> {
    fn serialize_object<S: Serializer>(
        &self,
        object: &Object,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let id = object.id();
        if self.path.borrow().contains(&id) {
            return Err(S::Error::custom("converting circular structure to JSON"));
        }
        self.path.borrow_mut().push(id);
        let result = if object.is_array() {
            let values = object.values();
            let mut seq = serializer.serialize_seq(Some(values.len()))?;
            for value in &values {
                seq.serialize_element(&self.child(value))?;
            }
            seq.end()
        } else {
            let entries = object.entries();
            let mut map = serializer.serialize_map(None)?;
            for (key, value) in &entries {
                let PropertyKey::Name(name) = key else {
                    continue;
                };
                if is_skipped(value) {
                    continue;
                }
                map.serialize_entry(name, &self.child(value))?;
            }
            map.end()
        };
        self.path.borrow_mut().pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ErrorValue;

    #[test]
    fn test_compact_object() {
        let obj = Object::from_entries([("a", Value::from(1)), ("b", Value::from("x"))]);
        assert_eq!(to_json(&obj.into()).unwrap(), r#"{"a":1,"b":"x"}"#);
    }

    #[test]
    fn test_pretty_indents_two_spaces() {
        let obj = Object::from_entries([("a", Value::from(Object::from_values([1, 2])))]);
        assert_eq!(
            to_json_pretty(&obj.into()).unwrap(),
            "{\n  \"a\": [\n    1,\n    2\n  ]\n}"
        );
    }

    #[test]
    fn test_skips_and_nulls() {
        let obj = Object::new();
        obj.set("u", Value::Undefined);
        obj.set("f", Value::function("f"));
        obj.set("n", Value::Number(f64::NAN));
        obj.set("arr", Object::from_values([Value::Undefined, Value::from(1.5)]));
        obj.set(PropertyKey::Symbol("s".into()), 1);
        assert_eq!(to_json(&obj.into()).unwrap(), r#"{"n":null,"arr":[null,1.5]}"#);
    }

    #[test]
    fn test_cycle_fails() {
        let obj = Object::new();
        obj.set("self", obj.clone());
        assert!(to_json(&obj.into()).is_err());
    }

    #[test]
    fn test_shared_sibling_is_fine() {
        let shared = Object::from_entries([("v", 1)]);
        let root = Object::from_entries([("x", shared.clone()), ("y", shared)]);
        assert_eq!(to_json(&root.into()).unwrap(), r#"{"x":{"v":1},"y":{"v":1}}"#);
    }

    #[test]
    fn test_unserializable_values_fail() {
        assert!(to_json(&Value::Undefined).is_err());
        assert!(to_json(&Value::BigInt(1)).is_err());
        assert!(to_json(&ErrorValue::new("x").into()).is_err());
    }
}
