use std::str::FromStr;

use serde_json::{Map, Number, Value};

use super::Element;
use crate::node::Node;

/// Attribute recording which JSON value an element was built from.
pub const TYPE_ATTRIBUTE: &str = "type";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl JsonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Bool => "bool",
            JsonType::Null => "null",
        }
    }

    fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => JsonType::Object,
            Value::Array(_) => JsonType::Array,
            Value::String(_) => JsonType::String,
            Value::Number(_) => JsonType::Number,
            Value::Bool(_) => JsonType::Bool,
            Value::Null => JsonType::Null,
        }
    }
}

impl FromStr for JsonType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "object" => Ok(JsonType::Object),
            "array" => Ok(JsonType::Array),
            "string" => Ok(JsonType::String),
            "number" => Ok(JsonType::Number),
            "bool" => Ok(JsonType::Bool),
            "null" => Ok(JsonType::Null),
            _ => Err(()),
        }
    }
}

impl Element {
    /// Builds a tree from a JSON value. Object members become children named
    /// by their key, array items become children with an empty name.
    pub fn from_json(name: &str, value: &Value) -> Self {
        let element = Element::new(name).with_attribute(TYPE_ATTRIBUTE, JsonType::of(value).as_str());

        match value {
            Value::Object(members) => {
                element.with_children(members.iter().map(|(key, value)| Element::from_json(key, value)))
            }
            Value::Array(items) => element.with_children(items.iter().map(|item| Element::from_json("", item))),
            Value::String(s) => element.with_text(Some(s.as_str())),
            Value::Number(n) => element.with_text(Some(number_text(n).as_str())),
            Value::Bool(b) => element.with_text(Some(if *b { "true" } else { "false" })),
            Value::Null => element,
        }
    }

    pub fn json_type(&self) -> Option<JsonType> {
        self.attribute(TYPE_ATTRIBUTE).and_then(|t| t.parse().ok())
    }

    /// Converts the subtree back to JSON. Elements without a recognised
    /// `type` attribute become objects when they have children, strings
    /// when they carry text and `null` otherwise.
    pub fn to_json(&self) -> Value {
        let json_type = self.json_type().unwrap_or_else(|| {
            if self.child_count() > 0 {
                JsonType::Object
            } else if self.text().is_some() {
                JsonType::String
            } else {
                JsonType::Null
            }
        });

        match json_type {
            JsonType::Object => Value::Object(
                self.children()
                    .iter()
                    .map(|child| (child.name().to_string(), child.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            JsonType::Array => Value::Array(self.children().iter().map(Element::to_json).collect()),
            JsonType::String => Value::String(self.text().unwrap_or_default()),
            JsonType::Number => self
                .text()
                .and_then(|text| Number::from_str(&text).ok())
                .map(Value::Number)
                .unwrap_or(Value::Null),
            JsonType::Bool => Value::Bool(self.text().as_deref() == Some("true")),
            JsonType::Null => Value::Null,
        }
    }
}

/// The text of a JSON number, the same for every literal of one value
/// (`2`, `2.0` and `2e0` all read `2`).
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => crate::number::Number::new(f).to_string(),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({"a": 1, "b": [true, null, "x"]}))]
    #[case(json!([1.5, {"c": {}}]))]
    #[case(json!("plain"))]
    #[case(json!(null))]
    fn test_json_survives_conversion(#[case] value: Value) {
        assert_eq!(Element::from_json("", &value).to_json(), value);
    }

    #[test]
    fn test_from_json_shape() {
        let element = Element::from_json("", &json!({"users": [{"name": "a"}]}));
        let users = element.child(0).unwrap();
        let name = users.child(0).unwrap().child(0).unwrap();

        assert_eq!(users.name(), "users");
        assert_eq!(users.json_type(), Some(JsonType::Array));
        assert_eq!(users.child(0).unwrap().name(), "");
        assert_eq!(name.name(), "name");
        assert_eq!(name.text().as_deref(), Some("a"));
    }

    #[rstest]
    #[case(json!(2), "2")]
    #[case(json!(2.0), "2")]
    #[case(json!(-0.5), "-0.5")]
    #[case(json!(18446744073709551615u64), "18446744073709551615")]
    fn test_number_text(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(Element::from_json("n", &value).text().as_deref(), Some(expected));
    }

    #[test]
    fn test_untyped_elements() {
        let element = Element::new("r").with_children([Element::leaf("a", "x"), Element::new("b")]);

        assert_eq!(element.to_json(), json!({"a": "x", "b": null}));
    }
}
