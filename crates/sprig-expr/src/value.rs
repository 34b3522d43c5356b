//! Expression values
//!
//! Store data (decoded JSON) and literal results share one value type
//! with JS-like truthiness. `render()` is the markup-producing
//! stringification used when a result is injected into an element.

use crate::ExprError;

/// An expression value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Structured data (objects and arrays) from the state store
    Data(serde_json::Value),
}

impl Value {
    /// Truthiness: undefined, null, false, 0, NaN, and "" are falsy
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Data(_) => true,
        }
    }

    /// Human-readable kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Data(v) if v.is_array() => "array",
            Value::Data(_) => "object",
        }
    }

    /// Read a named property
    ///
    /// Missing properties are `undefined`; reading through
    /// undefined/null is an error (the author dereferenced nothing).
    pub fn member(&self, name: &str) -> Result<Value, ExprError> {
        match self {
            Value::Undefined | Value::Null => Err(ExprError::Type(format!(
                "cannot read property '{}' of {}",
                name,
                self.kind()
            ))),
            Value::Str(s) if name == "length" => Ok(Value::Number(s.chars().count() as f64)),
            Value::Data(serde_json::Value::Array(items)) if name == "length" => {
                Ok(Value::Number(items.len() as f64))
            }
            Value::Data(serde_json::Value::Object(map)) => {
                Ok(map.get(name).cloned().map_or(Value::Undefined, Value::from))
            }
            _ => Ok(Value::Undefined),
        }
    }

    /// Read an indexed element
    pub fn index(&self, index: &Value) -> Result<Value, ExprError> {
        match (self, index) {
            (Value::Undefined | Value::Null, _) => Err(ExprError::Type(format!(
                "cannot index {}",
                self.kind()
            ))),
            (Value::Data(serde_json::Value::Array(items)), Value::Number(n)) => {
                let i = *n as usize;
                Ok(items.get(i).cloned().map_or(Value::Undefined, Value::from))
            }
            (_, Value::Str(key)) => self.member(key),
            _ => Ok(Value::Undefined),
        }
    }

    /// Markup string injected into an element
    ///
    /// Strings come out raw (no escaping, per the trust model);
    /// structured values serialize as JSON.
    pub fn render(&self) -> String {
        match self {
            Value::Undefined | Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => render_number(*n),
            Value::Str(s) => s.clone(),
            Value::Data(v) => v.to_string(),
        }
    }
}

fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Str(s),
            other => Value::Data(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.truthy());
        assert!(!Value::Null.truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(Value::Number(1.5).truthy());
        assert!(Value::Str("x".into()).truthy());
        assert!(Value::Data(json!([])).truthy());
    }

    #[test]
    fn test_member_access() {
        let obj = Value::from(json!({"items": ["a", "b"], "count": 2}));
        assert_eq!(obj.member("count").unwrap(), Value::Number(2.0));
        assert_eq!(obj.member("missing").unwrap(), Value::Undefined);

        let items = obj.member("items").unwrap();
        assert_eq!(items.member("length").unwrap(), Value::Number(2.0));
        assert_eq!(items.index(&Value::Number(1.0)).unwrap(), Value::Str("b".into()));
        assert_eq!(items.index(&Value::Number(9.0)).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_member_of_undefined_errors() {
        let err = Value::Undefined.member("x").unwrap_err();
        assert!(err.to_string().contains("property 'x'"));
        assert!(Value::Null.member("x").is_err());
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::Str("<b>hi</b>".into()).render(), "<b>hi</b>");
        assert_eq!(Value::Number(3.0).render(), "3");
        assert_eq!(Value::Number(2.5).render(), "2.5");
        assert_eq!(Value::Undefined.render(), "");
        assert_eq!(Value::from(json!(["a"])).render(), "[\"a\"]");
    }
}
