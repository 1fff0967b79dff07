//! Customer details attached to a sale.
//!
//! Older sales files store the customer as a bare string, leave it out
//! entirely, or store an object with only some of the keys. All of those
//! shapes are read through [`LegacyCustomer`] and collapse into a
//! [`Customer`] with every field present. Nothing downstream of
//! deserialization ever sees the legacy shape.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Canonical customer record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Customer {
    /// Build a customer from its three parts.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Normalize any stored `customer` value into the canonical form.
    #[must_use]
    pub fn normalize(value: &Value) -> Self {
        LegacyCustomer::from(value.clone()).normalize()
    }

    /// True when no field carries any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.phone.is_empty()
    }
}

/// Every shape the `customer` field has been stored as.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyCustomer {
    /// Field missing or `null`.
    Missing,
    /// Bare string holding the customer's name.
    Text(String),
    /// Object, possibly with missing keys.
    Fields(Map<String, Value>),
    /// Anything else (numbers, arrays); treated as missing.
    Unrecognized(Value),
}

impl From<Value> for LegacyCustomer {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Missing,
            Value::String(text) => Self::Text(text),
            Value::Object(fields) => Self::Fields(fields),
            other => Self::Unrecognized(other),
        }
    }
}

impl LegacyCustomer {
    /// Resolve into the canonical customer.
    #[must_use]
    pub fn normalize(self) -> Customer {
        match self {
            Self::Missing | Self::Unrecognized(_) => Customer::default(),
            Self::Text(name) => Customer {
                name: name.trim().to_owned(),
                ..Customer::default()
            },
            Self::Fields(fields) => Customer {
                name: field_text(&fields, "name"),
                email: field_text(&fields, "email"),
                phone: field_text(&fields, "phone"),
            },
        }
    }
}

/// Scalars become text, everything else becomes empty.
fn field_text(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Serde adapter for fields holding a customer in any legacy shape.
///
/// # Errors
///
/// Only fails when the input is not valid JSON at all.
pub fn deserialize_legacy<'de, D>(deserializer: D) -> Result<Customer, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(LegacyCustomer::from(value).normalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_missing() {
        assert_eq!(Customer::normalize(&Value::Null), Customer::default());
    }

    #[test]
    fn test_normalize_string() {
        let customer = Customer::normalize(&json!("Ana Pérez"));
        assert_eq!(customer, Customer::new("Ana Pérez", "", ""));
    }

    #[test]
    fn test_normalize_partial_object() {
        let customer = Customer::normalize(&json!({"name": "Luis", "phone": 5551234}));
        assert_eq!(customer.name, "Luis");
        assert_eq!(customer.email, "");
        assert_eq!(customer.phone, "5551234");
    }

    #[test]
    fn test_normalize_unrecognized_shape() {
        assert!(Customer::normalize(&json!([1, 2])).is_empty());
        assert!(Customer::normalize(&json!({"name": null})).is_empty());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let shapes = [
            Value::Null,
            json!("Walk-in"),
            json!({"email": "a@b.c"}),
            json!({"name": "Full", "email": "f@x.io", "phone": "1"}),
        ];

        for shape in shapes {
            let once = Customer::normalize(&shape);
            let twice = Customer::normalize(&serde_json::to_value(&once).unwrap());
            assert_eq!(once, twice, "normalizing {shape} twice changed the result");
        }
    }

    #[test]
    fn test_deserialize_legacy_adapter() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "deserialize_legacy")]
            customer: Customer,
        }

        let absent: Holder = serde_json::from_str("{}").unwrap();
        assert!(absent.customer.is_empty());

        let text: Holder = serde_json::from_str(r#"{"customer": "Rosa"}"#).unwrap();
        assert_eq!(text.customer.name, "Rosa");
    }
}
