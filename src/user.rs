use std::collections::HashMap;

use derive_more::From;
use serde::{Deserialize, Serialize};

/// The user an experiment is evaluated for.
///
/// Only `user_id` takes part in bucketing. The remaining fields travel with exposure events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom: HashMap<String, AttributeValue>,
}

impl User {
    pub fn new(user_id: impl Into<String>) -> Self {
        User {
            user_id: user_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, PartialOrd, From, Clone)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}
impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AttributeValue, User};

    #[test]
    fn serializes_wire_names() {
        let user = User {
            email: Some("someone@example.com".to_owned()),
            custom: [
                ("tier".to_owned(), AttributeValue::from("gold")),
                ("beta".to_owned(), AttributeValue::from(true)),
            ]
            .into(),
            ..User::new("123")
        };

        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({
                "userID": "123",
                "email": "someone@example.com",
                "custom": { "tier": "gold", "beta": true }
            })
        );
    }

    #[test]
    fn omits_empty_fields() {
        assert_eq!(
            serde_json::to_value(User::new("abc")).unwrap(),
            json!({ "userID": "abc" })
        );
    }

    #[test]
    fn attribute_value_conversions() {
        assert_eq!(AttributeValue::from(1.5), AttributeValue::Number(1.5));
        assert_eq!(
            AttributeValue::from("x"),
            AttributeValue::String("x".to_owned())
        );
    }
}
