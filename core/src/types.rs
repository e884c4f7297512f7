//! Account DTOs for the Accounts API.
//!
//! # Design
//! The client only ever inspects `id` (and reads `version` when asked for a
//! delete token). Every other key lives in the flattened `fields` map exactly
//! as it arrived, so explicit nulls, empty arrays and keys this crate has
//! never heard of survive a round trip untouched. These types are defined
//! independently from the mock-server crate; integration tests catch schema
//! drift.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON wrapper used for every body on the wire: `{"data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// An account record as exchanged with the Accounts service.
///
/// `AccountData::default()` is the zero record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    #[serde(default)]
    pub id: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl AccountData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Sets a top-level key, replacing any previous value.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Optimistic-concurrency version assigned by the server, whether it was
    /// sent as a number or a numeric string.
    pub fn version(&self) -> Option<i64> {
        match self.fields.get("version")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The version string to pass to a delete call. Accounts that have not been
    /// round-tripped through the server yet are at version `0`.
    pub fn version_token(&self) -> String {
        match self.fields.get("version") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_fields_pass_through() {
        let raw = r#"{
            "id": "ad27e265-9605-4b4b-a0e5-3003ea9cc4dc",
            "type": "accounts",
            "created_on": "2021-01-01T00:00:00Z",
            "attributes": {
                "country": "GB",
                "name_matching_status": "supported"
            }
        }"#;
        let account: AccountData = serde_json::from_str(raw).unwrap();
        assert_eq!(account.field("type"), Some(&json!("accounts")));
        assert_eq!(account.fields["attributes"]["name_matching_status"], "supported");

        let back = serde_json::to_value(&account).unwrap();
        let original: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn nulls_and_empty_arrays_survive_a_round_trip() {
        let original = json!({
            "id": "x",
            "organisation_id": null,
            "attributes": {
                "name": [],
                "joint_account": null,
                "alternative_names": []
            }
        });
        let account: AccountData = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&account).unwrap(), original);
    }

    #[test]
    fn loosely_typed_keys_are_accepted() {
        let account: AccountData =
            serde_json::from_value(json!({ "id": "x", "version": "3", "attributes": { "joint_account": "yes" } }))
                .unwrap();
        assert_eq!(account.version(), Some(3));
        assert_eq!(account.version_token(), "3");
        assert_eq!(account.fields["attributes"]["joint_account"], "yes");
    }

    #[test]
    fn builder_sets_fields() {
        let account = AccountData::new("abc").with_field("type", json!("accounts"));
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json, json!({ "id": "abc", "type": "accounts" }));
    }

    #[test]
    fn envelope_wraps_data() {
        let envelope = Envelope {
            data: AccountData::new("abc").with_field("version", json!(2)),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["data"]["id"], "abc");
        assert_eq!(json["data"]["version"], 2);
    }

    #[test]
    fn version_token_defaults_to_zero() {
        let account = AccountData::default();
        assert_eq!(account.version(), None);
        assert_eq!(account.version_token(), "0");
        let account = account.with_field("version", json!(7));
        assert_eq!(account.version(), Some(7));
        assert_eq!(account.version_token(), "7");
    }
}
