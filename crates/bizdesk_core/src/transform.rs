//! Key mapping between the external JSON surface and persisted records.
//!
//! # Responsibility
//! - Convert object keys between camelCase (wire) and snake_case (storage).
//! - Provide the two boundary helpers used when decoding requests and
//!   encoding responses.
//!
//! # Invariants
//! - Only object keys are rewritten; values are never modified.
//! - Both conversions are idempotent on keys already in the target style.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Converts one key to snake_case.
///
/// Uppercase runs stay together (`HTTPStatus` → `http_status`) and `-` or
/// spaces become `_`.
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (index, &current) in chars.iter().enumerate() {
        if current == '-' || current == ' ' {
            out.push('_');
            continue;
        }
        if !current.is_ascii_uppercase() {
            out.push(current);
            continue;
        }

        let previous = index.checked_sub(1).map(|i| chars[i]);
        let next = chars.get(index + 1).copied();
        let starts_word = match previous {
            None | Some('_') | Some('-') | Some(' ') => false,
            Some(prev) if prev.is_ascii_lowercase() || prev.is_ascii_digit() => true,
            Some(prev) if prev.is_ascii_uppercase() => {
                next.is_some_and(|next| next.is_ascii_lowercase())
            }
            Some(_) => false,
        };
        if starts_word && !out.ends_with('_') {
            out.push('_');
        }
        out.push(current.to_ascii_lowercase());
    }

    out
}

/// Converts one key to camelCase.
///
/// Leading underscores are preserved; inner underscores start a new word.
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    let mut seen_word = false;

    for current in key.chars() {
        if current == '_' {
            if seen_word {
                upper_next = true;
            } else {
                out.push('_');
            }
            continue;
        }

        seen_word = true;
        if upper_next {
            out.push(current.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(current);
        }
    }

    out
}

/// Recursively rewrites every object key to snake_case.
pub fn keys_to_snake(value: Value) -> Value {
    map_keys(value, &to_snake_case)
}

/// Recursively rewrites every object key to camelCase.
pub fn keys_to_camel(value: Value) -> Value {
    map_keys(value, &to_camel_case)
}

/// Decodes an external (camelCase) JSON payload into a storage-shaped type.
pub fn from_external<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(keys_to_snake(value))
}

/// Encodes a storage-shaped value into its external (camelCase) JSON form.
pub fn to_external<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value).map(keys_to_camel)
}

fn map_keys(value: Value, convert: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(object) => {
            let mut mapped = Map::with_capacity(object.len());
            for (key, inner) in object {
                mapped.insert(convert(&key), map_keys(inner, convert));
            }
            Value::Object(mapped)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| map_keys(item, convert))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{from_external, keys_to_camel, keys_to_snake, to_camel_case, to_snake_case};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn snake_case_handles_common_key_shapes() {
        assert_eq!(to_snake_case("createdAt"), "created_at");
        assert_eq!(to_snake_case("projectId"), "project_id");
        assert_eq!(to_snake_case("HTTPStatus"), "http_status");
        assert_eq!(to_snake_case("userID"), "user_id");
        assert_eq!(to_snake_case("addressLine2"), "address_line2");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("page-size"), "page_size");
    }

    #[test]
    fn camel_case_handles_common_key_shapes() {
        assert_eq!(to_camel_case("created_at"), "createdAt");
        assert_eq!(to_camel_case("amount_cents"), "amountCents");
        assert_eq!(to_camel_case("address_line2"), "addressLine2");
        assert_eq!(to_camel_case("alreadyCamel"), "alreadyCamel");
        assert_eq!(to_camel_case("_private_field"), "_privateField");
    }

    #[test]
    fn key_mapping_recurses_but_leaves_values_alone() {
        let external = json!({
            "projectId": "p-1",
            "teamMembers": [{"employeeId": "e-1", "displayName": "someValue"}],
            "meta": {"pageSize": 20}
        });

        let stored = keys_to_snake(external.clone());
        assert_eq!(
            stored,
            json!({
                "project_id": "p-1",
                "team_members": [{"employee_id": "e-1", "display_name": "someValue"}],
                "meta": {"page_size": 20}
            })
        );
        assert_eq!(keys_to_camel(stored), external);
    }

    #[test]
    fn from_external_decodes_camel_payload_into_snake_struct() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Input {
            first_name: String,
            hire_date: Option<String>,
        }

        let decoded: Input =
            from_external(json!({"firstName": "Ada", "hireDate": "2024-01-02"})).unwrap();
        assert_eq!(
            decoded,
            Input {
                first_name: "Ada".to_string(),
                hire_date: Some("2024-01-02".to_string()),
            }
        );
    }
}
