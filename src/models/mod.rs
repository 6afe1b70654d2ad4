pub mod role;
pub mod user;

pub use role::{AssignRoleRequest, CreateRoleRequest, MessageResponse, Role, RoleResponse, UserRole};
pub use user::{CreateUserRequest, NewUser, User, UserDraft, UserResponse, ValidatedUser};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{FieldErrors, FIELD_BLANK, FIELD_NULL, FIELD_REQUIRED, NOT_A_STRING};

/// Raw request field: `None` when the key is absent, `Some(Value::Null)` for
/// an explicit `null`.
pub type RawField = Option<Value>;

// Pair with `#[serde(default)]` so absent keys stay `None` while an explicit
// null is kept as `Some(Value::Null)`.
fn present<'de, D>(deserializer: D) -> Result<RawField, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// Strings pass through and numbers are rendered as text; null, booleans and
// containers are rejected.
fn scalar_text(errors: &mut FieldErrors, field: &str, value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => {
            errors.add(field, FIELD_NULL);
            None
        }
        _ => {
            errors.add(field, NOT_A_STRING);
            None
        }
    }
}

// Required text: trim, then reject absent or blank values.
fn required_text(errors: &mut FieldErrors, field: &str, value: RawField) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, FIELD_REQUIRED);
        return None;
    };
    let text = scalar_text(errors, field, value)?.trim().to_string();
    if text.is_empty() {
        errors.add(field, FIELD_BLANK);
        return None;
    }
    Some(text)
}

// Optional text defaults to empty; blank is allowed.
fn optional_text(errors: &mut FieldErrors, field: &str, value: RawField) -> String {
    value
        .and_then(|v| scalar_text(errors, field, v))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

// Records an error and returns true when `value` is too long.
fn check_max_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) -> bool {
    let too_long = value.chars().count() > max;
    if too_long {
        errors.add(
            field,
            format!("Ensure this field has no more than {max} characters."),
        );
    }
    too_long
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "present")]
        field: RawField,
    }

    fn field_of(body: Value) -> RawField {
        serde_json::from_value::<Body>(body).unwrap().field
    }

    #[test]
    fn distinguishes_absent_from_null() {
        assert_eq!(field_of(json!({})), None);
        assert_eq!(field_of(json!({ "field": null })), Some(Value::Null));
    }

    #[test]
    fn numbers_become_text() {
        let mut errors = FieldErrors::new();
        let text = required_text(&mut errors, "field", field_of(json!({ "field": 12345 })));
        assert_eq!(text.as_deref(), Some("12345"));
        assert!(errors.is_empty());
    }

    #[test]
    fn null_and_non_scalars_are_field_errors() {
        let mut errors = FieldErrors::new();
        assert!(required_text(&mut errors, "a", Some(Value::Null)).is_none());
        assert!(required_text(&mut errors, "b", Some(json!(true))).is_none());
        assert_eq!(optional_text(&mut errors, "c", Some(json!(["x"]))), "");
        assert_eq!(errors.get("a").unwrap(), [FIELD_NULL.to_string()]);
        assert_eq!(errors.get("b").unwrap(), [NOT_A_STRING.to_string()]);
        assert_eq!(errors.get("c").unwrap(), [NOT_A_STRING.to_string()]);
    }
}
