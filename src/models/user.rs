use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{check_max_length, optional_text, present, required_text, scalar_text, RawField};
use crate::error::{FieldErrors, FIELD_BLANK, FIELD_REQUIRED};

pub const USERNAME_MAX_LENGTH: usize = 50;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const NAME_MAX_LENGTH: usize = 150;

const INVALID_EMAIL: &str = "Enter a valid email address.";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

/// Stored account. Holds the bcrypt hash, so it is never serialized directly.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload handed to the repository, password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
}

/// Wire body for `POST /api/users`. Fields stay raw JSON so that missing,
/// null and mistyped values are reported per field instead of failing
/// deserialization.
#[derive(Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default, deserialize_with = "present")]
    pub username: RawField,
    #[serde(default, deserialize_with = "present")]
    pub email: RawField,
    #[serde(default, deserialize_with = "present")]
    pub password: RawField,
    #[serde(default, deserialize_with = "present")]
    pub first_name: RawField,
    #[serde(default, deserialize_with = "present")]
    pub last_name: RawField,
}

impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// A create request that passed every check.
pub struct ValidatedUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl ValidatedUser {
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            username: self.username,
            email: self.email,
            password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            is_superuser: false,
        }
    }
}

/// Result of field-level checks. A field is `Some` only when it passed its
/// own rules, which is when store-level uniqueness is worth checking.
pub struct UserDraft {
    pub username: Option<String>,
    pub email: Option<String>,
    password: Option<String>,
    first_name: String,
    last_name: String,
    pub errors: FieldErrors,
}

impl UserDraft {
    pub fn finish(self) -> Result<ValidatedUser, FieldErrors> {
        match (self.username, self.email, self.password) {
            (Some(username), Some(email), Some(password)) => self.errors.into_result(ValidatedUser {
                username,
                email,
                password,
                first_name: self.first_name,
                last_name: self.last_name,
            }),
            _ => Err(self.errors),
        }
    }
}

impl CreateUserRequest {
    pub fn clean(self) -> UserDraft {
        let mut errors = FieldErrors::new();

        let username = required_text(&mut errors, "username", self.username)
            .filter(|u| !check_max_length(&mut errors, "username", u, USERNAME_MAX_LENGTH));

        let email = required_text(&mut errors, "email", self.email).filter(|e| {
            if check_max_length(&mut errors, "email", e, EMAIL_MAX_LENGTH) {
                return false;
            }
            if !EMAIL_RE.is_match(e) {
                errors.add("email", INVALID_EMAIL);
                return false;
            }
            true
        });

        let password = clean_password(&mut errors, self.password);

        let first_name = optional_text(&mut errors, "first_name", self.first_name);
        check_max_length(&mut errors, "first_name", &first_name, NAME_MAX_LENGTH);
        let last_name = optional_text(&mut errors, "last_name", self.last_name);
        check_max_length(&mut errors, "last_name", &last_name, NAME_MAX_LENGTH);

        UserDraft {
            username,
            email,
            password,
            first_name,
            last_name,
            errors,
        }
    }

    /// Field-level validation only; see [`UserDraft`] for uniqueness.
    pub fn validate(self) -> Result<ValidatedUser, FieldErrors> {
        self.clean().finish()
    }
}

// Passwords are taken verbatim, surrounding whitespace included.
fn clean_password(errors: &mut FieldErrors, value: RawField) -> Option<String> {
    let Some(value) = value else {
        errors.add("password", FIELD_REQUIRED);
        return None;
    };
    let password = scalar_text(errors, "password", value)?;
    if password.is_empty() {
        errors.add("password", FIELD_BLANK);
        return None;
    }
    Some(password)
}

/// Public representation of a user; password is write-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FIELD_NULL;
    use serde_json::{json, Value};

    fn text(value: &str) -> RawField {
        Some(Value::from(value))
    }

    fn request(username: &str, email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: text(username),
            email: text(email),
            password: text(password),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_a_well_formed_request() {
        let valid = request(" alice ", "alice@example.com", " s3cret ")
            .validate()
            .unwrap();
        assert_eq!(valid.username, "alice");
        assert_eq!(valid.password, " s3cret ");
        assert_eq!(valid.first_name, "");
    }

    #[test]
    fn usernames_are_free_text() {
        for name in ["John Doe", "a/b", "bad name!"] {
            let valid = request(name, "john@example.com", "pw").validate().unwrap();
            assert_eq!(valid.username, name);
        }
    }

    #[test]
    fn reports_every_missing_field() {
        let errors = CreateUserRequest::default().validate().err().unwrap();
        for field in ["username", "email", "password"] {
            assert_eq!(errors.get(field).unwrap(), [FIELD_REQUIRED.to_string()]);
        }
    }

    #[test]
    fn rejects_blank_and_malformed_values() {
        let errors = request("   ", "not-an-email", "").validate().err().unwrap();
        assert_eq!(errors.get("username").unwrap(), [FIELD_BLANK.to_string()]);
        assert_eq!(errors.get("email").unwrap(), [INVALID_EMAIL.to_string()]);
        assert_eq!(errors.get("password").unwrap(), [FIELD_BLANK.to_string()]);
    }

    #[test]
    fn enforces_username_length() {
        let long = "a".repeat(USERNAME_MAX_LENGTH + 1);
        let errors = request(&long, "a@b.co", "pw").validate().err().unwrap();
        assert!(errors.has("username"));
        assert!(request(&"a".repeat(USERNAME_MAX_LENGTH), "a@b.co", "pw")
            .validate()
            .is_ok());
    }

    #[test]
    fn numeric_and_null_values_are_handled_per_field() {
        let body: CreateUserRequest = serde_json::from_value(json!({
            "username": 12345,
            "email": null,
            "password": "pw",
        }))
        .unwrap();
        let draft = body.clean();
        assert_eq!(draft.username.as_deref(), Some("12345"));
        assert_eq!(draft.errors.get("email").unwrap(), [FIELD_NULL.to_string()]);
        assert!(!draft.errors.has("username"));
    }

    #[test]
    fn draft_keeps_fields_that_passed() {
        let draft = request("carol", "broken", "pw").clean();
        assert_eq!(draft.username.as_deref(), Some("carol"));
        assert_eq!(draft.email, None);
        assert!(draft.errors.has("email"));
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", request("bob", "bob@example.com", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn response_drops_password_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "bob@example.com".into(),
            username: "bob".into(),
            password_hash: "$2b$04$hash".into(),
            first_name: String::new(),
            last_name: String::new(),
            is_superuser: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 3);
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
