use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use super::{
    dto::UserCreate,
    repo::UserStore,
    repo_types::{NewUser, UserRecord},
};
use crate::error::{FieldError, FieldErrorKind, ValidationError};

const PASSWORD_DIGEST_PREFIX: &str = "hashed_";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        // dot-atom local part; LDH domain labels ending in an alphabetic label
        static ref EMAIL_RE: Regex = Regex::new(concat!(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
            r"@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{1,63}$",
        ))
        .unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~-".contains(c)
}

fn is_ldh_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Explains why `email` is rejected, or `None` if it is acceptable.
fn email_problem(email: &str) -> Option<&'static str> {
    if is_valid_email(email) {
        return None;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Some("An email address must have an @-sign.");
    };
    let reason = if local.is_empty() {
        "There must be something before the @-sign."
    } else if domain.is_empty() {
        "There must be something after the @-sign."
    } else if domain.contains('@') {
        "An email address can only have one @-sign."
    } else if email.chars().any(char::is_whitespace) {
        "An email address cannot contain whitespace."
    } else if email.contains("..") {
        "An email address cannot contain consecutive dots."
    } else if local.starts_with('.') || local.ends_with('.') {
        "The part before the @-sign cannot start or end with a period."
    } else if !local.chars().all(|c| c == '.' || is_atext(c)) {
        "The part before the @-sign contains invalid characters."
    } else if domain.starts_with('.') || domain.ends_with('.') {
        "The domain name cannot start or end with a period."
    } else if !domain.contains('.') {
        "The part after the @-sign is not valid. It should have a period."
    } else if !domain.split('.').all(is_ldh_label) {
        "The domain name contains an invalid domain label."
    } else {
        "The domain name must end with a letter-only top-level label."
    };
    Some(reason)
}

/// Placeholder digest; not a real password hash.
pub fn password_digest(plain: &str) -> String {
    format!("{}{}", PASSWORD_DIGEST_PREFIX, plain)
}

fn required_str(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(field) {
        None => {
            errors.push(FieldError::body_field(
                FieldErrorKind::Missing,
                field,
                "Field required",
            ));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(
                FieldError::body_field(
                    FieldErrorKind::StringType,
                    field,
                    "Input should be a valid string",
                )
                .with_input(other.clone()),
            );
            None
        }
    }
}

fn optional_str(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(
                FieldError::body_field(
                    FieldErrorKind::StringType,
                    field,
                    "Input should be a valid string",
                )
                .with_input(other.clone()),
            );
            None
        }
    }
}

/// Byte offset of a 1-based line/column position within `body`.
fn byte_offset(body: &[u8], line: usize, column: usize) -> usize {
    let line_start: usize = body
        .split(|b| *b == b'\n')
        .take(line.saturating_sub(1))
        .map(|l| l.len() + 1)
        .sum();
    (line_start + column.saturating_sub(1)).min(body.len())
}

/// Decodes a request body as JSON, reporting where a malformed document broke.
pub fn parse_json_body(body: &[u8]) -> Result<Value, ValidationError> {
    serde_json::from_slice(body).map_err(|e| {
        let position = byte_offset(body, e.line(), e.column());
        ValidationError(vec![FieldError::json_invalid(
            position,
            format!("JSON decode error: {}", e),
        )])
    })
}

/// Checks a raw request body against the registration schema.
///
/// All field problems are collected in field order (`username`, `email`,
/// `password`, `full_name`) rather than stopping at the first one. Unknown
/// fields are ignored.
pub fn validate_user_create(payload: &Value) -> Result<UserCreate, ValidationError> {
    let Some(obj) = payload.as_object() else {
        return Err(ValidationError(vec![FieldError::body(
            FieldErrorKind::ModelAttributesType,
            "Input should be a valid dictionary or object to extract fields from",
        )
        .with_input(payload.clone())]));
    };

    let mut errors = Vec::new();

    let username = required_str(obj, "username", &mut errors).and_then(|u| {
        if u.is_empty() {
            errors.push(
                FieldError::body_field(
                    FieldErrorKind::StringTooShort,
                    "username",
                    "String should have at least 1 character",
                )
                .with_input(Value::String(u)),
            );
            None
        } else {
            Some(u)
        }
    });

    let email = required_str(obj, "email", &mut errors).and_then(|e| match email_problem(&e) {
        None => Some(e),
        Some(reason) => {
            errors.push(
                FieldError::body_field(
                    FieldErrorKind::ValueError,
                    "email",
                    format!("value is not a valid email address: {}", reason),
                )
                .with_input(Value::String(e)),
            );
            None
        }
    });

    let password = required_str(obj, "password", &mut errors);
    let full_name = optional_str(obj, "full_name", &mut errors);

    match (username, email, password) {
        (Some(username), Some(email), Some(password)) if errors.is_empty() => Ok(UserCreate {
            username,
            email,
            password,
            full_name,
        }),
        _ => Err(ValidationError(errors)),
    }
}

/// Stores a validated user and returns the stored record.
pub async fn register_user(store: &dyn UserStore, user: UserCreate) -> UserRecord {
    let UserCreate {
        username,
        email,
        password,
        full_name,
    } = user;
    store
        .insert(NewUser {
            username,
            email,
            full_name,
            password_digest: password_digest(&password),
        })
        .await
}

#[cfg(test)]
mod validation_tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "username": "johndoe",
            "email": "john@example.com",
            "password": "securepassword123",
            "full_name": "John Doe"
        })
    }

    #[test]
    fn accepts_full_payload() {
        let user = validate_user_create(&valid_payload()).unwrap();
        assert_eq!(
            user,
            UserCreate {
                username: "johndoe".into(),
                email: "john@example.com".into(),
                password: "securepassword123".into(),
                full_name: Some("John Doe".into()),
            }
        );
    }

    #[test]
    fn full_name_is_optional() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("full_name");
        assert_eq!(validate_user_create(&payload).unwrap().full_name, None);

        payload["full_name"] = Value::Null;
        assert_eq!(validate_user_create(&payload).unwrap().full_name, None);
    }

    #[test]
    fn each_required_field_is_reported_when_missing() {
        for field in ["username", "email", "password"] {
            let mut payload = valid_payload();
            payload.as_object_mut().unwrap().remove(field);
            let err = validate_user_create(&payload).unwrap_err();
            assert_eq!(err.fields(), vec![field]);
            assert_eq!(err.0[0].kind, FieldErrorKind::Missing);
            assert_eq!(err.0[0].msg, "Field required");
        }
    }

    #[test]
    fn collects_every_problem_in_field_order() {
        let err = validate_user_create(&json!({ "email": "nope", "full_name": 7 })).unwrap_err();
        assert_eq!(err.fields(), vec!["username", "email", "password", "full_name"]);
        let kinds: Vec<_> = err.0.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FieldErrorKind::Missing,
                FieldErrorKind::ValueError,
                FieldErrorKind::Missing,
                FieldErrorKind::StringType,
            ]
        );
    }

    #[test]
    fn rejects_malformed_email() {
        let mut payload = valid_payload();
        payload["email"] = json!("not-an-email");
        let err = validate_user_create(&payload).unwrap_err();
        assert_eq!(err.fields(), vec!["email"]);
        assert_eq!(err.0[0].kind, FieldErrorKind::ValueError);
        assert!(err.0[0].msg.contains("@-sign"));
        assert_eq!(err.0[0].input, Some(json!("not-an-email")));
    }

    #[test]
    fn rejects_wrong_types() {
        let mut payload = valid_payload();
        payload["username"] = json!(42);
        payload["password"] = json!(["a"]);
        let err = validate_user_create(&payload).unwrap_err();
        assert_eq!(err.fields(), vec!["username", "password"]);
        assert!(err.0.iter().all(|e| e.kind == FieldErrorKind::StringType));
    }

    #[test]
    fn rejects_empty_username() {
        let mut payload = valid_payload();
        payload["username"] = json!("");
        let err = validate_user_create(&payload).unwrap_err();
        assert_eq!(err.0[0].kind, FieldErrorKind::StringTooShort);
    }

    #[test]
    fn rejects_non_object_body() {
        let err = validate_user_create(&json!(["johndoe"])).unwrap_err();
        assert_eq!(err.0.len(), 1);
        assert_eq!(err.0[0].loc, vec!["body"]);
        assert_eq!(err.0[0].kind, FieldErrorKind::ModelAttributesType);
    }

    #[test]
    fn ignores_unknown_fields() {
        let mut payload = valid_payload();
        payload["is_admin"] = json!(true);
        assert!(validate_user_create(&payload).is_ok());
    }

    #[test]
    fn does_not_enforce_password_strength() {
        let mut payload = valid_payload();
        payload["password"] = json!("");
        assert_eq!(validate_user_create(&payload).unwrap().password, "");
    }
}
