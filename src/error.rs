use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Machine-readable category of a single field failure.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Missing,
    StringType,
    StringTooShort,
    ValueError,
    ModelAttributesType,
    JsonInvalid,
}

/// One entry of the `detail` list in a 422 response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: FieldErrorKind,
    pub loc: Vec<Value>,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl FieldError {
    pub fn body_field(kind: FieldErrorKind, field: &str, msg: impl Into<String>) -> Self {
        Self {
            kind,
            loc: vec![json!("body"), json!(field)],
            msg: msg.into(),
            input: None,
        }
    }

    pub fn body(kind: FieldErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            loc: vec![json!("body")],
            msg: msg.into(),
            input: None,
        }
    }

    /// Unparsable body; `position` is the byte offset where parsing stopped.
    pub fn json_invalid(position: usize, msg: impl Into<String>) -> Self {
        Self {
            kind: FieldErrorKind::JsonInvalid,
            loc: vec![json!("body"), json!(position)],
            msg: msg.into(),
            input: None,
        }
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    /// Name of the offending field, if the error points below the body root.
    pub fn field(&self) -> Option<&str> {
        self.loc.get(1).and_then(Value::as_str)
    }
}

/// The request payload was rejected before anything was stored.
#[derive(Debug, Error)]
#[error("request validation failed for {} field(s)", .0.len())]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().filter_map(FieldError::field).collect()
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.0 }));
        (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
    }
}
