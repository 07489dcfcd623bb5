use serde::Serialize;
use time::OffsetDateTime;

use super::repo_types::UserRecord;

/// Validated registration payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Public shape of a user returned after registration.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserOut {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

impl From<&UserRecord> for UserOut {
    fn from(r: &UserRecord) -> Self {
        Self {
            username: r.username.clone(),
            email: r.email.clone(),
            full_name: r.full_name.clone(),
            joined_at: r.joined_at,
        }
    }
}
