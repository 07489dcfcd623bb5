use serde::Serialize;
use time::OffsetDateTime;

/// Stored user entry. Serialized as-is by the listing endpoint, digest included.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub password_digest: String,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

/// Everything a record needs except the timestamp, which the store assigns on append.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub password_digest: String,
}
