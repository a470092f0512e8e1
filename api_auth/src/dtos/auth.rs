use serde::{Deserialize, Serialize};

/// Registration payload. Every field is optional here so that missing ones are
/// reported per field instead of failing deserialization as a whole.
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub repeated_password: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub email: String,
    pub user_id: i64,
}
