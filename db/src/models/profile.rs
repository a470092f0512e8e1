use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub file: String,
    pub location: String,
    pub tel: String,
    pub description: String,
    pub working_hours: String,
    #[sqlx(rename = "type")]
    pub profile_type: String,
    pub created_at: NaiveDateTime,
}

/// A profile row joined with the identity fields of its user.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ProfileWithUser {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub file: String,
    pub location: String,
    pub tel: String,
    pub description: String,
    pub working_hours: String,
    #[sqlx(rename = "type")]
    pub profile_type: String,
    pub created_at: NaiveDateTime,
}
