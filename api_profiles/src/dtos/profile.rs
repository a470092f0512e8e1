use chrono::NaiveDateTime;
use common::validation::null_as_empty;
use db::models::profile::ProfileWithUser;
use serde::{Deserialize, Serialize};

/// Partial profile update. A missing key leaves the value untouched, `null` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub file: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tel: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub working_hours: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "null_as_empty")]
    pub profile_type: Option<String>,
}

impl ProfilePatch {
    /// Assigns a multipart or urlencoded form field. Unknown names are ignored like unknown JSON keys.
    pub fn set_text(&mut self, name: &str, value: String) {
        let slot = match name {
            "first_name" => &mut self.first_name,
            "last_name" => &mut self.last_name,
            "email" => &mut self.email,
            "file" => &mut self.file,
            "location" => &mut self.location,
            "tel" => &mut self.tel,
            "description" => &mut self.description,
            "working_hours" => &mut self.working_hours,
            "type" => &mut self.profile_type,
            _ => return,
        };
        *slot = Some(value);
    }
}

/// An image part of a multipart request, fully buffered.
#[derive(Debug)]
pub struct AvatarUpload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Set when the part exceeded the size limit and reading was stopped.
    pub truncated: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub file: String,
    pub location: String,
    pub tel: String,
    pub description: String,
    pub working_hours: String,
    #[serde(rename = "type")]
    pub profile_type: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

impl From<ProfileWithUser> for ProfileResponse {
    fn from(p: ProfileWithUser) -> Self {
        Self {
            user: p.user_id,
            username: p.username,
            first_name: p.first_name,
            last_name: p.last_name,
            file: p.file,
            location: p.location,
            tel: p.tel,
            description: p.description,
            working_hours: p.working_hours,
            profile_type: p.profile_type,
            email: p.email,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BusinessProfileItem {
    pub user: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub file: String,
    pub location: String,
    pub tel: String,
    pub description: String,
    pub working_hours: String,
    #[serde(rename = "type")]
    pub profile_type: String,
}

impl From<ProfileWithUser> for BusinessProfileItem {
    fn from(p: ProfileWithUser) -> Self {
        Self {
            user: p.user_id,
            username: p.username,
            first_name: p.first_name,
            last_name: p.last_name,
            file: p.file,
            location: p.location,
            tel: p.tel,
            description: p.description,
            working_hours: p.working_hours,
            profile_type: p.profile_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerProfileItem {
    pub user: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub file: String,
    pub uploaded_at: String,
    #[serde(rename = "type")]
    pub profile_type: String,
}

impl From<ProfileWithUser> for CustomerProfileItem {
    fn from(p: ProfileWithUser) -> Self {
        Self {
            user: p.user_id,
            username: p.username,
            first_name: p.first_name,
            last_name: p.last_name,
            file: p.file,
            uploaded_at: p.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            profile_type: p.profile_type,
        }
    }
}
