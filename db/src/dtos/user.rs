pub struct UserCreateRequest {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Identity fields editable through the profile endpoint. `None` leaves a column untouched.
#[derive(Debug, Default)]
pub struct UserUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl UserUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }
}
