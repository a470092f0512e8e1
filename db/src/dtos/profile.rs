/// Partial profile update. `None` leaves a column untouched.
#[derive(Debug, Default)]
pub struct ProfileUpdateRequest {
    pub file: Option<String>,
    pub location: Option<String>,
    pub tel: Option<String>,
    pub description: Option<String>,
    pub working_hours: Option<String>,
    pub profile_type: Option<String>,
}
