use serde::Serialize;

#[derive(Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "teamId")]
    pub team_id: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserProfile,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCheckoutResponse {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
}
