use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of credits granted once at signup.
pub const SIGNUP_BONUS_CREDITS: i64 = 20;

/// Per-user account row: email plus the remaining credit balance.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub email: String,
    pub credits: i64,
    pub created_at: String,
}

/// One completed generation. Immutable once written.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedImage {
    pub image_id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    pub image_url: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub image_url: String,
    pub prompt: String,
}
