use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::users;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub wallet_address: String,
    pub username: String,
    pub email: String,
    pub profile_picture_url: Option<String>,
}

/// `{ "user": ... }` envelope the frontend reads; `user` is null when no
/// profile exists for the wallet yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: Option<users::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserQuery {
    pub wallet_address: String,
}

/// Partial update addressed to one profile row. The update itself is a tagged
/// command so each mutable field group has an explicit shape; there is no
/// open "any fields" payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub wallet_address: String,
    #[serde(flatten)]
    pub command: UpdateCommand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UpdateCommand {
    /// Settings-page edits
    Profile(ProfileUpdate),
    /// One-shot card attachment after a confirmed preorder payment
    Card(CardAssignment),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile_picture_url: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAssignment {
    pub first_name: String,
    pub last_name: String,
    pub card_number: String,
    pub expiry_date: String,
    pub security_code: String,
    pub balance: Decimal,
    pub order_date: chrono::DateTime<chrono::FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckUsernameQuery {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckUsernameResponse {
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    pub wallet_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
