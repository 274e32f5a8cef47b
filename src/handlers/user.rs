use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};

use crate::entities::{prelude::*, users};
use crate::error::ProfileError;
use crate::models::user::{
    CheckUsernameQuery, CheckUsernameResponse, CreateUserRequest, DeleteUserRequest,
    DeleteUserResponse, ErrorResponse, GetUserQuery, UpdateCommand, UpdateUserRequest,
    UserEnvelope,
};
use crate::services::profiles;
use crate::AppState;

const DEFAULT_AVATAR: &str = "/images/default-avatar.png";

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn db_error(e: sea_orm::DbErr) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Database error: {}", e),
        }),
    )
}

fn profile_error(e: ProfileError) -> HandlerError {
    (
        e.status_code(),
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), HandlerError> {
    if req.wallet_address.trim().is_empty() {
        return Err(bad_request("Wallet address is required"));
    }
    if !USERNAME_RE.is_match(&req.username) {
        return Err(bad_request(
            "Username may only contain letters, numbers, and underscores",
        ));
    }
    if !EMAIL_RE.is_match(&req.email) {
        return Err(bad_request("Invalid email address"));
    }

    if profiles::find_by_wallet(&state.db, &req.wallet_address)
        .await
        .map_err(db_error)?
        .is_some()
    {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "User with this wallet address already exists".to_string(),
            }),
        ));
    }
    if profiles::username_taken(&state.db, &req.username)
        .await
        .map_err(db_error)?
    {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Username is already taken".to_string(),
            }),
        ));
    }

    let user = users::ActiveModel {
        wallet_address: Set(req.wallet_address),
        username: Set(req.username),
        email: Set(req.email),
        profile_picture_url: Set(Some(
            req.profile_picture_url
                .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
        )),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .map_err(db_error)?;

    tracing::info!(wallet = %user.wallet_address, username = %user.username, "user created");
    state.profiles.store(user.clone()).await;

    Ok((StatusCode::CREATED, Json(UserEnvelope { user: Some(user) })))
}

/// GET /api/users?walletAddress=...
///
/// Returns `{ "user": null }` with 200 when no profile exists; the frontend
/// treats that as "show onboarding", not as an error.
pub async fn get_user(
    State(state): State<AppState>,
    Query(query): Query<GetUserQuery>,
) -> Result<Json<UserEnvelope>, HandlerError> {
    if let Some(cached) = state.profiles.get(&query.wallet_address).await {
        return Ok(Json(UserEnvelope { user: Some(cached) }));
    }

    let user = profiles::find_by_wallet(&state.db, &query.wallet_address)
        .await
        .map_err(db_error)?;

    if let Some(user) = &user {
        state.profiles.store(user.clone()).await;
    }

    Ok(Json(UserEnvelope { user }))
}

/// PUT /api/users/update
pub async fn update_user(
    State(state): State<AppState>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserEnvelope>, HandlerError> {
    if let UpdateCommand::Profile(update) = &req.command {
        if let Some(username) = &update.username {
            if !USERNAME_RE.is_match(username) {
                return Err(bad_request(
                    "Username may only contain letters, numbers, and underscores",
                ));
            }
        }
        if let Some(email) = &update.email {
            if !EMAIL_RE.is_match(email) {
                return Err(bad_request("Invalid email address"));
            }
        }
    }

    let user = profiles::apply_update(&state.db, &req.wallet_address, req.command)
        .await
        .map_err(profile_error)?;

    state.profiles.store(user.clone()).await;

    Ok(Json(UserEnvelope { user: Some(user) }))
}

/// GET and POST /api/users/check-username
pub async fn check_username_get(
    State(state): State<AppState>,
    Query(query): Query<CheckUsernameQuery>,
) -> Result<Json<CheckUsernameResponse>, HandlerError> {
    check_username(&state, query).await
}

pub async fn check_username_post(
    State(state): State<AppState>,
    Json(query): Json<CheckUsernameQuery>,
) -> Result<Json<CheckUsernameResponse>, HandlerError> {
    check_username(&state, query).await
}

async fn check_username(
    state: &AppState,
    query: CheckUsernameQuery,
) -> Result<Json<CheckUsernameResponse>, HandlerError> {
    if !USERNAME_RE.is_match(&query.username) {
        return Err(bad_request(
            "Username may only contain letters, numbers, and underscores",
        ));
    }

    let taken = profiles::username_taken(&state.db, &query.username)
        .await
        .map_err(db_error)?;

    Ok(Json(CheckUsernameResponse { available: !taken }))
}

/// DELETE /api/users/delete
pub async fn delete_user(
    State(state): State<AppState>,
    Json(req): Json<DeleteUserRequest>,
) -> Result<Json<DeleteUserResponse>, HandlerError> {
    let result = Users::delete_many()
        .filter(users::Column::WalletAddress.eq(&req.wallet_address))
        .exec(&*state.db)
        .await
        .map_err(db_error)?;

    if result.rows_affected == 0 {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "User not found".to_string(),
            }),
        ));
    }

    state.profiles.invalidate(&req.wallet_address).await;
    tracing::info!(wallet = %req.wallet_address, "user deleted");

    Ok(Json(DeleteUserResponse {
        success: true,
        message: "User deleted successfully".to_string(),
    }))
}
