use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter,
};

use crate::entities::{prelude::*, users};
use crate::error::ProfileError;
use crate::models::user::{CardAssignment, ProfileUpdate, UpdateCommand};

pub async fn find_by_wallet(
    db: &DatabaseConnection,
    wallet_address: &str,
) -> Result<Option<users::Model>, sea_orm::DbErr> {
    Users::find()
        .filter(users::Column::WalletAddress.eq(wallet_address))
        .one(db)
        .await
}

/// Case-insensitive username availability check.
pub async fn username_taken(
    db: &DatabaseConnection,
    username: &str,
) -> Result<bool, sea_orm::DbErr> {
    let existing = Users::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(users::Column::Username)))
                .eq(username.to_lowercase()),
        )
        .one(db)
        .await?;
    Ok(existing.is_some())
}

async fn username_taken_by_other(
    db: &DatabaseConnection,
    username: &str,
    wallet_address: &str,
) -> Result<bool, sea_orm::DbErr> {
    let existing = Users::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(users::Column::Username)))
                .eq(username.to_lowercase()),
        )
        .filter(users::Column::WalletAddress.ne(wallet_address))
        .one(db)
        .await?;
    Ok(existing.is_some())
}

/// Applies one tagged update command to the profile row keyed by wallet
/// address. All values travel as bound parameters; there is no dynamic SQL.
///
/// The profile must already exist: this path never creates rows, it only
/// mutates the one provisioned during onboarding.
pub async fn apply_update(
    db: &DatabaseConnection,
    wallet_address: &str,
    command: UpdateCommand,
) -> Result<users::Model, ProfileError> {
    let existing = find_by_wallet(db, wallet_address)
        .await?
        .ok_or(ProfileError::NotFound)?;

    match command {
        UpdateCommand::Profile(update) => apply_profile_update(db, existing, update).await,
        UpdateCommand::Card(assignment) => apply_card_assignment(db, existing, assignment).await,
    }
}

async fn apply_profile_update(
    db: &DatabaseConnection,
    existing: users::Model,
    update: ProfileUpdate,
) -> Result<users::Model, ProfileError> {
    if let Some(username) = &update.username {
        if username_taken_by_other(db, username, &existing.wallet_address).await? {
            return Err(ProfileError::UsernameTaken);
        }
    }

    let mut active = existing.clone().into_active_model();
    let mut changed = false;
    if let Some(username) = update.username {
        active.username = Set(username);
        changed = true;
    }
    if let Some(email) = update.email {
        active.email = Set(email);
        changed = true;
    }
    if let Some(url) = update.profile_picture_url {
        active.profile_picture_url = Set(Some(url));
        changed = true;
    }
    if let Some(first_name) = update.first_name {
        active.first_name = Set(Some(first_name));
        changed = true;
    }
    if let Some(last_name) = update.last_name {
        active.last_name = Set(Some(last_name));
        changed = true;
    }

    if !changed {
        return Ok(existing);
    }

    Ok(active.update(db).await?)
}

async fn apply_card_assignment(
    db: &DatabaseConnection,
    existing: users::Model,
    assignment: CardAssignment,
) -> Result<users::Model, ProfileError> {
    // A profile holds at most one card. A retried persist after a
    // false-negative timeout keeps the card that already exists instead of
    // overwriting it with freshly generated credentials.
    if existing.card_number.is_some() {
        tracing::info!(
            wallet = %existing.wallet_address,
            "card already attached, keeping existing credentials"
        );
        return Ok(existing);
    }

    let mut active = existing.into_active_model();
    active.first_name = Set(Some(assignment.first_name));
    active.last_name = Set(Some(assignment.last_name));
    active.card_number = Set(Some(assignment.card_number));
    active.expiry_date = Set(Some(assignment.expiry_date));
    active.security_code = Set(Some(assignment.security_code));
    active.balance = Set(Some(assignment.balance));
    active.order_date = Set(Some(assignment.order_date));

    Ok(active.update(db).await?)
}
