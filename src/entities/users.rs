//! SeaORM Entity for users
//!
//! One row per connected wallet. The row is the sole durable owner of the
//! simulated prepaid card data attached by the preorder flow.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Solana wallet public key (base58), unique per profile
    pub wallet_address: String,
    /// Display name, letters/digits/underscores only
    pub username: String,
    pub email: String,
    pub profile_picture_url: Option<String>,
    /// Set by the preorder persist step together with the card fields
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// 16-digit generated card number; presence means the card is active
    pub card_number: Option<String>,
    /// MM/YY
    pub expiry_date: Option<String>,
    /// 3-digit CVV
    pub security_code: Option<String>,
    /// Card balance in USD (12,2); fixed at 50.00 on issuance
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub balance: Option<Decimal>,
    /// When the confirmed preorder was recorded
    pub order_date: Option<DateTimeWithTimeZone>,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
