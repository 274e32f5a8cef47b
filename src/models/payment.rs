use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

/// Assets accepted for the preorder payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Sol,
    Usdc,
    Usdt,
}

impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SOL" => Ok(Self::Sol),
            "USDC" => Ok(Self::Usdc),
            "USDT" => Ok(Self::Usdt),
            other => Err(PaymentError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sol => write!(f, "SOL"),
            Self::Usdc => write!(f, "USDC"),
            Self::Usdt => write!(f, "USDT"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest {
    /// Kept as a string so unknown methods come back as a 400 naming the
    /// method instead of a deserialization error.
    pub payment_method: String,
    /// USD-denominated amount ($50 for the preorder)
    pub amount: Decimal,
    /// Payer public key, base58
    pub from_wallet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareResponse {
    pub success: bool,
    /// Base64-encoded unsigned transaction for the client wallet to sign
    pub transaction: String,
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    /// Base64-encoded fully signed transaction
    pub signed_transaction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
    pub success: bool,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolPriceResponse {
    pub sol_usd: Decimal,
    /// SOL equivalent of the fixed preorder price at this quote
    pub preorder_amount_sol: Decimal,
}
