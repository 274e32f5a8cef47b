use axum::http::StatusCode;
use thiserror::Error;

/// Failure classes of the payment flow, from request validation through to
/// the post-confirmation database write.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Rejected payment method; surfaced immediately, never retried.
    #[error("{0} is not supported. Please use SOL, USDC, or USDT.")]
    UnsupportedMethod(String),
    /// Bad or missing input (malformed wallet address, non-positive amount, ...).
    #[error("{0}")]
    Validation(String),
    /// RPC unreachable or a read failed; the prepare step must be retried
    /// from scratch, there is no partial-transaction resume.
    #[error("failed to prepare payment: {0}")]
    Network(String),
    /// The network rejected or reverted the transaction; terminal for this
    /// attempt.
    #[error("transaction failed: {0}")]
    OnChain(String),
    /// Confirmation was not observed within the poll budget. The transaction
    /// may still land, so this is ambiguous rather than a hard failure.
    #[error("transaction confirmation timeout. Please check your wallet or an explorer for the transaction status.")]
    ConfirmationTimeout,
    /// The payment confirmed but the card record could not be written. Must
    /// never be swallowed: the user has paid and holds no card.
    #[error("payment confirmed but the card could not be saved ({0}). Please contact support with your transaction signature.")]
    Persistence(String),
    /// The user declined the signature request at the wallet; not an infra
    /// fault.
    #[error("payment was cancelled in the wallet")]
    Cancelled,
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedMethod(_) | Self::Validation(_) | Self::Cancelled => {
                StatusCode::BAD_REQUEST
            }
            Self::Network(_) => StatusCode::BAD_GATEWAY,
            Self::OnChain(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ConfirmationTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors from profile reads and the tagged partial-update path.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("User not found")]
    NotFound,
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

impl ProfileError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UsernameTaken => StatusCode::BAD_REQUEST,
            Self::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
