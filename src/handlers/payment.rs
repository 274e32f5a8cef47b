use axum::{extract::State, http::StatusCode, Json};

use crate::error::PaymentError;
use crate::models::payment::{
    BroadcastRequest, BroadcastResponse, PaymentMethod, PrepareRequest, PrepareResponse,
    PaymentErrorResponse, SolPriceResponse,
};
use crate::services::payment::decode_transaction;
use crate::services::preorder::preorder_amount;
use crate::AppState;

/// GET /api/payments/sol-price
///
/// Quote for the preorder: current SOL/USD spot and the SOL amount that
/// covers the fixed USD price.
pub async fn sol_price(State(state): State<AppState>) -> Json<SolPriceResponse> {
    let sol_usd = state.price.sol_usd().await;
    Json(SolPriceResponse {
        sol_usd,
        preorder_amount_sol: preorder_amount(PaymentMethod::Sol, sol_usd),
    })
}

/// POST /api/payments/prepare
///
/// Builds the unsigned transfer and returns it base64-encoded for the
/// client's wallet to sign. Nothing is submitted here.
pub async fn prepare_payment(
    State(state): State<AppState>,
    Json(req): Json<PrepareRequest>,
) -> Result<Json<PrepareResponse>, (StatusCode, Json<PaymentErrorResponse>)> {
    let method: PaymentMethod = req.payment_method.parse().map_err(reject)?;

    let prepared = state
        .payments
        .prepare_transfer(method, req.amount, &req.from_wallet)
        .await
        .map_err(reject)?;

    let transaction = prepared.encode_base64().map_err(reject)?;

    Ok(Json(PrepareResponse {
        success: true,
        transaction,
        blockhash: prepared.blockhash.to_string(),
        last_valid_block_height: prepared.last_valid_block_height,
    }))
}

/// POST /api/payments/broadcast
///
/// Accepts the signed transaction back from the client, submits it, and
/// blocks until confirmation or the poll budget runs out.
pub async fn broadcast_transaction(
    State(state): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, (StatusCode, Json<PaymentErrorResponse>)> {
    let transaction = decode_transaction(&req.signed_transaction).map_err(reject)?;

    let signature = state
        .payments
        .broadcast_and_confirm(&transaction)
        .await
        .map_err(reject)?;

    Ok(Json(BroadcastResponse {
        success: true,
        signature: signature.to_string(),
    }))
}

fn reject(e: PaymentError) -> (StatusCode, Json<PaymentErrorResponse>) {
    (
        e.status_code(),
        Json(PaymentErrorResponse {
            success: false,
            error: e.to_string(),
        }),
    )
}
