use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::PaymentError;
use crate::models::payment::PaymentMethod;
use crate::services::solana_rpc::{ConfirmationLevel, SolanaRpc};

/// Treasury wallet every preorder pays into.
pub const RECIPIENT_WALLET: Pubkey =
    solana_sdk::pubkey!("BJ2h6pEn5xJr3bBFCDN6pCsioYGPxwNz4RWf8urL61qd");

const USDC_MINT: Pubkey = solana_sdk::pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
const USDT_MINT: Pubkey = solana_sdk::pubkey!("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB");

/// USDC and USDT both carry 6 decimals on Solana mainnet.
const STABLECOIN_DECIMALS: u32 = 6;

/// Confirmation poll cadence: 30 attempts * 2 seconds = 60 second ceiling.
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLL_ATTEMPTS: u32 = 30;

/// An unsigned transfer ready for the payer's wallet. Serialized without any
/// signatures; the blockhash pair lets the client detect staleness.
#[derive(Debug, Clone)]
pub struct PreparedPayment {
    pub transaction: Transaction,
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

impl PreparedPayment {
    /// Wire encoding handed to the client for signing.
    pub fn encode_base64(&self) -> Result<String, PaymentError> {
        let bytes = bincode::serialize(&self.transaction)
            .map_err(|e| PaymentError::Network(format!("transaction serialization: {e}")))?;
        Ok(BASE64.encode(bytes))
    }
}

/// Decodes a base64 transaction submitted for broadcast.
pub fn decode_transaction(encoded: &str) -> Result<Transaction, PaymentError> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| PaymentError::Validation(format!("invalid base64 transaction: {e}")))?;
    bincode::deserialize(&bytes)
        .map_err(|e| PaymentError::Validation(format!("malformed transaction: {e}")))
}

/// Stateless builder for the fixed-price purchase transfers. Holds no state
/// between calls beyond the RPC handle and the recipient address.
#[derive(Clone)]
pub struct PaymentService {
    rpc: Arc<dyn SolanaRpc>,
    recipient: Pubkey,
}

impl PaymentService {
    pub fn new(rpc: Arc<dyn SolanaRpc>, recipient: Pubkey) -> Self {
        Self { rpc, recipient }
    }

    pub fn rpc(&self) -> &dyn SolanaRpc {
        self.rpc.as_ref()
    }

    /// Builds the unsigned transfer for one preorder attempt.
    ///
    /// SOL pays with a single native transfer; USDC/USDT pay through the
    /// token program, prepending a create-associated-token-account
    /// instruction when the recipient's token account does not exist yet
    /// (the payer funds the creation).
    pub async fn prepare_transfer(
        &self,
        method: PaymentMethod,
        amount: Decimal,
        from_wallet: &str,
    ) -> Result<PreparedPayment, PaymentError> {
        let from = Pubkey::from_str(from_wallet).map_err(|_| {
            PaymentError::Validation(format!("invalid wallet address: {from_wallet}"))
        })?;
        if amount <= Decimal::ZERO {
            return Err(PaymentError::Validation(format!(
                "amount must be positive, got {amount}"
            )));
        }

        let instructions = match method {
            PaymentMethod::Sol => {
                let lamports = to_base_units(amount, 9)?;
                vec![system_instruction::transfer(
                    &from,
                    &self.recipient,
                    lamports,
                )]
            }
            PaymentMethod::Usdc | PaymentMethod::Usdt => {
                let mint = match method {
                    PaymentMethod::Usdc => USDC_MINT,
                    _ => USDT_MINT,
                };
                self.token_transfer_instructions(&from, &mint, amount)
                    .await?
            }
        };

        let (blockhash, last_valid_block_height) = self.rpc.latest_blockhash().await?;

        let mut transaction = Transaction::new_with_payer(&instructions, Some(&from));
        transaction.message.recent_blockhash = blockhash;

        tracing::info!(
            %method,
            %amount,
            payer = %from,
            %blockhash,
            "payment transaction prepared"
        );

        Ok(PreparedPayment {
            transaction,
            blockhash,
            last_valid_block_height,
        })
    }

    async fn token_transfer_instructions(
        &self,
        from: &Pubkey,
        mint: &Pubkey,
        amount: Decimal,
    ) -> Result<Vec<Instruction>, PaymentError> {
        let from_token_account = spl_associated_token_account::get_associated_token_address(from, mint);
        let to_token_account =
            spl_associated_token_account::get_associated_token_address(&self.recipient, mint);

        let mut instructions = Vec::with_capacity(2);

        // Optimistic existence read; a stale result at worst produces a
        // redundant create instruction the network rejects harmlessly.
        if !self.rpc.account_exists(&to_token_account).await? {
            tracing::info!(account = %to_token_account, "creating associated token account for recipient");
            instructions.push(
                spl_associated_token_account::instruction::create_associated_token_account(
                    from,
                    &self.recipient,
                    mint,
                    &spl_token::id(),
                ),
            );
        }

        let token_amount = to_base_units(amount, STABLECOIN_DECIMALS)?;
        instructions.push(
            spl_token::instruction::transfer_checked(
                &spl_token::id(),
                &from_token_account,
                mint,
                &to_token_account,
                from,
                &[],
                token_amount,
                STABLECOIN_DECIMALS as u8,
            )
            .map_err(|e| PaymentError::Network(format!("token instruction: {e}")))?,
        );

        Ok(instructions)
    }

    /// Submits an already signed transaction and waits for confirmation.
    pub async fn broadcast_and_confirm(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, PaymentError> {
        let signature = self.rpc.send_transaction(transaction).await?;
        tracing::info!(%signature, "transaction sent");
        await_confirmation(self.rpc.as_ref(), &signature).await?;
        tracing::info!(%signature, "transaction confirmed");
        Ok(signature)
    }
}

/// Converts a USD/asset decimal amount to base units, flooring.
fn to_base_units(amount: Decimal, decimals: u32) -> Result<u64, PaymentError> {
    let factor = match decimals {
        9 => Decimal::from(LAMPORTS_PER_SOL),
        _ => Decimal::from(10_u64.pow(decimals)),
    };
    amount
        .checked_mul(factor)
        .and_then(|scaled| scaled.floor().to_u64())
        .ok_or_else(|| PaymentError::Validation(format!("amount out of range: {amount}")))
}

/// Watches a signature until it confirms, fails on-chain, or the poll budget
/// runs out.
///
/// Transient status-check errors consume an attempt but do not fail the
/// flow. An on-chain error ends polling immediately. Budget exhaustion is
/// reported as [`PaymentError::ConfirmationTimeout`], which is recoverable:
/// the transaction may still land after we stop watching.
pub async fn await_confirmation(
    rpc: &dyn SolanaRpc,
    signature: &Signature,
) -> Result<(), PaymentError> {
    for attempt in 1..=MAX_POLL_ATTEMPTS {
        match rpc.signature_status(signature).await {
            Ok(Some(status)) => {
                if let Some(err) = status.err {
                    return Err(PaymentError::OnChain(err));
                }
                if matches!(
                    status.confirmation,
                    Some(ConfirmationLevel::Confirmed | ConfirmationLevel::Finalized)
                ) {
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(%signature, attempt, error = %e, "status check failed, continuing to poll");
            }
        }
        tracing::debug!(%signature, attempt, max = MAX_POLL_ATTEMPTS, "awaiting confirmation");
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    Err(PaymentError::ConfirmationTimeout)
}
