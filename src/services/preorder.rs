use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::entities::users;
use crate::error::PaymentError;
use crate::models::payment::PaymentMethod;
use crate::models::user::{CardAssignment, UpdateCommand};
use crate::services::card::CardCredentials;
use crate::services::payment::{await_confirmation, PaymentService};
use crate::services::profile_cache::ProfileCache;
use crate::services::profiles;

/// Fixed preorder price in USD. Stablecoin payments transfer this amount
/// directly; SOL payments convert at the current spot price.
pub const PREORDER_PRICE_USD: Decimal = dec!(50.00);

/// Where a preorder attempt currently stands. Exactly one terminal state is
/// reached per run: `Confirmed`, `Failed`, or `TimedOut`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Preparing,
    AwaitingSignature,
    Submitted,
    Polling,
    Confirmed,
    Failed,
    TimedOut,
}

/// Signs and submits the prepared transaction. The server never holds the
/// payer's key; this seam is where the wallet (or a test double) plugs in.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Pubkey;

    /// Returns [`PaymentError::Cancelled`] when the user declines.
    async fn sign_and_send(&self, transaction: Transaction) -> Result<Signature, PaymentError>;
}

/// Writes the generated card onto the payer's profile once the payment
/// confirms.
#[async_trait]
pub trait CardPersister: Send + Sync {
    async fn persist_card(
        &self,
        wallet_address: &str,
        first_name: &str,
        last_name: &str,
        card: &CardCredentials,
    ) -> Result<users::Model, PaymentError>;
}

/// Outcome of a confirmed preorder.
#[derive(Debug, Clone)]
pub struct PreorderReceipt {
    pub signature: Signature,
    pub card: CardCredentials,
    pub profile: users::Model,
}

/// Converts the fixed USD price into the amount to transfer for the chosen
/// method. SOL quotes to four decimal places.
pub fn preorder_amount(method: PaymentMethod, sol_usd: Decimal) -> Decimal {
    match method {
        PaymentMethod::Sol => (PREORDER_PRICE_USD / sol_usd).round_dp(4),
        PaymentMethod::Usdc | PaymentMethod::Usdt => PREORDER_PRICE_USD,
    }
}

/// Drives one preorder end to end: prepare, hand off for signing, watch
/// confirmation, then mint and persist the card.
pub struct PreorderFlow<W, P> {
    payments: PaymentService,
    wallet: W,
    persister: P,
    state: FlowState,
}

impl<W: WalletSigner, P: CardPersister> PreorderFlow<W, P> {
    pub fn new(payments: PaymentService, wallet: W, persister: P) -> Self {
        Self {
            payments,
            wallet,
            persister,
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Runs the flow once. On a confirmation timeout the transaction may
    /// still land later, so the card is NOT persisted and the caller should
    /// direct the user to an explorer. A persistence failure after
    /// confirmation leaves the flow in `Confirmed`: the payment succeeded and
    /// only the card write needs retrying.
    pub async fn run(
        &mut self,
        method: PaymentMethod,
        amount: Decimal,
        first_name: &str,
        last_name: &str,
    ) -> Result<PreorderReceipt, PaymentError> {
        let payer = self.wallet.address().to_string();

        self.state = FlowState::Preparing;
        let prepared = match self.payments.prepare_transfer(method, amount, &payer).await {
            Ok(prepared) => prepared,
            Err(e) => return Err(self.fail(e)),
        };

        self.state = FlowState::AwaitingSignature;
        let signature = match self.wallet.sign_and_send(prepared.transaction).await {
            Ok(signature) => signature,
            Err(e) => return Err(self.fail(e)),
        };
        tracing::info!(%signature, %method, %amount, "preorder payment submitted");

        self.state = FlowState::Submitted;
        self.state = FlowState::Polling;
        if let Err(e) = await_confirmation(self.payments.rpc(), &signature).await {
            return Err(self.fail(e));
        }

        self.state = FlowState::Confirmed;
        tracing::info!(%signature, "preorder payment confirmed");

        let card = CardCredentials::generate();
        let profile = self
            .persister
            .persist_card(&payer, first_name, last_name, &card)
            .await
            .map_err(|e| {
                // Deliberately stay Confirmed: the money moved.
                tracing::error!(%signature, error = %e, "card persistence failed after confirmed payment");
                match e {
                    PaymentError::Persistence(_) => e,
                    other => PaymentError::Persistence(other.to_string()),
                }
            })?;

        Ok(PreorderReceipt {
            signature,
            card,
            profile,
        })
    }

    fn fail(&mut self, e: PaymentError) -> PaymentError {
        self.state = match e {
            PaymentError::ConfirmationTimeout => FlowState::TimedOut,
            _ => FlowState::Failed,
        };
        tracing::warn!(state = ?self.state, error = %e, "preorder flow stopped");
        e
    }
}

/// Production persister: writes through the tagged card-assignment update and
/// refreshes the profile cache with the returned row.
#[derive(Clone)]
pub struct DbCardPersister {
    db: Arc<DatabaseConnection>,
    cache: ProfileCache,
}

impl DbCardPersister {
    pub fn new(db: Arc<DatabaseConnection>, cache: ProfileCache) -> Self {
        Self { db, cache }
    }
}

#[async_trait]
impl CardPersister for DbCardPersister {
    async fn persist_card(
        &self,
        wallet_address: &str,
        first_name: &str,
        last_name: &str,
        card: &CardCredentials,
    ) -> Result<users::Model, PaymentError> {
        let assignment = CardAssignment {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            card_number: card.number.clone(),
            expiry_date: card.expiry.clone(),
            security_code: card.cvv.clone(),
            balance: crate::services::card::STARTING_BALANCE,
            order_date: chrono::Utc::now().fixed_offset(),
        };

        let profile = profiles::apply_update(&self.db, wallet_address, UpdateCommand::Card(assignment))
            .await
            .map_err(|e| PaymentError::Persistence(e.to_string()))?;

        self.cache.store(profile.clone()).await;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sol_amount_converts_at_spot_price() {
        assert_eq!(preorder_amount(PaymentMethod::Sol, dec!(200)), dec!(0.25));
        // 50 / 137.41 = 0.36387... -> 4 dp
        assert_eq!(
            preorder_amount(PaymentMethod::Sol, dec!(137.41)),
            dec!(0.3639)
        );
    }

    #[test]
    fn stablecoin_amount_is_the_sticker_price() {
        assert_eq!(preorder_amount(PaymentMethod::Usdc, dec!(200)), dec!(50.00));
        assert_eq!(preorder_amount(PaymentMethod::Usdt, dec!(95)), dec!(50.00));
    }
}
