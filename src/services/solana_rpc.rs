use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use solana_transaction_status::TransactionConfirmationStatus;
use std::sync::Arc;

use crate::error::PaymentError;

/// Commitment level reported for a watched signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationLevel {
    Processed,
    Confirmed,
    Finalized,
}

/// Status snapshot for one submitted transaction signature.
#[derive(Debug, Clone)]
pub struct SignatureStatusInfo {
    pub confirmation: Option<ConfirmationLevel>,
    /// On-chain failure payload, if the transaction executed and failed
    pub err: Option<String>,
}

/// The four RPC reads/writes the payment flow needs. Kept as a trait so the
/// builder and the confirmation poller can be exercised against stubs.
#[async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Latest blockhash plus its last valid block height.
    async fn latest_blockhash(&self) -> Result<(Hash, u64), PaymentError>;

    /// Whether an account exists on-chain (recipient token account check).
    async fn account_exists(&self, address: &Pubkey) -> Result<bool, PaymentError>;

    /// Submits a signed transaction, preflighting at confirmed commitment.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, PaymentError>;

    /// Current status of a signature, `None` while the network has not seen it.
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatusInfo>, PaymentError>;
}

/// Production [`SolanaRpc`] backed by the nonblocking JSON-RPC client.
pub struct RpcEndpoint {
    client: RpcClient,
}

impl RpcEndpoint {
    pub fn new(url: String) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url, CommitmentConfig::confirmed()),
        }
    }

    pub fn shared(url: String) -> Arc<dyn SolanaRpc> {
        Arc::new(Self::new(url))
    }
}

#[async_trait]
impl SolanaRpc for RpcEndpoint {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), PaymentError> {
        self.client
            .get_latest_blockhash_with_commitment(CommitmentConfig::confirmed())
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, PaymentError> {
        let response = self
            .client
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;
        Ok(response.value.is_some())
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, PaymentError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(CommitmentLevel::Confirmed),
            ..RpcSendTransactionConfig::default()
        };
        self.client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(|e| match e.get_transaction_error() {
                Some(tx_err) => PaymentError::OnChain(tx_err.to_string()),
                None => PaymentError::Network(e.to_string()),
            })
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatusInfo>, PaymentError> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.value.into_iter().next().flatten();
        Ok(status.map(|s| SignatureStatusInfo {
            confirmation: s.confirmation_status.map(|c| match c {
                TransactionConfirmationStatus::Processed => ConfirmationLevel::Processed,
                TransactionConfirmationStatus::Confirmed => ConfirmationLevel::Confirmed,
                TransactionConfirmationStatus::Finalized => ConfirmationLevel::Finalized,
            }),
            err: s.err.map(|e| e.to_string()),
        }))
    }
}
