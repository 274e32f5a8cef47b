use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use warppay_backend::entities::users;
use warppay_backend::error::PaymentError;
use warppay_backend::services::payment::{PaymentService, RECIPIENT_WALLET};
use warppay_backend::services::price::SolPriceService;
use warppay_backend::services::profile_cache::ProfileCache;
use warppay_backend::services::solana_rpc::{
    ConfirmationLevel, SignatureStatusInfo, SolanaRpc,
};
use warppay_backend::AppState;

pub const TEST_WALLET: &str = "DRpbCBMxVnDK7maPM5tGv6MvB3v1sRMC86PZ8okm21hy";

/// Scriptable RPC double shared by the integration tests. Counts calls and
/// replays a queue of signature statuses; an empty queue reports pending
/// forever.
pub struct StubRpc {
    pub recipient_ata_exists: bool,
    pub blockhash_calls: AtomicUsize,
    pub account_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub statuses: Mutex<Vec<Result<Option<SignatureStatusInfo>, PaymentError>>>,
}

#[allow(dead_code)]
impl StubRpc {
    pub fn new() -> Self {
        Self {
            recipient_ata_exists: true,
            blockhash_calls: AtomicUsize::new(0),
            account_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            statuses: Mutex::new(Vec::new()),
        }
    }

    pub fn with_statuses(
        statuses: Vec<Result<Option<SignatureStatusInfo>, PaymentError>>,
    ) -> Self {
        let stub = Self::new();
        *stub.statuses.lock().unwrap() = statuses;
        stub
    }

    pub fn pending() -> SignatureStatusInfo {
        SignatureStatusInfo {
            confirmation: Some(ConfirmationLevel::Processed),
            err: None,
        }
    }

    pub fn confirmed() -> SignatureStatusInfo {
        SignatureStatusInfo {
            confirmation: Some(ConfirmationLevel::Confirmed),
            err: None,
        }
    }
}

#[async_trait]
impl SolanaRpc for StubRpc {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), PaymentError> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        Ok((Hash::new_unique(), 360_000_000))
    }

    async fn account_exists(&self, _address: &Pubkey) -> Result<bool, PaymentError> {
        self.account_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.recipient_ata_exists)
    }

    async fn send_transaction(
        &self,
        _transaction: &Transaction,
    ) -> Result<Signature, PaymentError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Signature::default())
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<Option<SignatureStatusInfo>, PaymentError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.is_empty() {
            Ok(Some(Self::pending()))
        } else {
            statuses.remove(0)
        }
    }
}

/// App state over a mocked database and a stub RPC; no network, no Postgres.
#[allow(dead_code)]
pub fn test_state(db: DatabaseConnection, rpc: Arc<StubRpc>) -> AppState {
    AppState {
        db: Arc::new(db),
        payments: PaymentService::new(rpc, RECIPIENT_WALLET),
        // Unroutable base URL: any accidental fetch fails fast and the
        // service falls back to its static quote.
        price: SolPriceService::new("http://127.0.0.1:9".to_string()),
        profiles: ProfileCache::new(),
    }
}

#[allow(dead_code)]
pub fn sample_user(wallet: &str) -> users::Model {
    users::Model {
        id: 1,
        wallet_address: wallet.to_string(),
        username: "warp_rider".to_string(),
        email: "rider@example.com".to_string(),
        profile_picture_url: Some("/images/default-avatar.png".to_string()),
        first_name: None,
        last_name: None,
        card_number: None,
        expiry_date: None,
        security_code: None,
        balance: None,
        order_date: None,
        created_at: None,
        updated_at: None,
    }
}
