use std::env;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::Database;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;

use warppay_backend::error::PaymentError;
use warppay_backend::models::payment::PaymentMethod;
use warppay_backend::services::payment::{PaymentService, RECIPIENT_WALLET};
use warppay_backend::services::preorder::{
    preorder_amount, DbCardPersister, PreorderFlow, WalletSigner,
};
use warppay_backend::services::price::SolPriceService;
use warppay_backend::services::profile_cache::ProfileCache;
use warppay_backend::services::solana_rpc::{RpcEndpoint, SolanaRpc};

/// Signs with a local keypair file. Stands in for the browser wallet when
/// running a preorder from the command line.
struct KeypairWallet {
    keypair: Keypair,
    rpc: Arc<dyn SolanaRpc>,
}

#[async_trait]
impl WalletSigner for KeypairWallet {
    fn address(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_and_send(
        &self,
        mut transaction: Transaction,
    ) -> Result<Signature, PaymentError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|e| PaymentError::Validation(format!("signing failed: {}", e)))?;
        self.rpc.send_transaction(&transaction).await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 5 {
        eprintln!(
            "Usage: {} <keypair.json> <SOL|USDC|USDT> <first_name> <last_name>",
            args[0]
        );
        std::process::exit(1);
    }

    let keypair_path = &args[1];
    let method = PaymentMethod::from_str(&args[2])?;
    let first_name = &args[3];
    let last_name = &args[4];

    dotenvy::dotenv().ok();
    let db = Database::connect(env::var("DATABASE_URL")?).await?;

    let rpc_url = env::var("SOLANA_RPC_URL")
        .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_string());
    let rpc = RpcEndpoint::shared(rpc_url);

    let keypair = read_keypair_file(keypair_path)?;
    println!("Paying from {}", keypair.pubkey());

    let coingecko_url = env::var("COINGECKO_API_URL")
        .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string());
    let sol_usd = SolPriceService::new(coingecko_url).sol_usd().await;
    let amount = preorder_amount(method, sol_usd);
    println!("Preorder costs {} {} (SOL/USD {})", amount, method, sol_usd);

    let wallet = KeypairWallet {
        keypair,
        rpc: rpc.clone(),
    };
    let payments = PaymentService::new(rpc, RECIPIENT_WALLET);
    let persister = DbCardPersister::new(Arc::new(db), ProfileCache::new());

    let mut flow = PreorderFlow::new(payments, wallet, persister);
    let receipt = flow.run(method, amount, first_name, last_name).await?;

    println!("Payment confirmed: {}", receipt.signature);
    println!(
        "Card issued: {} exp {} (balance {})",
        receipt.card.number,
        receipt.card.expiry,
        receipt.profile.balance.unwrap_or_default()
    );

    Ok(())
}
