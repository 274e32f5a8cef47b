use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use solana_sdk::pubkey::Pubkey;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warppay_backend::services::payment::{PaymentService, RECIPIENT_WALLET};
use warppay_backend::services::price::SolPriceService;
use warppay_backend::services::profile_cache::ProfileCache;
use warppay_backend::services::solana_rpc::RpcEndpoint;
use warppay_backend::AppState;

const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,warppay_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Connect to database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let rpc_url = env::var("SOLANA_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
    let recipient = match env::var("RECIPIENT_WALLET") {
        Ok(raw) => Pubkey::from_str(&raw).expect("RECIPIENT_WALLET is not a valid pubkey"),
        Err(_) => RECIPIENT_WALLET,
    };
    let coingecko_url =
        env::var("COINGECKO_API_URL").unwrap_or_else(|_| DEFAULT_COINGECKO_URL.to_string());

    tracing::info!(%rpc_url, %recipient, "payment service configured");

    let state = AppState {
        db: Arc::new(db),
        payments: PaymentService::new(Arc::new(RpcEndpoint::new(rpc_url)), recipient),
        price: SolPriceService::new(coingecko_url),
        profiles: ProfileCache::new(),
    };

    let app = warppay_backend::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
