// src/lib.rs

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use services::{payment::PaymentService, price::SolPriceService, profile_cache::ProfileCache};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub payments: PaymentService,
    pub price: SolPriceService,
    pub profiles: ProfileCache,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello_warppay))
        .route("/api/payments/sol-price", get(handlers::payment::sol_price))
        .route("/api/payments/prepare", post(handlers::payment::prepare_payment))
        .route(
            "/api/payments/broadcast",
            post(handlers::payment::broadcast_transaction),
        )
        .route(
            "/api/users",
            post(handlers::user::create_user).get(handlers::user::get_user),
        )
        .route("/api/users/update", put(handlers::user::update_user))
        .route(
            "/api/users/check-username",
            get(handlers::user::check_username_get).post(handlers::user::check_username_post),
        )
        .route("/api/users/delete", delete(handlers::user::delete_user))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn hello_warppay() -> &'static str {
    "WarpPay backend is running"
}

pub mod entities {
    pub mod prelude;
    pub mod users;
}

pub mod services {
    pub mod card;
    pub mod payment;
    pub mod preorder;
    pub mod price;
    pub mod profile_cache;
    pub mod profiles;
    pub mod solana_rpc;
}

pub mod error;
pub mod models;
pub mod handlers;
