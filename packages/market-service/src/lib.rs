//! # Market Service
//!
//! Offer store, wallet and transaction-assembler bridges, and the mint,
//! list, cancel and buy workflows of a Cardano NFT marketplace.
//!
//! ## Quick Start
//! ```bash
//! cargo run --bin market-service
//! ```
//!
//! ## Endpoints
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus counters
//! - `POST /wallet/connect` - Enable the wallet
//! - `GET /wallet/assets` - Native assets held by the wallet
//! - `GET /offers` - All listings
//! - `GET /offers/seller/{address}` - Listings by one seller
//! - `POST /mint` - Mint a token
//! - `POST /offers` - List a token
//! - `POST /offers/{index}/cancel` - Cancel a listing
//! - `POST /offers/{index}/buy` - Buy a listing

pub mod assembler;
pub mod bridge;
pub mod config;
mod error;
mod handlers;
pub mod metrics;
mod middleware;
pub mod offer_store;
pub mod response;
mod router;
pub mod signatures;
mod state;
pub mod storage;
pub mod wallet;
pub mod workflow;

pub use config::Config;
pub use error::Error;
pub use router::create as create_router;
pub use state::AppState;
