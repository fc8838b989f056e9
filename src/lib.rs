//! # IAM Token Cache
//!
//! Obtains bearer tokens from an IAM token endpoint using a long-lived API
//! key, caches them in memory, and refreshes them before expiry.
//!
//! Modules:
//! - `config` — credential identity and process-level cache settings
//! - `cache` — expiry policy, token records, per-identity managers, registry
//! - `exchange` — the token endpoint wire protocol
//!
//! The registry hands out one manager per (endpoint, API key) pair; callers
//! ask their manager for a token, and the manager either serves the cached
//! one or performs a single coordinated exchange on behalf of everyone
//! waiting.

pub mod cache;
pub mod config;
pub mod error;
pub mod exchange;
pub mod helpers;
pub mod tests;
pub mod utils;

pub use crate::cache::expiry::ExpiryThreshold;
pub use crate::cache::manager::TokenManager;
pub use crate::cache::record::TokenRecord;
pub use crate::cache::registry::{IamTokenManager, ManagerRegistry};
pub use crate::config::credentials::CredentialIdentity;
pub use crate::config::settings::CacheSettings;
pub use crate::error::{ExchangeFailure, TokenError};
pub use crate::exchange::client::{ExchangeTokens, IamExchangeClient};
pub use crate::exchange::response::TokenResponse;
