use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::cache::expiry::ExpiryThreshold;
use crate::cache::manager::TokenManager;
use crate::config::credentials::CredentialIdentity;
use crate::config::settings::CacheSettings;
use crate::error::TokenError;
use crate::exchange::client::IamExchangeClient;

/// Manager handed out by the registry: the real IAM exchange client sits
/// behind it.
pub type IamTokenManager = TokenManager<IamExchangeClient>;

/// Process-wide store of one [`TokenManager`] per credential identity.
///
/// Explicitly constructed and injected; the embedding process owns a single
/// registry for its lifetime. Entries are never evicted.
#[derive(Debug)]
pub struct ManagerRegistry {
    threshold: ExpiryThreshold,
    exchange: IamExchangeClient,
    managers: RwLock<HashMap<CredentialIdentity, Arc<IamTokenManager>>>,
}

impl ManagerRegistry {
    /// Validates the settings once and builds an empty registry. The HTTP
    /// client (and its timeout) is shared by every manager created here.
    pub fn new(settings: CacheSettings) -> Result<Self, TokenError> {
        Ok(Self {
            threshold: ExpiryThreshold::new(settings.refresh_threshold)?,
            exchange: IamExchangeClient::new(settings.http_timeout),
            managers: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the manager for `identity`, creating it on first use.
    ///
    /// Every caller asking for the same identity observes the same instance.
    /// Lookups take the shared read lock; a miss upgrades to the write lock
    /// and re-checks through the entry API, so a lookup race publishes
    /// exactly one manager and losing candidates are dropped unbuilt.
    pub fn get_or_create(&self, identity: CredentialIdentity) -> Arc<IamTokenManager> {
        if let Some(manager) = self
            .managers
            .read()
            .expect("registry lock poisoned")
            .get(&identity)
        {
            return Arc::clone(manager);
        }

        let mut managers = self.managers.write().expect("registry lock poisoned");
        let manager = managers.entry(identity.clone()).or_insert_with(|| {
            Arc::new(TokenManager::from_parts(
                identity,
                self.exchange.clone(),
                self.threshold,
            ))
        });
        Arc::clone(manager)
    }

    /// Looks up by raw endpoint and API key, validating them first; blank
    /// fields fail before any lookup happens.
    pub fn get_or_create_from_parts(
        &self,
        endpoint: &str,
        api_key: &str,
    ) -> Result<Arc<IamTokenManager>, TokenError> {
        Ok(self.get_or_create(CredentialIdentity::new(endpoint, api_key)?))
    }

    /// Looks up by the JSON credential blob
    /// `{"apikey": "...", "iam_endpoint": "..."}`; missing, null, or empty
    /// fields fail before any lookup happens.
    pub fn get_or_create_from_json(&self, raw: &str) -> Result<Arc<IamTokenManager>, TokenError> {
        Ok(self.get_or_create(CredentialIdentity::from_json(raw)?))
    }

    /// Number of identities seen so far.
    pub fn len(&self) -> usize {
        self.managers.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
