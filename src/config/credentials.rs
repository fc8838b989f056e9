use std::fmt;
use std::hash::{Hash, Hasher};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::TokenError;

/// Identity of one cached token: which endpoint issued it, for which API
/// key. Used as the registry key.
///
/// The API key is a long-lived secret; it is held behind [`SecretString`] so
/// `Debug` output and log events never carry it. Only the wire encoder reads
/// it back.
#[derive(Clone)]
pub struct CredentialIdentity {
    endpoint: String,
    api_key: SecretString,
}

/// JSON credential blob accepted alongside explicit (endpoint, key) pairs.
#[derive(Debug, Deserialize)]
struct CredentialBlob {
    #[serde(default)]
    apikey: Option<String>,
    #[serde(default)]
    iam_endpoint: Option<String>,
}

impl CredentialIdentity {
    /// Builds an identity from explicit strings, rejecting blank fields.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, TokenError> {
        let endpoint = endpoint.into();
        let api_key = api_key.into();
        if endpoint.trim().is_empty() {
            return Err(TokenError::InvalidConfiguration(
                "token endpoint must not be empty".to_owned(),
            ));
        }
        if api_key.trim().is_empty() {
            return Err(TokenError::InvalidConfiguration(
                "apikey must not be empty".to_owned(),
            ));
        }
        Ok(Self {
            endpoint,
            api_key: SecretString::new(api_key),
        })
    }

    /// Parses the credential blob `{"apikey": "...", "iam_endpoint": "..."}`.
    /// Missing, null, or empty fields are rejected.
    pub fn from_json(raw: &str) -> Result<Self, TokenError> {
        let blob: CredentialBlob = serde_json::from_str(raw).map_err(|err| {
            TokenError::InvalidConfiguration(format!("malformed credential JSON: {err}"))
        })?;
        let endpoint = blob.iam_endpoint.ok_or_else(|| {
            TokenError::InvalidConfiguration("credential JSON is missing 'iam_endpoint'".to_owned())
        })?;
        let api_key = blob.apikey.ok_or_else(|| {
            TokenError::InvalidConfiguration("credential JSON is missing 'apikey'".to_owned())
        })?;
        Self::new(endpoint, api_key)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Reads the API key back for the wire encoder. Keep call sites few.
    pub(crate) fn expose_api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl fmt::Debug for CredentialIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialIdentity")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl PartialEq for CredentialIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.endpoint == other.endpoint
            && self.api_key.expose_secret() == other.api_key.expose_secret()
    }
}

impl Eq for CredentialIdentity {}

impl Hash for CredentialIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.endpoint.hash(state);
        self.api_key.expose_secret().hash(state);
    }
}
