use serde::Deserialize;

/// Wire shape of a successful token endpoint response.
///
/// Only `access_token` and `expires_in` feed the cache; the remaining fields
/// are decoded for completeness and tolerated when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Declared lifetime in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Absolute expiration as a UNIX timestamp, as reported by the server.
    #[serde(default)]
    pub expiration: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}
