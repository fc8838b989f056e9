use std::future::Future;
use std::time::Duration;

use http::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::credentials::CredentialIdentity;
use crate::error::ExchangeFailure;
use crate::exchange::response::TokenResponse;
use crate::utils::constants::{GRANT_TYPE_APIKEY, RESPONSE_TYPE_CLOUD_IAM, TOKEN_PATH};

/// Seam between a manager and the network: one exchange attempt per call,
/// no internal retries.
pub trait ExchangeTokens: Send + Sync {
    fn exchange(
        &self,
        identity: &CredentialIdentity,
    ) -> impl Future<Output = Result<TokenResponse, ExchangeFailure>> + Send;
}

/// Exchanges a long-lived API key for a bearer token at
/// `{endpoint}/identity/token`.
#[derive(Debug, Clone)]
pub struct IamExchangeClient {
    client: Client,
}

impl IamExchangeClient {
    pub fn new(http_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(http_timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

pub(crate) fn token_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), TOKEN_PATH)
}

impl ExchangeTokens for IamExchangeClient {
    async fn exchange(
        &self,
        identity: &CredentialIdentity,
    ) -> Result<TokenResponse, ExchangeFailure> {
        let url = token_url(identity.endpoint());
        let form = [
            ("grant_type", GRANT_TYPE_APIKEY),
            ("response_type", RESPONSE_TYPE_CLOUD_IAM),
            ("apikey", identity.expose_api_key()),
        ];

        debug!(endpoint = %identity.endpoint(), "requesting bearer token");
        let response = self
            .client
            .post(&url)
            .header("charset", "utf-8")
            .form(&form)
            .send()
            .await
            .map_err(|err| ExchangeFailure::transport(&url, &err))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body = response
            .text()
            .await
            .map_err(|err| ExchangeFailure::transport(&url, &err))?;

        if !status.is_success() {
            warn!(endpoint = %identity.endpoint(), %status, "token endpoint returned an error");
            return Err(ExchangeFailure::rejected(&url, status, content_type, body));
        }

        serde_json::from_str::<TokenResponse>(&body)
            .map_err(|err| ExchangeFailure::decode(&url, status, content_type, body, &err))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_url_appends_the_fixed_path_once() {
        assert_eq!(
            token_url("https://iam.cloud.ibm.com"),
            "https://iam.cloud.ibm.com/identity/token"
        );
        assert_eq!(
            token_url("https://iam.cloud.ibm.com/"),
            "https://iam.cloud.ibm.com/identity/token"
        );
    }
}
