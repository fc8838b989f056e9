// Shared fixtures for the behavioral tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::credentials::CredentialIdentity;
use crate::error::ExchangeFailure;
use crate::exchange::client::ExchangeTokens;
use crate::exchange::response::TokenResponse;

/// Installs a compact test subscriber once per process.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .compact()
        .try_init();
}

pub fn identity(name: &str) -> CredentialIdentity {
    CredentialIdentity::new(format!("https://iam.test/{name}"), format!("key-{name}"))
        .expect("valid identity")
}

pub fn token_response(token: &str, expires_in: u64) -> TokenResponse {
    TokenResponse {
        access_token: token.to_owned(),
        expires_in,
        refresh_token: None,
        token_type: Some("Bearer".to_owned()),
        expiration: None,
        scope: None,
    }
}

pub fn refusal(status: http::StatusCode, body: &str) -> ExchangeFailure {
    ExchangeFailure {
        endpoint: "https://iam.test/identity/token".to_owned(),
        status: Some(status),
        content_type: Some("application/json".to_owned()),
        body: Some(body.to_owned()),
        detail: "token endpoint rejected the request".to_owned(),
    }
}

/// Scripted stand-in for the exchange client: plays back queued outcomes,
/// then keeps returning the fallback; counts calls; optionally delays so
/// concurrent waiters can pile up on one attempt.
#[derive(Clone)]
pub struct FakeExchange {
    inner: Arc<FakeInner>,
}

struct FakeInner {
    delay: Duration,
    script: Mutex<VecDeque<Result<TokenResponse, ExchangeFailure>>>,
    fallback: Mutex<Result<TokenResponse, ExchangeFailure>>,
    calls: AtomicUsize,
}

impl FakeExchange {
    pub fn returning(fallback: Result<TokenResponse, ExchangeFailure>) -> Self {
        Self::with_delay(fallback, Duration::ZERO)
    }

    pub fn with_delay(fallback: Result<TokenResponse, ExchangeFailure>, delay: Duration) -> Self {
        Self {
            inner: Arc::new(FakeInner {
                delay,
                script: Mutex::new(VecDeque::new()),
                fallback: Mutex::new(fallback),
                calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Queues an outcome to play before falling back.
    pub fn push(&self, outcome: Result<TokenResponse, ExchangeFailure>) {
        self.inner.script.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }
}

impl ExchangeTokens for FakeExchange {
    async fn exchange(
        &self,
        _identity: &CredentialIdentity,
    ) -> Result<TokenResponse, ExchangeFailure> {
        if self.inner.delay > Duration::ZERO {
            tokio::time::sleep(self.inner.delay).await;
        }
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.inner.script.lock().unwrap().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => self.inner.fallback.lock().unwrap().clone(),
        }
    }
}
