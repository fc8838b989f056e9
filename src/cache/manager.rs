use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::expiry::ExpiryThreshold;
use crate::cache::record::TokenRecord;
use crate::config::credentials::CredentialIdentity;
use crate::error::{ExchangeFailure, TokenError};
use crate::exchange::client::ExchangeTokens;
use crate::helpers::time;

/// Outcome of one refresh attempt, broadcast to every caller that joined it.
#[derive(Debug, Clone)]
enum Attempt {
    Pending,
    Done(Result<Arc<TokenRecord>, ExchangeFailure>),
}

type AttemptReceiver = watch::Receiver<Attempt>;

enum Role {
    Leader(watch::Sender<Attempt>),
    Waiter(AttemptReceiver),
}

/// Per-identity token cache.
///
/// Owns at most one [`TokenRecord`] at a time, replaced wholesale on
/// refresh. The fast path is a single atomic load; the slow path admits at
/// most one exchange to the network per manager, with every concurrent
/// caller sharing that attempt's outcome.
pub struct TokenManager<E> {
    identity: CredentialIdentity,
    threshold: ExpiryThreshold,
    exchange: E,
    record: ArcSwapOption<TokenRecord>,
    /// Occupied while a refresh attempt is in flight. Critical sections
    /// under this lock never await.
    refresh: Mutex<Option<AttemptReceiver>>,
}

impl<E> std::fmt::Debug for TokenManager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("identity", &self.identity)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl<E: ExchangeTokens> TokenManager<E> {
    /// Validates `threshold` and builds an empty manager.
    ///
    /// Construction performs no I/O, which is what lets the registry discard
    /// a losing candidate from a construction race unobserved.
    pub fn new(
        identity: CredentialIdentity,
        exchange: E,
        threshold: f64,
    ) -> Result<Self, TokenError> {
        Ok(Self::from_parts(
            identity,
            exchange,
            ExpiryThreshold::new(threshold)?,
        ))
    }

    pub(crate) fn from_parts(
        identity: CredentialIdentity,
        exchange: E,
        threshold: ExpiryThreshold,
    ) -> Self {
        Self {
            identity,
            threshold,
            exchange,
            record: ArcSwapOption::const_empty(),
            refresh: Mutex::new(None),
        }
    }

    pub fn identity(&self) -> &CredentialIdentity {
        &self.identity
    }

    /// Returns a valid access token, refreshing the cached one if it has
    /// entered its refresh window.
    ///
    /// A burst of callers against a stale or empty cache produces exactly
    /// one exchange; the rest block on that attempt and share its outcome.
    /// A failed attempt is surfaced to each caller that waited on it and is
    /// never cached, so the next call starts over.
    pub async fn get_token(&self) -> Result<String, TokenError> {
        if let Some(record) = self.fresh_record() {
            return Ok(record.access_token().to_owned());
        }
        self.refresh_and_wait().await
    }

    /// The cached record, if it exists and is not yet due for refresh.
    fn fresh_record(&self) -> Option<Arc<TokenRecord>> {
        self.record
            .load_full()
            .filter(|record| !record.needs_refresh(time::now()))
    }

    async fn refresh_and_wait(&self) -> Result<String, TokenError> {
        loop {
            let role = {
                let mut slot = self.refresh.lock().expect("refresh slot poisoned");
                // Re-check now that the slot is held: another caller may have
                // finished a refresh while this one was on its way here.
                if let Some(record) = self.fresh_record() {
                    return Ok(record.access_token().to_owned());
                }
                match slot.as_ref() {
                    // A live attempt is in flight; join it.
                    Some(rx) if rx.has_changed().is_ok() => Role::Waiter(rx.clone()),
                    // Vacant, or the previous leader was dropped mid-attempt.
                    _ => {
                        let (tx, rx) = watch::channel(Attempt::Pending);
                        *slot = Some(rx);
                        Role::Leader(tx)
                    }
                }
            };

            match role {
                Role::Leader(tx) => return self.lead_refresh(tx).await,
                Role::Waiter(rx) => match wait_for_attempt(rx).await {
                    Some(Ok(record)) => return Ok(record.access_token().to_owned()),
                    Some(Err(failure)) => return Err(failure.into()),
                    // The leader vanished without publishing; start over.
                    None => continue,
                },
            }
        }
    }

    async fn lead_refresh(&self, tx: watch::Sender<Attempt>) -> Result<String, TokenError> {
        let outcome = match self.exchange.exchange(&self.identity).await {
            Ok(issued) => {
                let record = Arc::new(TokenRecord::issue(
                    issued.access_token,
                    issued.expires_in,
                    time::now(),
                    self.threshold,
                ));
                self.record.store(Some(Arc::clone(&record)));
                debug!(
                    endpoint = %self.identity.endpoint(),
                    lifetime_seconds = record.lifetime_seconds(),
                    "token refreshed"
                );
                Ok(record)
            }
            Err(failure) => {
                warn!(endpoint = %self.identity.endpoint(), error = %failure, "token refresh failed");
                Err(failure)
            }
        };

        // Vacate the slot before publishing, so a caller arriving after the
        // outcome starts a fresh attempt instead of joining a finished one.
        *self.refresh.lock().expect("refresh slot poisoned") = None;
        let _ = tx.send(Attempt::Done(outcome.clone()));

        match outcome {
            Ok(record) => Ok(record.access_token().to_owned()),
            Err(failure) => Err(failure.into()),
        }
    }
}

/// Waits until the attempt publishes an outcome. `None` means the leader was
/// dropped before publishing and the attempt must be restarted.
async fn wait_for_attempt(
    mut rx: AttemptReceiver,
) -> Option<Result<Arc<TokenRecord>, ExchangeFailure>> {
    loop {
        if let Attempt::Done(outcome) = &*rx.borrow_and_update() {
            return Some(outcome.clone());
        }
        if rx.changed().await.is_err() {
            return None;
        }
    }
}
