// ============================================================================
// Resilient Fetcher
// ============================================================================
// Un GET logique avec retry borné et backoff linéaire
//
// Chaque tentative est classée en une valeur (AttemptOutcome) :
// - Success : corps JSON décodé, on retourne
// - Retryable : transport, 429, 5xx, corps illisible -> backoff puis retry
// - Fatal : autre 4xx, URL invalide -> arrêt immédiat
//
// Backoff linéaire : base * (tentative + 1). Latence pire cas bornée et
// prévisible ; le prochain cycle réessaiera de toute façon.
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use crate::api::http::{HttpReply, HttpTransport, Sleeper};
use crate::config::PulseConfig;
use crate::error::{FetchCause, FetchError};

/// Politique de retry, figée pour tout le run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Nombre maximal de requêtes émises
    pub max_retries: u32,

    /// Base du backoff linéaire
    pub backoff_base: Duration,

    /// Timeout de chaque requête
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PulseConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: config.backoff_base,
            timeout: config.request_timeout,
        }
    }

    /// Attente après l'échec de la tentative `attempt` (0-based)
    ///
    /// Sature à `Duration::MAX` au lieu de paniquer sur une base énorme.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .checked_mul(attempt.saturating_add(1))
            .unwrap_or(Duration::MAX)
    }
}

/// Classification d'une tentative
#[derive(Debug)]
enum AttemptOutcome {
    Success(Value),
    Retryable(FetchCause),
    Fatal(FetchCause),
}

impl AttemptOutcome {
    fn classify(reply: Result<HttpReply, FetchCause>) -> Self {
        let cause = match reply {
            Ok(reply) if reply.is_success() => {
                return match serde_json::from_str(&reply.body) {
                    Ok(value) => AttemptOutcome::Success(value),
                    Err(e) => AttemptOutcome::Retryable(FetchCause::Decode(e.to_string())),
                };
            }
            Ok(reply) => FetchCause::Status {
                code: reply.status,
                reason: reply.reason,
            },
            Err(cause) => cause,
        };

        if cause.is_retryable() {
            AttemptOutcome::Retryable(cause)
        } else {
            AttemptOutcome::Fatal(cause)
        }
    }
}

/// État d'un appel à `fetch`, jamais conservé entre deux appels
#[derive(Debug)]
struct RetryState {
    attempts: u32,
    last_error: FetchCause,
}

/// Fetcher avec retry/backoff
///
/// CONCEPT RUST : Arc<dyn Trait>
/// - Le transport et le sleeper sont des objets traits partagés
/// - Permet d'injecter des fakes dans les tests
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl ResilientFetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Récupère et décode le JSON de `url`
    ///
    /// # Retourne
    /// * `Ok(Value)` - corps JSON de la première réponse 2xx
    /// * `Err(FetchError)` - erreur fatale, ou dernière erreur une fois
    ///   les tentatives épuisées
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let mut state = RetryState {
            attempts: 0,
            last_error: FetchCause::NoAttempt,
        };

        while state.attempts < self.policy.max_retries {
            let reply = self.transport.get(url, self.policy.timeout).await;

            match AttemptOutcome::classify(reply) {
                AttemptOutcome::Success(value) => {
                    debug!(attempt = state.attempts + 1, "Fetch succeeded");
                    return Ok(value);
                }
                AttemptOutcome::Fatal(cause) => {
                    error!(attempt = state.attempts + 1, error = %cause, "Fatal fetch error, not retrying");
                    return Err(FetchError {
                        cause,
                        attempts: state.attempts + 1,
                    });
                }
                AttemptOutcome::Retryable(cause) => {
                    let delay = self.policy.backoff_for(state.attempts);
                    warn!(
                        attempt = state.attempts + 1,
                        max = self.policy.max_retries,
                        error = %cause,
                        ?delay,
                        "Retryable fetch error, backing off"
                    );
                    state.last_error = cause;
                    self.sleeper.sleep(delay).await;
                    state.attempts += 1;
                }
            }
        }

        error!(attempts = state.attempts, error = %state.last_error, "Fetch retries exhausted");
        Err(FetchError {
            cause: state.last_error,
            attempts: state.attempts,
        })
    }
}
