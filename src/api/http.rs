// ============================================================================
// Transport HTTP et horloge de backoff
// ============================================================================
// Les deux points de suspension du fetcher passent par des traits :
// - HttpTransport : une requête GET brute (statut + corps)
// - Sleeper : l'attente entre deux tentatives
//
// CONCEPTS RUST :
// 1. async-trait : méthodes async dans un trait objet (Arc<dyn ...>)
// 2. Send + Sync : le transport est partagé entre tâches tokio
// 3. En test, on remplace les implémentations par des fakes scriptés
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::debug;

use crate::error::FetchCause;

/// User-Agent envoyé à l'API
pub const USER_AGENT: &str = concat!("volpulse/", env!("CARGO_PKG_VERSION"));

/// Réponse HTTP brute, avant tout parsing JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// Code de statut (200, 404, 503, ...)
    pub status: u16,

    /// Raison canonique ("Not Found", ...), vide si inconnue
    pub reason: String,

    /// Corps texte de la réponse
    pub body: String,
}

impl HttpReply {
    /// Vrai pour un statut 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Émet une requête GET unique, sans retry
///
/// `Err` signale un échec sous le niveau HTTP (timeout, connexion, DNS)
/// ou une requête impossible à construire.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpReply, FetchCause>;
}

/// Attente entre deux tentatives
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper réel basé sur tokio::time
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Transport réel basé sur reqwest
///
/// CONCEPT RUST : Client réutilisable
/// - reqwest::Client garde un pool de connexions
/// - On le construit une seule fois au démarrage
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Construit le client avec les en-têtes par défaut
    pub fn new() -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpReply, FetchCause> {
        debug!(url = %url, ?timeout, "Sending HTTP request");

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_reqwest_error)?;

        debug!(status = %status, bytes = body.len(), "Received HTTP response");

        Ok(HttpReply {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

/// Une erreur de construction (URL invalide) est fatale,
/// tout le reste est un échec de transport
fn classify_reqwest_error(err: reqwest::Error) -> FetchCause {
    if err.is_builder() {
        FetchCause::InvalidRequest(err.to_string())
    } else {
        FetchCause::Transport(err.to_string())
    }
}

// ============================================================================
// Fakes pour les tests
// ============================================================================
