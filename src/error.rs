// ============================================================================
// Module : error
// ============================================================================
// Erreurs typées de la bibliothèque
//
// CONCEPTS RUST :
// 1. thiserror : dérive Display + std::error::Error depuis des attributs
// 2. Enum de classification : retryable vs fatal est une valeur, pas une
//    hiérarchie d'exceptions
// 3. anyhow reste réservé au binaire (main, logging)
// ============================================================================

use thiserror::Error;

/// Cause d'un échec de requête HTTP
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchCause {
    /// Échec au niveau transport (timeout, connexion refusée, DNS, ...)
    #[error("transport error: {0}")]
    Transport(String),

    /// Réponse HTTP avec un statut non-succès
    #[error("HTTP {code} {reason}")]
    Status { code: u16, reason: String },

    /// Requête impossible à construire (URL mal formée, ...)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Statut 2xx mais corps JSON illisible
    #[error("invalid JSON body: {0}")]
    Decode(String),

    /// Budget de tentatives nul : aucune requête émise
    #[error("no attempt made (max_retries = 0)")]
    NoAttempt,
}

impl FetchCause {
    /// Indique si une nouvelle tentative peut changer le résultat
    ///
    /// - Transport : oui (réseau instable)
    /// - 429 et 5xx : oui (rate-limit ou panne serveur)
    /// - Autres 4xx : non, la requête elle-même est mauvaise
    /// - Decode : oui, un corps tronqué peut passer au prochain essai
    /// - InvalidRequest : non (URL mal formée)
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchCause::Transport(_) => true,
            FetchCause::Status { code, .. } => *code == 429 || (500..600).contains(code),
            FetchCause::Decode(_) => true,
            FetchCause::InvalidRequest(_) | FetchCause::NoAttempt => false,
        }
    }
}

/// Échec définitif d'un fetch (retries épuisés ou erreur fatale)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{cause} after {attempts} attempt(s)")]
pub struct FetchError {
    /// Dernière erreur enregistrée
    pub cause: FetchCause,

    /// Nombre de requêtes effectivement émises
    pub attempts: u32,
}

/// Configuration invalide, détectée avant d'entrer dans la boucle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no pair addresses provided (CLI args or PAIR_ADDRESSES)")]
    NoTargets,

    #[error("scan interval must be greater than 0 seconds")]
    ZeroInterval,

    #[error("max retries must be at least 1")]
    ZeroRetries,

    #[error("request timeout must be greater than 0 seconds")]
    ZeroTimeout,

    #[error("lookback must be at least 1 candle")]
    ZeroLookback,

    #[error("candle interval label must not be blank")]
    BlankCandleInterval,
}
