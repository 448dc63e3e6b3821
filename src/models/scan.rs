// ============================================================================
// Structures : ScanResult et ScanFailure
// ============================================================================
// Artefacts terminaux d'un scan, remis à l'Observer puis jetés
//
// CONCEPTS RUST :
// 1. Serialize : les observateurs peuvent les écrire en JSON
// 2. Pas d'historique : la valeur est déplacée (move) vers l'Observer
// ============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Target;

/// Résultat d'un scan réussi
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    /// Paire scannée
    pub target: Target,

    /// Écart-type des rendements en % (>= 0)
    pub volatility_percent: f64,

    /// Nombre de bougies utilisées
    /// Distingue "pas assez de données" (petit n) d'une vraie volatilité nulle
    pub sample_count: usize,

    /// Instant de l'observation
    pub observed_at: DateTime<Utc>,
}

/// Échec d'un scan pour une paire (les autres continuent)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanFailure {
    /// Paire en échec
    pub target: Target,

    /// Description lisible de l'erreur
    pub error: String,

    /// Instant de l'échec
    pub observed_at: DateTime<Utc>,
}

impl ScanFailure {
    /// Construit un échec horodaté maintenant
    pub fn now(target: Target, error: impl ToString) -> Self {
        Self {
            target,
            error: error.to_string(),
            observed_at: Utc::now(),
        }
    }
}
