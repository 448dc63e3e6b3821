// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'agent
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod candle; // Bougies normalisées et Series Normalizer
pub mod scan;   // Résultats de scan (succès / échec)
pub mod target; // Identifiant de paire surveillée

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use volpulse::models::candle::Series;
// On peut faire : use volpulse::models::Series;
pub use candle::{Candle, Series};
pub use scan::{ScanFailure, ScanResult};
pub use target::Target;
