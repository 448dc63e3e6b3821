// ============================================================================
// VolPulse - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod analysis;  // Volatility Estimator
pub mod api;       // Transport HTTP, Resilient Fetcher, sources
pub mod config;    // Configuration immuable du run
pub mod error;     // Erreurs typées
pub mod models;    // Structures de données
pub mod observer;  // Destination des résultats
pub mod scanner;   // Scan Orchestrator
pub mod scheduler; // Boucle alignée sur l'horloge murale

pub use config::PulseConfig;
pub use error::{ConfigError, FetchCause, FetchError};
pub use scheduler::Scheduler;
