// ============================================================================
// Module : analysis
// ============================================================================
// Statistiques calculées sur les séries normalisées
// ============================================================================

pub mod volatility; // Volatility Estimator

pub use volatility::{estimate, percent_returns};
