// ============================================================================
// Structure : Target
// ============================================================================
// Identifiant opaque d'une paire (adresse de pool, symbole, ...)
//
// CONCEPTS RUST :
// 1. Newtype pattern : un String enveloppé dans un type dédié
//    - Impossible de confondre une cible avec une URL ou un label
// 2. Display : permet d'utiliser la cible dans format! et les logs
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// Paire surveillée, immuable pendant tout le run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    /// Crée une cible depuis n'importe quelle chaîne
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Vue empruntée sur l'identifiant
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
