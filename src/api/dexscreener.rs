// ============================================================================
// Source de données : DexScreener
// ============================================================================
// Traduit une paire en URL et extrait les entrées OHLCV brutes du JSON
//
// Format de réponse (champs utiles uniquement) :
// { "pair": { "ohlcv": [[timestampMs, open, high, low, close, volume, interval], ...] } }
// ============================================================================

use serde_json::Value;

use crate::config::PulseConfig;
use crate::models::Target;

/// Une source de bougies : URL par cible + chemin des entrées dans la réponse
pub trait CandleSource: Send + Sync {
    /// Nom court pour les logs
    fn name(&self) -> &str;

    /// URL à interroger pour une cible
    fn url_for(&self, target: &Target) -> String;

    /// Entrées OHLCV brutes ; slice vide si le chemin est absent
    fn extract_entries<'a>(&self, payload: &'a Value) -> &'a [Value];
}

/// API publique DexScreener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexScreener {
    api_base: String,
    chain: String,
}

impl DexScreener {
    pub fn new(api_base: impl Into<String>, chain: impl Into<String>) -> Self {
        let api_base: String = api_base.into();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            chain: chain.into(),
        }
    }

    pub fn from_config(config: &PulseConfig) -> Self {
        Self::new(config.api_base.clone(), config.chain.clone())
    }
}

impl CandleSource for DexScreener {
    fn name(&self) -> &str {
        "dexscreener"
    }

    fn url_for(&self, target: &Target) -> String {
        format!("{}/{}/{}?include=ohlcv", self.api_base, self.chain, target)
    }

    fn extract_entries<'a>(&self, payload: &'a Value) -> &'a [Value] {
        payload
            .pointer("/pair/ohlcv")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
