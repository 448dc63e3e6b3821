// ============================================================================
// Scan Orchestrator
// ============================================================================
// Pour une cible : fetch -> normalize -> estimate -> ScanResult
//
// Seul le fetch peut échouer (FetchError) ; la normalisation et
// l'estimation sont des fonctions totales. Aucun retry ici, c'est le
// rôle du ResilientFetcher.
// ============================================================================

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::analysis::volatility;
use crate::api::{CandleSource, ResilientFetcher};
use crate::config::PulseConfig;
use crate::error::FetchError;
use crate::models::{ScanResult, Series, Target};

/// Orchestrateur d'un scan, partagé par tous les cycles
#[derive(Clone)]
pub struct Scanner {
    fetcher: ResilientFetcher,
    source: Arc<dyn CandleSource>,
    candle_interval: String,
    lookback: usize,
}

impl Scanner {
    pub fn new(
        fetcher: ResilientFetcher,
        source: Arc<dyn CandleSource>,
        candle_interval: impl Into<String>,
        lookback: usize,
    ) -> Self {
        Self {
            fetcher,
            source,
            candle_interval: candle_interval.into(),
            lookback,
        }
    }

    /// Construit le scanner depuis la config (intervalle + lookback)
    pub fn from_config(
        config: &PulseConfig,
        fetcher: ResilientFetcher,
        source: Arc<dyn CandleSource>,
    ) -> Self {
        Self::new(fetcher, source, config.candle_interval.clone(), config.lookback)
    }

    /// Scanne une cible et emballe le résultat
    #[instrument(skip(self, target), fields(pair = %target, source = self.source.name()))]
    pub async fn scan_one(&self, target: &Target) -> Result<ScanResult, FetchError> {
        let url = self.source.url_for(target);
        let payload = self.fetcher.fetch(&url).await?;

        let series = Series::normalize(
            self.source.extract_entries(&payload),
            &self.candle_interval,
            self.lookback,
        );
        let closes = series.closes();
        let volatility_percent = volatility::estimate(&closes);

        debug!(samples = closes.len(), volatility_percent, "Scan complete");

        Ok(ScanResult {
            target: target.clone(),
            volatility_percent,
            sample_count: closes.len(),
            observed_at: Utc::now(),
        })
    }
}
