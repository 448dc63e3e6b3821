// ============================================================================
// Observer : destination des résultats de scan
// ============================================================================
// Le coeur ne sait pas comment les résultats sont affichés ou stockés ;
// il appelle simplement l'Observer, dans l'ordre des cibles.
//
// Implémentations fournies :
// - TracingObserver : événements structurés (fichier de logs)
// - ConsoleObserver : une ligne lisible par résultat sur stdout
// - FanoutObserver : relaie vers plusieurs observers
// ============================================================================

use tracing::{error, info};

use crate::models::{ScanFailure, ScanResult};

/// Reçoit les deux types de messages émis par le Scheduler
pub trait Observer {
    fn on_result(&mut self, result: &ScanResult);
    fn on_failure(&mut self, failure: &ScanFailure);
}

/// Observer qui émet des événements tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_result(&mut self, result: &ScanResult) {
        info!(
            target_pair = %result.target,
            volatility_percent = result.volatility_percent,
            samples = result.sample_count,
            observed_at = %result.observed_at,
            "Volatility observed"
        );
    }

    fn on_failure(&mut self, failure: &ScanFailure) {
        error!(
            target_pair = %failure.target,
            error = %failure.error,
            observed_at = %failure.observed_at,
            "Scan failed"
        );
    }
}

/// Observer qui écrit une ligne par message sur stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl ConsoleObserver {
    /// `[2024-01-15T10:15:00+00:00] volatility % for PAIR: 1.2345 (n=72)`
    pub fn format_result(result: &ScanResult) -> String {
        format!(
            "[{}] volatility % for {}: {:.4} (n={})",
            result.observed_at.to_rfc3339(),
            result.target,
            result.volatility_percent,
            result.sample_count
        )
    }

    /// `[2024-01-15T10:15:00+00:00] [ERROR] PAIR: HTTP 404 Not Found after 1 attempt(s)`
    pub fn format_failure(failure: &ScanFailure) -> String {
        format!(
            "[{}] [ERROR] {}: {}",
            failure.observed_at.to_rfc3339(),
            failure.target,
            failure.error
        )
    }
}

impl Observer for ConsoleObserver {
    fn on_result(&mut self, result: &ScanResult) {
        println!("{}", Self::format_result(result));
    }

    fn on_failure(&mut self, failure: &ScanFailure) {
        println!("{}", Self::format_failure(failure));
    }
}

/// Relaie chaque message à tous les observers, dans l'ordre
#[derive(Default)]
pub struct FanoutObserver {
    observers: Vec<Box<dyn Observer + Send>>,
}

impl FanoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute un observer (builder pattern)
    pub fn with(mut self, observer: impl Observer + Send + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }
}

impl Observer for FanoutObserver {
    fn on_result(&mut self, result: &ScanResult) {
        for observer in &mut self.observers {
            observer.on_result(result);
        }
    }

    fn on_failure(&mut self, failure: &ScanFailure) {
        for observer in &mut self.observers {
            observer.on_failure(failure);
        }
    }
}
