// ============================================================================
// Scheduler
// ============================================================================
// Boucle principale : un cycle = toutes les cibles, dans l'ordre, une fois.
//
// - Les cibles sont scannées séquentiellement (débit sortant borné,
//   attribution des erreurs triviale)
// - L'échec d'une cible est émis à l'Observer puis on passe à la suivante
// - Le début du cycle suivant est aligné sur un multiple de l'intervalle
//   sur l'horloge murale (ex: :00, :15, :30, :45 pour 900 s)
// - Annulation via un watch::Receiver<bool>, vérifiée avant chaque cycle,
//   entre les cibles et pendant l'attente de fin de cycle
//
// CONCEPT RUST : tokio::select!
// - Attend plusieurs futures, garde la première qui termine
// - biased : la branche d'arrêt est toujours testée en premier
// - Un scan abandonné est simplement drop : aucune émission partielle
// ============================================================================

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::PulseConfig;
use crate::error::ConfigError;
use crate::models::{ScanFailure, Target};
use crate::observer::Observer;
use crate::scanner::Scanner;

/// Attente minimale entre deux cycles, même en cas de dépassement
pub const MIN_CYCLE_SLEEP: Duration = Duration::from_secs(1);

/// Issue d'un cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEnd {
    /// Toutes les cibles ont été traitées
    Completed,
    /// Arrêt demandé en cours de cycle
    Stopped,
}

/// Avance maximale sur une frontière pour qu'un départ compte comme "à l'heure"
pub const BOUNDARY_TOLERANCE: Duration = Duration::from_secs(1);

/// Délai avant le prochain cycle
///
/// Le prochain départ est la première frontière `k * interval` strictement
/// après `cycle_start` ; on soustrait le temps déjà passé (via `now`).
/// Plancher d'une seconde pour garantir la progression.
///
/// Un réveil légèrement en avance (moins de `BOUNDARY_TOLERANCE`, plafonné
/// à la moitié de l'intervalle) compte comme parti sur la frontière : sinon
/// on relancerait un cycle complet quelques millisecondes plus tard.
///
/// Exemple : interval = 900 s, départ à hh:15:05, fin à hh:15:15
/// -> attente de 14 min 45 s, prochain départ à hh:30:00.
pub fn next_cycle_delay(cycle_start: DateTime<Utc>, now: DateTime<Utc>, interval_secs: u64) -> Duration {
    let interval_ms = i64::try_from(interval_secs.max(1))
        .unwrap_or(i64::MAX / 1000)
        .saturating_mul(1000);
    let tolerance_ms = (BOUNDARY_TOLERANCE.as_millis() as i64).min(interval_ms / 2);

    let start_ms = cycle_start.timestamp_millis().saturating_add(tolerance_ms);
    let next_boundary_ms = (start_ms.div_euclid(interval_ms) + 1).saturating_mul(interval_ms);
    let remaining_ms = next_boundary_ms.saturating_sub(now.timestamp_millis());

    u64::try_from(remaining_ms)
        .map(Duration::from_millis)
        .unwrap_or(Duration::ZERO)
        .max(MIN_CYCLE_SLEEP)
}

/// Résout quand un arrêt est demandé
///
/// Si l'émetteur disparaît sans avoir demandé l'arrêt, personne ne pourra
/// plus le faire : on attend indéfiniment (le run continue).
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Planificateur des scans
pub struct Scheduler {
    scanner: Scanner,
    interval_secs: u64,
}

impl Scheduler {
    pub fn new(scanner: Scanner, interval_secs: u64) -> Self {
        Self {
            scanner,
            interval_secs,
        }
    }

    pub fn from_config(config: &PulseConfig, scanner: Scanner) -> Self {
        Self::new(scanner, config.scan_interval_secs)
    }

    /// Exécute un cycle : chaque cible dans l'ordre, résultats émis dans
    /// ce même ordre
    pub async fn run_cycle<O>(
        &self,
        targets: &[Target],
        observer: &mut O,
        stop: &mut watch::Receiver<bool>,
    ) -> CycleEnd
    where
        O: Observer + ?Sized,
    {
        for target in targets {
            if *stop.borrow() {
                return CycleEnd::Stopped;
            }

            let outcome = tokio::select! {
                biased;
                _ = stop_requested(stop) => return CycleEnd::Stopped,
                outcome = self.scanner.scan_one(target) => outcome,
            };

            match outcome {
                Ok(result) => observer.on_result(&result),
                Err(e) => {
                    warn!(pair = %target, error = %e, "Target scan failed, continuing cycle");
                    observer.on_failure(&ScanFailure::now(target.clone(), e));
                }
            }
        }

        CycleEnd::Completed
    }

    /// Boucle jusqu'à l'arrêt
    ///
    /// # Erreurs
    /// * `ConfigError::NoTargets` - liste vide, avant toute itération
    /// * `ConfigError::ZeroInterval` - intervalle nul
    pub async fn run<O>(
        &self,
        targets: &[Target],
        observer: &mut O,
        mut stop: watch::Receiver<bool>,
    ) -> Result<(), ConfigError>
    where
        O: Observer + ?Sized,
    {
        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        info!(
            targets = targets.len(),
            interval_secs = self.interval_secs,
            "Scheduler started"
        );

        loop {
            if *stop.borrow() {
                break;
            }

            let cycle_start = Utc::now();
            debug!(%cycle_start, "Cycle started");

            if self.run_cycle(targets, observer, &mut stop).await == CycleEnd::Stopped {
                break;
            }

            let delay = next_cycle_delay(cycle_start, Utc::now(), self.interval_secs);
            debug!(?delay, "Cycle finished, sleeping until next boundary");

            tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fetcher::RetryPolicy;
    use crate::api::http::fakes::{json_reply, status_reply, RecordingSleeper, ScriptedTransport};
    use crate::api::http::HttpReply;
    use crate::api::{DexScreener, ResilientFetcher, Sleeper, TokioSleeper};
    use crate::error::FetchCause;
    use crate::models::{ScanResult, ScanFailure};
    use crate::observer::fakes::{Event, RecordingObserver};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, s).unwrap()
    }

    fn scheduler(replies: Vec<Result<HttpReply, FetchCause>>) -> (Scheduler, Arc<ScriptedTransport>) {
        scheduler_with(
            replies,
            Arc::new(RecordingSleeper::default()),
            RetryPolicy {
                max_retries: 1,
                backoff_base: Duration::from_millis(1),
                timeout: Duration::from_secs(1),
            },
        )
    }

    fn scheduler_with(
        replies: Vec<Result<HttpReply, FetchCause>>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> (Scheduler, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(replies));
        let fetcher = ResilientFetcher::new(transport.clone(), sleeper, policy);
        let source = Arc::new(DexScreener::new("http://api", "solana"));
        let scanner = Scanner::new(fetcher, source, "1h", 72);
        (Scheduler::new(scanner, 900), transport)
    }

    fn ohlcv() -> Result<HttpReply, FetchCause> {
        json_reply(json!({ "pair": { "ohlcv": [
            [1_000, 0, 0, 0, 100.0, 1, "1h"],
            [2_000, 0, 0, 0, 110.0, 1, "1h"],
            [3_000, 0, 0, 0, 99.0, 1, "1h"]
        ]}}))
    }

    fn targets(names: &[&str]) -> Vec<Target> {
        names.iter().map(|n| Target::from(*n)).collect()
    }

    #[test]
    fn test_delay_aligns_to_next_quarter_hour() {
        // départ à 905 s après l'heure, 10 s de travail
        let start = at(10, 15, 5);
        let now = at(10, 15, 15);

        let delay = next_cycle_delay(start, now, 900);

        assert_eq!(delay, Duration::from_secs(885));
        assert_eq!(now + chrono::Duration::from_std(delay).unwrap(), at(10, 30, 0));
    }

    #[test]
    fn test_delay_from_exact_boundary_waits_full_interval() {
        let start = at(10, 15, 0);
        assert_eq!(next_cycle_delay(start, start, 900), Duration::from_secs(900));
    }

    #[test]
    fn test_early_wakeup_counts_as_boundary_start() {
        // le sleep a rendu la main 5 ms avant 10:30:00
        let start = at(10, 30, 0) - chrono::Duration::milliseconds(5);
        let now = at(10, 30, 2);

        let delay = next_cycle_delay(start, now, 900);

        assert_eq!(delay, Duration::from_secs(898));
        assert_eq!(now + chrono::Duration::from_std(delay).unwrap(), at(10, 45, 0));
    }

    #[test]
    fn test_start_outside_tolerance_keeps_nearest_boundary() {
        let start = at(10, 29, 58);
        let now = at(10, 29, 59);
        assert_eq!(next_cycle_delay(start, now, 900), Duration::from_secs(1));
    }

    #[test]
    fn test_delay_has_one_second_floor_on_overrun() {
        let start = at(10, 15, 5);
        let now = at(10, 31, 0); // a dépassé la frontière de 10:30
        assert_eq!(next_cycle_delay(start, now, 900), MIN_CYCLE_SLEEP);
    }

    #[test]
    fn test_delay_millisecond_precision() {
        let start = at(10, 0, 0) + chrono::Duration::milliseconds(250);
        let now = at(10, 0, 30) + chrono::Duration::milliseconds(500);
        assert_eq!(next_cycle_delay(start, now, 60), Duration::from_millis(29_500));
    }

    #[tokio::test]
    async fn test_cycle_isolates_failing_target() {
        let (scheduler, transport) = scheduler(vec![ohlcv(), status_reply(404), ohlcv()]);
        let (_stop_tx, mut stop_rx) = watch::channel(false);
        let mut observer = RecordingObserver::default();

        let end = scheduler
            .run_cycle(&targets(&["A", "B", "C"]), &mut observer, &mut stop_rx)
            .await;

        assert_eq!(end, CycleEnd::Completed);
        assert_eq!(transport.urls().len(), 3);

        let order: Vec<(&str, bool)> = observer
            .events
            .iter()
            .map(|e| match e {
                Event::Result(ScanResult { target, .. }) => (target.as_str(), true),
                Event::Failure(ScanFailure { target, .. }) => (target.as_str(), false),
            })
            .collect();
        assert_eq!(order, vec![("A", true), ("B", false), ("C", true)]);

        if let Event::Failure(failure) = &observer.events[1] {
            assert!(failure.error.contains("404"));
        }
    }

    #[tokio::test]
    async fn test_run_rejects_empty_targets() {
        let (scheduler, _) = scheduler(vec![]);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let mut observer = RecordingObserver::default();

        let err = scheduler.run(&[], &mut observer, stop_rx).await.unwrap_err();

        assert_eq!(err, ConfigError::NoTargets);
    }

    #[tokio::test]
    async fn test_run_exits_when_already_stopped() {
        let (scheduler, transport) = scheduler(vec![ohlcv()]);
        let (_stop_tx, stop_rx) = watch::channel(true);
        let mut observer = RecordingObserver::default();

        scheduler
            .run(&targets(&["A"]), &mut observer, stop_rx)
            .await
            .unwrap();

        assert!(observer.events.is_empty());
        assert!(transport.urls().is_empty());
    }

    /// Demande l'arrêt dès le premier résultat reçu
    struct StopAfterFirst {
        inner: RecordingObserver,
        stop: watch::Sender<bool>,
    }

    impl Observer for StopAfterFirst {
        fn on_result(&mut self, result: &ScanResult) {
            self.inner.on_result(result);
            let _ = self.stop.send(true);
        }
        fn on_failure(&mut self, failure: &ScanFailure) {
            self.inner.on_failure(failure);
        }
    }

    #[tokio::test]
    async fn test_run_stops_between_targets() {
        let (scheduler, transport) = scheduler(vec![ohlcv(), ohlcv()]);
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut observer = StopAfterFirst {
            inner: RecordingObserver::default(),
            stop: stop_tx,
        };

        scheduler
            .run(&targets(&["A", "B"]), &mut observer, stop_rx)
            .await
            .unwrap();

        assert_eq!(observer.inner.events.len(), 1);
        assert_eq!(transport.urls().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_interrupts_end_of_cycle_sleep() {
        let (scheduler, _) = scheduler(vec![ohlcv()]);
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut observer = RecordingObserver::default();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = stop_tx.send(true);
        });

        // l'intervalle de 900 s ne doit pas être attendu
        tokio::time::timeout(
            Duration::from_secs(5),
            scheduler.run(&targets(&["A"]), &mut observer, stop_rx),
        )
        .await
        .expect("scheduler did not stop")
        .unwrap();

        stopper.await.unwrap();
        assert_eq!(observer.events.len(), 1);
    }

    #[tokio::test]
    async fn test_stop_interrupts_fetch_backoff() {
        // 503 puis un backoff réel de 60 s : l'arrêt doit couper l'attente
        let (scheduler, transport) = scheduler_with(
            vec![status_reply(503), ohlcv()],
            Arc::new(TokioSleeper),
            RetryPolicy {
                max_retries: 3,
                backoff_base: Duration::from_secs(60),
                timeout: Duration::from_secs(1),
            },
        );
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut observer = RecordingObserver::default();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = stop_tx.send(true);
        });

        tokio::time::timeout(
            Duration::from_secs(5),
            scheduler.run(&targets(&["A", "B"]), &mut observer, stop_rx),
        )
        .await
        .expect("scheduler did not stop during backoff")
        .unwrap();

        stopper.await.unwrap();
        assert!(observer.events.is_empty());
        assert_eq!(transport.urls().len(), 1);
    }
}
