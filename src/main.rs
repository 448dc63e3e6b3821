// ============================================================================
// VolPulse - Agent de surveillance de volatilité
// ============================================================================
// Scanne périodiquement des paires DexScreener, normalise les bougies OHLCV
// et émet la volatilité (écart-type des rendements en %) de chaque paire.
//
// CONCEPTS RUST CLÉS :
// 1. #[tokio::main] : runtime async pour les appels HTTP et les sleeps
// 2. Configuration immuable construite une fois, passée par référence
// 3. watch channel : arrêt propre sur Ctrl+C
// ============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info};

use volpulse::api::{DexScreener, ReqwestTransport, ResilientFetcher, RetryPolicy, TokioSleeper};
use volpulse::observer::{ConsoleObserver, FanoutObserver, TracingObserver};
use volpulse::scanner::Scanner;
use volpulse::{PulseConfig, Scheduler};

// ============================================================================
// Initialisation du logging
// ============================================================================
// - Sortie console pour suivre l'agent en direct
// - Fichier avec rotation quotidienne pour l'historique
// ============================================================================

/// Initialise le système de logging (console + fichier)
///
/// CONCEPT RUST : Tracing subscriber
/// - Registry : point central des logs
/// - Layer : transforme et route les logs
/// - EnvFilter : filtre par niveau (RUST_LOG env var)
/// - RollingFileAppender : rotation automatique
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f ~/.local/share/volpulse/logs/volpulse.log.*
///
/// # Contrôler le niveau de log
/// RUST_LOG=debug cargo run -- <PAIR>
/// RUST_LOG=volpulse=trace cargo run -- <PAIR>
/// ```
fn init_logging(config: &PulseConfig) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = &config.log_dir;

    // Crée le répertoire s'il n'existe pas
    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    // Rotation quotidienne : volpulse.log.2024-01-15
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "volpulse.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: volpulse::api::fetcher)
                .with_line_number(true), // Inclut le numéro de ligne
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr) // stdout reste aux résultats
                .with_target(false),
        )
        .with(
            // Par défaut : debug pour volpulse, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "volpulse=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'installation du subscriber tracing")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Arguments positionnels = paires ; sinon PAIR_ADDRESSES
    let config = PulseConfig::from_env_and_args(std::env::args().skip(1));

    // Logging en premier ; un échec n'empêche pas l'agent de tourner
    init_logging(&config).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });

    config
        .validate()
        .context("Provide pair addresses as CLI args or set PAIR_ADDRESSES env")?;

    info!(
        chain = %config.chain,
        targets = config.targets.len(),
        interval_secs = config.scan_interval_secs,
        candle_interval = %config.candle_interval,
        lookback = config.lookback,
        "VolPulse starting up"
    );

    // Assemble la chaîne : transport -> fetcher -> scanner -> scheduler
    let transport = ReqwestTransport::new().context("Échec de la création du client HTTP")?;
    let fetcher = ResilientFetcher::new(
        Arc::new(transport),
        Arc::new(TokioSleeper),
        RetryPolicy::from_config(&config),
    );
    let scanner = Scanner::from_config(&config, fetcher, Arc::new(DexScreener::from_config(&config)));
    let scheduler = Scheduler::from_config(&config, scanner);

    let mut observer = FanoutObserver::new()
        .with(ConsoleObserver)
        .with(TracingObserver);

    // Ctrl+C -> stop = true ; pris en compte au prochain point de suspension
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = stop_tx.send(true);
            }
            Err(e) => {
                // Sans handler, le run continue jusqu'à ce que le process soit tué
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    });

    scheduler
        .run(&config.targets, &mut observer, stop_rx)
        .await
        .context("Scheduler configuration error")?;

    info!("Stopped by user");
    println!("\n[{}] stopped by user", chrono::Utc::now().to_rfc3339());
    Ok(())
}
