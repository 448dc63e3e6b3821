// ============================================================================
// Structure : PulseConfig
// ============================================================================
// Configuration immuable du run, construite une seule fois au démarrage
//
// CONCEPTS RUST :
// 1. Valeur immuable passée par référence (&PulseConfig) aux composants
// 2. Aucun composant du coeur ne lit l'environnement lui-même
// 3. Lookup injectable : les tests fournissent leur propre "environnement"
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::Target;

pub const DEFAULT_CHAIN: &str = "solana";
pub const DEFAULT_DEX_API: &str = "https://api.dexscreener.com/latest/dex/pairs";
pub const DEFAULT_SCAN_INTERVAL_SECONDS: u64 = 900; // 15 minutes
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: f64 = 15.0;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_SECONDS: f64 = 2.0;
pub const DEFAULT_CANDLE_INTERVAL: &str = "1h";
pub const DEFAULT_LOOKBACK: usize = 72;

/// Configuration complète de l'agent
#[derive(Debug, Clone)]
pub struct PulseConfig {
    /// Chaîne interrogée (ex: "solana")
    pub chain: String,

    /// URL de base de l'API des paires
    pub api_base: String,

    /// Paires à surveiller, dans l'ordre de scan
    pub targets: Vec<Target>,

    /// Période entre deux cycles, alignée sur l'horloge murale
    pub scan_interval_secs: u64,

    /// Timeout de chaque requête HTTP
    pub request_timeout: Duration,

    /// Nombre maximal de tentatives par fetch
    pub max_retries: u32,

    /// Base du backoff linéaire (base * (tentative + 1))
    pub backoff_base: Duration,

    /// Label d'intervalle des bougies (ex: "1h")
    pub candle_interval: String,

    /// Nombre maximal de bougies récentes conservées
    pub lookback: usize,

    /// Répertoire des fichiers de logs
    pub log_dir: PathBuf,
}

impl PulseConfig {
    /// Charge la configuration depuis les variables d'environnement et les
    /// arguments positionnels (hors nom du programme)
    pub fn from_env_and_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self::from_lookup(args, |name| std::env::var(name).ok())
    }

    /// Variante testable : `lookup` remplace `std::env::var`
    ///
    /// Les arguments CLI non vides priment ; sinon PAIR_ADDRESSES
    /// (séparées par des virgules) fournit les cibles.
    pub fn from_lookup<I, F>(args: I, lookup: F) -> Self
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let mut targets: Vec<Target> = args
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .map(Target::new)
            .collect();

        if targets.is_empty() {
            targets = env
                .string("PAIR_ADDRESSES", "")
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(Target::new)
                .collect();
        }

        let log_dir = match env.raw("VOLPULSE_LOG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_log_dir(),
        };

        Self {
            chain: env.string("CHAIN", DEFAULT_CHAIN),
            api_base: env.string("DEX_API", DEFAULT_DEX_API),
            targets,
            scan_interval_secs: env.parse("SCAN_INTERVAL_SECONDS", DEFAULT_SCAN_INTERVAL_SECONDS),
            request_timeout: env.seconds("REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECONDS),
            max_retries: env.parse("MAX_RETRIES", DEFAULT_MAX_RETRIES),
            backoff_base: env.seconds("BACKOFF_SECONDS", DEFAULT_BACKOFF_SECONDS),
            candle_interval: env.string("CANDLE_INTERVAL", DEFAULT_CANDLE_INTERVAL),
            lookback: env.parse("LOOKBACK", DEFAULT_LOOKBACK),
            log_dir,
        }
    }

    /// Vérifie les invariants avant d'entrer dans la boucle
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        if self.scan_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.lookback == 0 {
            return Err(ConfigError::ZeroLookback);
        }
        if self.candle_interval.trim().is_empty() {
            return Err(ConfigError::BlankCandleInterval);
        }
        Ok(())
    }
}

/// Répertoire de logs par défaut
///
/// - Linux/WSL : ~/.local/share/volpulse/logs
/// - macOS : ~/Library/Application Support/volpulse/logs
/// - Fallback : ./logs
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("volpulse").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Petit lecteur de variables avec valeurs par défaut
///
/// Une valeur vide ou illisible retombe sur le défaut.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: std::str::FromStr>(&self, name: &str, default: T) -> T {
        self.raw(name)
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    fn seconds(&self, name: &str, default: f64) -> Duration {
        let secs: f64 = self.parse(name, default);
        Duration::try_from_secs_f64(secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(args: &[&str], vars: &[(&str, &str)]) -> PulseConfig {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PulseConfig::from_lookup(
            args.iter().map(|a| a.to_string()),
            |name| env.get(name).cloned(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = load(&["PAIR1"], &[]);

        assert_eq!(config.chain, "solana");
        assert_eq!(config.api_base, DEFAULT_DEX_API);
        assert_eq!(config.scan_interval_secs, 900);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff_base, Duration::from_secs(2));
        assert_eq!(config.candle_interval, "1h");
        assert_eq!(config.lookback, 72);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_args_take_precedence_over_env() {
        let config = load(&["A", "  ", "B"], &[("PAIR_ADDRESSES", "X,Y")]);
        let names: Vec<&str> = config.targets.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_targets_from_env() {
        let config = load(&[], &[("PAIR_ADDRESSES", " X, ,Y ,")]);
        let names: Vec<&str> = config.targets.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["X", "Y"]);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = load(
            &["A"],
            &[
                ("SCAN_INTERVAL_SECONDS", "60"),
                ("BACKOFF_SECONDS", "0.5"),
                ("MAX_RETRIES", "not-a-number"),
                ("REQUEST_TIMEOUT", "-3"),
                ("VOLPULSE_LOG_DIR", "/tmp/vp"),
            ],
        );

        assert_eq!(config.scan_interval_secs, 60);
        assert_eq!(config.backoff_base, Duration::from_millis(500));
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/vp"));
    }

    #[test]
    fn test_validate_errors() {
        assert_eq!(load(&[], &[]).validate(), Err(ConfigError::NoTargets));
        assert_eq!(
            load(&["A"], &[("SCAN_INTERVAL_SECONDS", "0")]).validate(),
            Err(ConfigError::ZeroInterval)
        );
        assert_eq!(
            load(&["A"], &[("MAX_RETRIES", "0")]).validate(),
            Err(ConfigError::ZeroRetries)
        );
        assert_eq!(
            load(&["A"], &[("LOOKBACK", "0")]).validate(),
            Err(ConfigError::ZeroLookback)
        );
        assert_eq!(
            load(&["A"], &[("REQUEST_TIMEOUT", "0")]).validate(),
            Err(ConfigError::ZeroTimeout)
        );

        // un label vide dans l'env retombe sur le défaut ; seul un
        // PulseConfig construit à la main peut le porter
        let mut config = load(&["A"], &[]);
        config.candle_interval = "  ".into();
        assert_eq!(config.validate(), Err(ConfigError::BlankCandleInterval));
    }

    #[test]
    fn test_huge_backoff_is_accepted() {
        let config = load(&["A"], &[("BACKOFF_SECONDS", "1e19")]);
        assert_eq!(config.backoff_base, Duration::from_secs_f64(1e19));
        assert_eq!(config.validate(), Ok(()));
    }
}
