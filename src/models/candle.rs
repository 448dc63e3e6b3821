// ============================================================================
// Structures : Candle et Series
// ============================================================================
// Représente les bougies normalisées d'une paire pour un intervalle donné
//
// CONCEPTS RUST :
// 1. i64 pour les timestamps en millisecondes (format de l'API)
// 2. f64 pour les prix de clôture (toujours finis après normalisation)
// 3. serde_json::Value : entrée brute hétérogène, jamais propagée en erreur
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Index des champs dans une entrée tableau
/// `[timestampMs, open, high, low, close, volume, intervalCode]`
const TS_INDEX: usize = 0;
const CLOSE_INDEX: usize = 4;
const INTERVAL_INDEX: usize = 6;

/// Une bougie normalisée : seuls le timestamp et la clôture nous intéressent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Timestamp d'ouverture en millisecondes (> 0)
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,

    /// Prix de clôture (fini)
    pub close: f64,

    /// Label d'intervalle (ex: "1h")
    pub interval: String,
}

impl Candle {
    /// Constructeur : crée une nouvelle bougie
    pub fn new(timestamp_ms: i64, close: f64, interval: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            close,
            interval: interval.into(),
        }
    }

    /// Convertit le timestamp en DateTime<Utc>
    ///
    /// CONCEPT RUST : Option
    /// - None si le timestamp sort de la plage représentable par chrono
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }

    /// Parse une entrée brute ; None si elle doit être ignorée
    ///
    /// Formes acceptées :
    /// - tableau `[ts, open, high, low, close, volume, interval]`
    /// - objet `{ "timestamp"|"t", "close"|"c", "interval"|"i" }`
    ///
    /// Les champs en trop sont ignorés.
    fn from_entry(entry: &Value, target_interval: &str) -> Option<Self> {
        let (ts, close, interval) = match entry {
            Value::Array(fields) => (
                fields.get(TS_INDEX)?,
                fields.get(CLOSE_INDEX)?,
                fields.get(INTERVAL_INDEX)?,
            ),
            Value::Object(map) => (
                map.get("timestamp").or_else(|| map.get("t"))?,
                map.get("close").or_else(|| map.get("c"))?,
                map.get("interval").or_else(|| map.get("i"))?,
            ),
            _ => return None,
        };

        if interval.as_str()? != target_interval {
            return None;
        }

        let timestamp_ms = timestamp_of(ts).filter(|&t| t > 0)?;
        let close = finite_of(close)?;

        Some(Self::new(timestamp_ms, close, target_interval))
    }
}

/// Timestamp entier ; un nombre fractionnaire est tronqué,
/// une chaîne doit contenir un entier
fn timestamp_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Prix fini, depuis un nombre ou une chaîne numérique
fn finite_of(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    raw.is_finite().then_some(raw)
}

/// Série ordonnée de bougies pour un intervalle
///
/// Invariants après `normalize` :
/// - timestamps strictement croissants (pas de doublon)
/// - même label d'intervalle partout
/// - longueur <= lookback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Intervalle commun à toutes les bougies
    pub interval: String,

    /// Bougies, triées par timestamp croissant
    pub candles: Vec<Candle>,
}

impl Series {
    /// Série vide pour un intervalle
    pub fn empty(interval: impl Into<String>) -> Self {
        Self {
            interval: interval.into(),
            candles: Vec::new(),
        }
    }

    /// Series Normalizer : entrées brutes -> série propre
    ///
    /// Algorithme :
    /// 1. Filtre les entrées mal formées ou d'un autre intervalle
    /// 2. Tri stable par timestamp
    /// 3. Doublons de timestamp : la dernière entrée gagne (bougie
    ///    provisoire puis révision finale)
    /// 4. Garde les `lookback` plus récentes (0 = pas de limite)
    ///
    /// N'échoue jamais : une réponse inutilisable donne une série vide.
    pub fn normalize(entries: &[Value], target_interval: &str, lookback: usize) -> Self {
        let mut parsed: Vec<Candle> = entries
            .iter()
            .filter_map(|entry| Candle::from_entry(entry, target_interval))
            .collect();

        let skipped = entries.len() - parsed.len();

        // sort_by_key est stable : l'ordre d'entrée départage les égalités
        parsed.sort_by_key(|c| c.timestamp_ms);

        let mut candles: Vec<Candle> = Vec::with_capacity(parsed.len());
        for candle in parsed {
            match candles.last_mut() {
                Some(last) if last.timestamp_ms == candle.timestamp_ms => *last = candle,
                _ => candles.push(candle),
            }
        }

        if lookback > 0 && candles.len() > lookback {
            let excess = candles.len() - lookback;
            candles.drain(..excess);
        }

        debug!(
            total = entries.len(),
            skipped,
            kept = candles.len(),
            interval = target_interval,
            "Normalized OHLCV entries"
        );

        Self {
            interval: target_interval.to_string(),
            candles,
        }
    }

    /// Prix de clôture, dans l'ordre chronologique
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Retourne le nombre de bougies
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Vérifie si la série est vide
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Retourne la bougie la plus récente
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
