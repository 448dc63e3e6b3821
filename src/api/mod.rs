// ============================================================================
// Module : api
// ============================================================================
// Ce module contient tout ce qui touche au réseau :
// - le transport HTTP (reqwest) et l'attente de backoff
// - le Resilient Fetcher (retry borné, classification des erreurs)
// - les sources de données (DexScreener)
// ============================================================================

pub mod dexscreener; // Source DexScreener (URL + chemin des bougies)
pub mod fetcher;     // Retry / backoff
pub mod http;        // Transport HTTP et sleeper

// Re-export des types principaux
pub use dexscreener::{CandleSource, DexScreener};
pub use fetcher::{ResilientFetcher, RetryPolicy};
pub use http::{HttpReply, HttpTransport, ReqwestTransport, Sleeper, TokioSleeper};
