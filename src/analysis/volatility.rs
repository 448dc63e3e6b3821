// ============================================================================
// Volatility Estimator
// ============================================================================
// Réduit une suite de clôtures à une seule statistique de dispersion :
// l'écart-type (Bessel, n-1) des rendements close-to-close en %.
//
// Les rendements rendent la mesure comparable entre actifs de prix très
// différents, contrairement à l'écart-type des prix bruts.
// ============================================================================

/// Nombre minimal de clôtures pour produire une valeur non nulle
pub const MIN_CLOSES: usize = 3;

/// Nombre minimal de rendements valides
pub const MIN_RETURNS: usize = 2;

/// Rendements consécutifs en pourcentage
///
/// Un pas dont le prix précédent est <= 0 est ignoré : il ne peut pas
/// servir de base à un pourcentage.
pub fn percent_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect()
}

/// Volatilité en % (toujours >= 0)
///
/// Retourne 0.0 quand il n'y a pas assez de données :
/// - moins de 3 clôtures
/// - moins de 2 rendements valides
pub fn estimate(closes: &[f64]) -> f64 {
    if closes.len() < MIN_CLOSES {
        return 0.0;
    }

    let returns = percent_returns(closes);
    if returns.len() < MIN_RETURNS {
        return 0.0;
    }

    sample_std_dev(&returns)
}

/// Écart-type d'échantillon (diviseur n-1), n >= 2
fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
