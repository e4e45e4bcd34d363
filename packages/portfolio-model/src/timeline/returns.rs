//! Period and cumulative return calculations shared by every timeline.

/// Calculate period-over-period relative returns.
///
/// `r[t] = values[t] / values[t - 1] - 1`. The first entry has no prior value
/// and is `None`, as is any entry whose prior value is zero.
///
/// # Example
///
/// ```rust
/// use portfolio_model::timeline::relative_returns;
///
/// let returns = relative_returns(&[100.0, 110.0, 99.0]);
/// assert_eq!(returns[0], None);
/// assert!((returns[1].unwrap() - 0.10).abs() < 1e-12);
/// assert!((returns[2].unwrap() + 0.10).abs() < 1e-12);
/// ```
pub fn relative_returns(values: &[f64]) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(values.len());
    if values.is_empty() {
        return result;
    }

    result.push(None);
    for window in values.windows(2) {
        let (prev, curr) = (window[0], window[1]);
        result.push((prev != 0.0).then(|| curr / prev - 1.0));
    }

    result
}

/// Compound a series of relative returns into cumulative returns.
///
/// `c[t] = prod(1 + r[i] for i <= t) - 1`. Missing returns contribute a factor
/// of one, so a series that starts with `None` starts at zero.
pub fn cumulative_returns(returns: &[Option<f64>]) -> Vec<f64> {
    let mut wealth = 1.0;
    returns
        .iter()
        .map(|r| {
            if let Some(r) = r {
                wealth *= 1.0 + r;
            }
            wealth - 1.0
        })
        .collect()
}

/// Round a currency amount to cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compound a per-period rate over a year: `(1 + rate)^periods_per_year - 1`.
pub fn annualize_rate(rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + rate).powi(periods_per_year as i32) - 1.0
}

/// Annualize a cumulative return earned over `periods` periods.
///
/// Returns `None` when there are no periods to scale from.
pub fn annualize_return(cumulative: f64, periods: usize, periods_per_year: u32) -> Option<f64> {
    if periods == 0 {
        return None;
    }

    let years = periods as f64 / periods_per_year as f64;
    Some((1.0 + cumulative).powf(1.0 / years) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_relative_returns() {
        let returns = relative_returns(&[10000.0, 10500.0, 10200.0, 11000.0]);

        assert_eq!(returns.len(), 4);
        assert_eq!(returns[0], None);
        assert_relative_eq!(returns[1].unwrap(), 0.05, epsilon = 1e-12);
        assert_relative_eq!(returns[2].unwrap(), 10200.0 / 10500.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_relative_returns_zero_base() {
        let returns = relative_returns(&[0.0, 50.0, 55.0]);
        assert_eq!(returns[1], None);
        assert_relative_eq!(returns[2].unwrap(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_relative_returns_empty() {
        assert!(relative_returns(&[]).is_empty());
        assert_eq!(relative_returns(&[5.0]), vec![None]);
    }

    #[test]
    fn test_cumulative_matches_price_ratio() {
        let prices = [10000.0, 10500.0, 10200.0, 11000.0, 10890.0];
        let cumulative = cumulative_returns(&relative_returns(&prices));

        assert_eq!(cumulative[0], 0.0);
        // Compounding daily returns recovers the end-to-end price change
        assert_relative_eq!(cumulative[4], 10890.0 / 10000.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cumulative_skips_missing() {
        let cumulative = cumulative_returns(&[None, Some(0.1), None, Some(-0.5)]);
        assert_relative_eq!(cumulative[1], 0.1, epsilon = 1e-12);
        assert_relative_eq!(cumulative[2], 0.1, epsilon = 1e-12);
        assert_relative_eq!(cumulative[3], 1.1 * 0.5 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(1234.5678), 1234.57);
        assert_eq!(round_cents(10.0), 10.0);
        assert_eq!(round_cents(-3.14159), -3.14);
    }

    #[test]
    fn test_annualize_rate() {
        assert_eq!(annualize_rate(0.0, 252), 0.0);
        assert_relative_eq!(annualize_rate(0.01, 12), 1.01_f64.powi(12) - 1.0);
    }

    #[test]
    fn test_annualize_return() {
        // 10% over half a year
        let annualized = annualize_return(0.10, 6, 12).unwrap();
        assert_relative_eq!(annualized, 0.21, epsilon = 1e-9);

        assert_eq!(annualize_return(0.10, 0, 252), None);
    }
}
