//! Alpha/beta regression of portfolio returns on benchmark returns.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{mean, sample_std, ZERO_VARIANCE_TOLERANCE};
use crate::timeline::{annualize_rate, BenchmarkTimeline, ReturnSeries};
use crate::types::RegressionResult;
use crate::{Error, Result};

/// Regress a portfolio on a benchmark timeline, labelled with its name.
pub fn regress_benchmark<P: ReturnSeries + ?Sized>(
    portfolio: &P,
    benchmark: &BenchmarkTimeline,
    periods_per_year: u32,
) -> Result<RegressionResult> {
    regress(portfolio, benchmark, benchmark.name(), periods_per_year)
}

/// Fit `portfolio = alpha + beta * benchmark` by ordinary least squares.
///
/// Both series are restricted to the dates after the portfolio's first date
/// up to its last date and inner-joined on date; dates where either return is
/// undefined are dropped.
///
/// # Errors
///
/// * [`Error::UnderdeterminedRegression`] with fewer than two joined dates
/// * [`Error::DegenerateStatistic`] when the benchmark returns do not vary
pub fn regress<P, B>(
    portfolio: &P,
    benchmark: &B,
    benchmark_name: &str,
    periods_per_year: u32,
) -> Result<RegressionResult>
where
    P: ReturnSeries + ?Sized,
    B: ReturnSeries + ?Sized,
{
    let (y, x) = aligned_returns(portfolio, benchmark);
    let fit = ols(&y, &x)?;

    let active: Vec<f64> = y.iter().zip(&x).map(|(p, b)| p - b).collect();
    let scale = (periods_per_year as f64).sqrt();
    let active_std = sample_std(&active).filter(|std| *std > ZERO_VARIANCE_TOLERANCE);
    let tracking_error = active_std.map(|std| std * scale);
    let information_ratio = match (mean(&active), active_std) {
        (Some(mean), Some(std)) => Some(mean / std * scale),
        _ => None,
    };

    tracing::debug!(
        benchmark = benchmark_name,
        observations = y.len(),
        alpha = fit.alpha,
        beta = fit.beta,
        "Fitted benchmark regression"
    );

    Ok(RegressionResult {
        benchmark_name: benchmark_name.to_string(),
        alpha: fit.alpha,
        alpha_annualized: annualize_rate(fit.alpha, periods_per_year),
        beta: fit.beta,
        r_squared: fit.r_squared,
        tracking_error,
        information_ratio,
        observations: y.len(),
    })
}

/// Joined `(portfolio, benchmark)` returns over the portfolio's return window.
fn aligned_returns<P, B>(portfolio: &P, benchmark: &B) -> (Vec<f64>, Vec<f64>)
where
    P: ReturnSeries + ?Sized,
    B: ReturnSeries + ?Sized,
{
    let points = portfolio.return_points();
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return (Vec::new(), Vec::new());
    };
    let (first, last) = (first.date, last.date);
    let in_window = |date: NaiveDate| date > first && date <= last;

    let benchmark_returns: BTreeMap<NaiveDate, f64> = benchmark
        .return_points()
        .into_iter()
        .filter(|p| in_window(p.date))
        .filter_map(|p| p.relative_daily_return.map(|r| (p.date, r)))
        .collect();

    points
        .iter()
        .filter(|p| in_window(p.date))
        .filter_map(|p| {
            let r = p.relative_daily_return?;
            benchmark_returns.get(&p.date).map(|&b| (r, b))
        })
        .unzip()
}

#[derive(Debug, Clone, Copy)]
struct OlsFit {
    alpha: f64,
    beta: f64,
    r_squared: Option<f64>,
}

/// Simple linear regression with intercept.
fn ols(y: &[f64], x: &[f64]) -> Result<OlsFit> {
    let n = y.len().min(x.len());
    if n < 2 {
        return Err(Error::UnderdeterminedRegression { observations: n });
    }

    let (y, x) = (&y[..n], &x[..n]);
    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let mut ss_xy = 0.0;
    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        ss_xy += dx * dy;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
    }

    if ss_xx.sqrt() <= ZERO_VARIANCE_TOLERANCE {
        return Err(Error::DegenerateStatistic(
            "benchmark returns have zero variance".to_string(),
        ));
    }

    let beta = ss_xy / ss_xx;
    let alpha = y_mean - beta * x_mean;
    let r_squared =
        (ss_yy.sqrt() > ZERO_VARIANCE_TOLERANCE).then(|| (ss_xy * ss_xy) / (ss_xx * ss_yy));

    Ok(OlsFit {
        alpha,
        beta,
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReturnPoint;
    use approx::assert_relative_eq;

    struct Series(Vec<ReturnPoint>);

    impl ReturnSeries for Series {
        fn return_points(&self) -> Vec<ReturnPoint> {
            self.0.clone()
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    /// Series starting on `start` whose first point carries no return.
    fn series(start: u32, returns: &[f64]) -> Series {
        let mut points = vec![ReturnPoint {
            date: day(start),
            relative_daily_return: None,
            relative_cumulative_return: 0.0,
        }];
        let mut wealth = 1.0;
        for (i, &r) in returns.iter().enumerate() {
            wealth *= 1.0 + r;
            points.push(ReturnPoint {
                date: day(start + 1 + i as u32),
                relative_daily_return: Some(r),
                relative_cumulative_return: wealth - 1.0,
            });
        }
        Series(points)
    }

    const RETURNS: [f64; 8] = [0.01, -0.004, 0.007, 0.012, -0.009, 0.003, -0.001, 0.006];

    #[test]
    fn test_regress_against_itself() {
        let portfolio = series(1, &RETURNS);
        let result = regress(&portfolio, &portfolio, "Self", 252).unwrap();

        assert_relative_eq!(result.beta, 1.0, epsilon = 1e-9);
        assert_relative_eq!(result.alpha, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.alpha_annualized, 0.0, epsilon = 1e-9);
        assert_relative_eq!(result.r_squared.unwrap(), 1.0, epsilon = 1e-9);
        assert_eq!(result.observations, RETURNS.len());
        assert_eq!(result.tracking_error, None);
    }

    #[test]
    fn test_regress_linear_relationship() {
        let benchmark = series(1, &RETURNS);
        let scaled: Vec<f64> = RETURNS.iter().map(|r| 0.0005 + 1.5 * r).collect();
        let portfolio = series(1, &scaled);

        let result = regress(&portfolio, &benchmark, "Index", 252).unwrap();
        assert_relative_eq!(result.beta, 1.5, epsilon = 1e-9);
        assert_relative_eq!(result.alpha, 0.0005, epsilon = 1e-12);
        assert_relative_eq!(
            result.alpha_annualized,
            1.0005_f64.powi(252) - 1.0,
            epsilon = 1e-9
        );
        assert!(result.tracking_error.unwrap() > 0.0);
        assert!(result.information_ratio.is_some());
    }

    #[test]
    fn test_regress_inner_join_drops_unmatched_days() {
        let portfolio = series(1, &RETURNS);
        // Benchmark starts later and is missing a day
        let mut benchmark = series(3, &RETURNS[2..]);
        benchmark.0.remove(3);

        let result = regress(&portfolio, &benchmark, "Index", 252).unwrap();
        // Joined dates: portfolio days 4..=9 minus the removed day 6
        assert_eq!(result.observations, 5);
    }

    #[test]
    fn test_regress_excludes_portfolio_first_date() {
        let portfolio = series(5, &[0.01, 0.02, -0.01]);
        let benchmark = series(1, &[0.001, 0.002, 0.003, 0.004, 0.005, 0.006, 0.007]);

        let result = regress(&portfolio, &benchmark, "Index", 252).unwrap();
        // Day 5 is the portfolio's first date and never enters the fit
        assert_eq!(result.observations, 3);
    }

    #[test]
    fn test_regress_underdetermined() {
        let portfolio = series(1, &[0.01]);
        let result = regress(&portfolio, &portfolio, "Self", 252);
        assert!(matches!(
            result,
            Err(Error::UnderdeterminedRegression { observations: 1 })
        ));

        let disjoint = regress(&series(1, &RETURNS), &series(20, &RETURNS), "Later", 252);
        assert!(matches!(
            disjoint,
            Err(Error::UnderdeterminedRegression { observations: 0 })
        ));
    }

    #[test]
    fn test_regress_flat_benchmark() {
        let portfolio = series(1, &RETURNS);
        let flat = series(1, &[0.0; 8]);
        let result = regress(&portfolio, &flat, "Cash", 252);
        assert!(matches!(result, Err(Error::DegenerateStatistic(_))));
    }

    #[test]
    fn test_regress_benchmark_uses_name() {
        use crate::types::PriceBar;

        let bars: Vec<PriceBar> = [100.0, 101.0, 100.5, 102.0, 101.0]
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::from_close(day(1 + i as u32), c))
            .collect();
        let benchmark = BenchmarkTimeline::build("^GSPC", "S&P 500", bars).unwrap();

        let result = regress_benchmark(&benchmark, &benchmark, 252).unwrap();
        assert_eq!(result.benchmark_name, "S&P 500");
        assert_relative_eq!(result.beta, 1.0, epsilon = 1e-9);
    }
}
