use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::PriceSeries;
use crate::{StatArbError, StatArbResult};

// ---------------------------------------------------------------------------
// Decimal math helpers
// ---------------------------------------------------------------------------

/// Newton's method square root with early convergence exit.
fn sqrt_decimal(val: Decimal) -> Decimal {
    if val <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut guess = val / dec!(2);
    if guess == Decimal::ZERO {
        guess = Decimal::ONE;
    }
    for _ in 0..50 {
        let next = (guess + val / guess) / dec!(2);
        if (next - guess).abs() <= dec!(0.0000000000000000000000000001) {
            return next;
        }
        guess = next;
    }
    guess
}

/// Taylor-series natural logarithm.
/// ln(x) = 2 * sum_{k=0..20} (1/(2k+1)) * ((x-1)/(x+1))^(2k+1)
/// Range-reduced via powers of 2.
fn ln_decimal(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if x == Decimal::ONE {
        return Decimal::ZERO;
    }
    let ln2 = dec!(0.6931471805599453);
    let mut val = x;
    let mut k: i64 = 0;
    while val > dec!(2) {
        val /= dec!(2);
        k += 1;
    }
    while val < dec!(0.5) {
        val *= dec!(2);
        k -= 1;
    }
    let u = (val - Decimal::ONE) / (val + Decimal::ONE);
    let u2 = u * u;
    let mut term = u;
    let mut sum = u;
    for n in 1..=20 {
        term *= u2;
        let denom = Decimal::from(2 * n + 1);
        sum += term / denom;
    }
    dec!(2) * sum + Decimal::from(k) * ln2
}

/// Taylor-series exponential, range-reduced by repeated halving so the
/// series argument stays within [-0.5, 0.5].
fn exp_decimal(x: Decimal) -> Decimal {
    if x == Decimal::ZERO {
        return Decimal::ONE;
    }
    // e^-66 is below Decimal's smallest positive value; e^+61 would
    // overflow during the squaring pass.
    if x < dec!(-66) {
        return Decimal::ZERO;
    }
    if x > dec!(60) {
        return Decimal::MAX;
    }
    let mut val = x;
    let mut halvings = 0;
    while val.abs() > dec!(0.5) {
        val /= dec!(2);
        halvings += 1;
    }
    let mut term = Decimal::ONE;
    let mut sum = Decimal::ONE;
    for n in 1..=25 {
        term = term * val / Decimal::from(n);
        sum += term;
    }
    for _ in 0..halvings {
        sum *= sum;
    }
    sum
}

/// Standard normal CDF via the Abramowitz & Stegun 26.2.17 polynomial
/// (|error| < 7.5e-8, more than enough resolution for p-values).
fn norm_cdf_decimal(x: Decimal) -> Decimal {
    let z = x.abs();
    let t = Decimal::ONE / (Decimal::ONE + dec!(0.2316419) * z);
    let poly = t
        * (dec!(0.319381530)
            + t * (dec!(-0.356563782)
                + t * (dec!(1.781477937)
                    + t * (dec!(-1.821255978) + t * dec!(1.330274429)))));
    let pdf = dec!(0.3989422804014327) * exp_decimal(-z * z / dec!(2));
    let tail = pdf * poly;
    let cdf = if x >= Decimal::ZERO {
        Decimal::ONE - tail
    } else {
        tail
    };
    if cdf < Decimal::ZERO {
        Decimal::ZERO
    } else if cdf > Decimal::ONE {
        Decimal::ONE
    } else {
        cdf
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Result of the two-step cointegration estimation for a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CointegrationResult {
    /// OLS slope of B regressed on A; scales A in the spread formula
    pub hedge_ratio: Decimal,
    /// Fitted OLS intercept. Reported for diagnostics only; the spread is
    /// built from the slope alone.
    pub intercept: Decimal,
    /// ADF t-statistic on the spread (more negative = more stationary)
    pub adf_statistic: Decimal,
    /// MacKinnon p-value of the ADF test, in [0, 1]
    pub p_value: Decimal,
    /// Lag order used by the ADF regression
    pub lags_used: usize,
    /// Observations entering the ADF regression
    pub observations: usize,
    /// Mean-reversion half-life in periods, when the AR(1) fit supports one
    pub half_life: Option<Decimal>,
    /// Residual spread, index-aligned with the input series
    pub spread: Vec<Decimal>,
}

/// Outcome of an Augmented Dickey-Fuller test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    /// t-statistic of the lagged-level coefficient
    pub statistic: Decimal,
    /// MacKinnon p-value, in [0, 1]
    pub p_value: Decimal,
    /// Number of lagged difference terms included
    pub lags: usize,
    /// Observations entering the regression
    pub observations: usize,
}

impl AdfResult {
    /// Conventional critical values for the constant-only regression.
    pub fn critical_values() -> [(&'static str, Decimal); 3] {
        [
            ("1%", dec!(-3.43)),
            ("5%", dec!(-2.86)),
            ("10%", dec!(-2.57)),
        ]
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum aligned observations for a meaningful estimation.
const MIN_POINTS: usize = 20;

/// Minimum observations for a standalone ADF test.
const MIN_ADF_POINTS: usize = 10;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Estimate cointegration between two aligned price series.
///
/// Two-step Engle-Granger procedure: an OLS regression of B on A (with
/// intercept) gives the hedge ratio, then the spread
/// `B - hedge_ratio * A` is tested for stationarity with an Augmented
/// Dickey-Fuller test. The fitted intercept is reported but never
/// subtracted from the spread; downstream consumers expect the slope-only
/// residual.
///
/// A constant spread (e.g. two identical series) skips the ADF regression
/// and reports a p-value of zero: a constant is trivially mean-reverting.
pub fn estimate(
    series_a: &PriceSeries,
    series_b: &PriceSeries,
) -> StatArbResult<CointegrationResult> {
    series_a.validate()?;
    series_b.validate()?;
    series_a.ensure_aligned_with(series_b)?;

    let n = series_a.len();
    if n < MIN_POINTS {
        return Err(StatArbError::InsufficientData(format!(
            "at least {} aligned observations required, got {}",
            MIN_POINTS, n
        )));
    }

    let a = series_a.prices();
    let b = series_b.prices();
    let n_dec = Decimal::from(n as i64);

    let mean_a: Decimal = a.iter().copied().sum::<Decimal>() / n_dec;
    let mean_b: Decimal = b.iter().copied().sum::<Decimal>() / n_dec;

    let mut cov_ab = Decimal::ZERO;
    let mut var_a = Decimal::ZERO;
    let mut var_b = Decimal::ZERO;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov_ab += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == Decimal::ZERO {
        return Err(StatArbError::DegenerateSeries(format!(
            "'{}' has zero variance",
            series_a.symbol
        )));
    }
    if var_b == Decimal::ZERO {
        return Err(StatArbError::DegenerateSeries(format!(
            "'{}' has zero variance",
            series_b.symbol
        )));
    }

    let hedge_ratio = cov_ab / var_a;
    let intercept = mean_b - hedge_ratio * mean_a;
    let spread = compute_spread(&b, &a, hedge_ratio);

    let spread_mean: Decimal = spread.iter().copied().sum::<Decimal>() / n_dec;
    let spread_var: Decimal = spread
        .iter()
        .map(|s| {
            let d = *s - spread_mean;
            d * d
        })
        .sum();

    let (adf_statistic, p_value, lags_used, observations) = if spread_var == Decimal::ZERO {
        // Constant spread: the ADF regression is undefined, and the series
        // is trivially mean-reverting.
        (Decimal::ZERO, Decimal::ZERO, 0, n - 1)
    } else {
        let adf = adf_test(&spread, None)?;
        (adf.statistic, adf.p_value, adf.lags, adf.observations)
    };

    let half_life = compute_half_life(&spread);

    Ok(CointegrationResult {
        hedge_ratio,
        intercept,
        adf_statistic,
        p_value,
        lags_used,
        observations,
        half_life,
        spread,
    })
}

/// Spread series `b[t] - hedge_ratio * a[t]`, index-aligned with its inputs.
pub fn compute_spread(b: &[Decimal], a: &[Decimal], hedge_ratio: Decimal) -> Vec<Decimal> {
    b.iter()
        .zip(a.iter())
        .map(|(bi, ai)| bi - hedge_ratio * ai)
        .collect()
}

/// Augmented Dickey-Fuller test with constant, no trend.
///
/// H0: the series has a unit root. Small p-values favor stationarity.
/// Regression: `Δs_t = α + γ·s_{t-1} + Σ φ_i·Δs_{t-i} + ε`; the statistic
/// is the t-ratio of γ and the p-value comes from the MacKinnon (1994)
/// response surface.
///
/// `max_lag = None` picks the lag order by AIC, searching up to Schwert's
/// bound `ceil(12·(n/100)^¼)` with all candidates compared on a common
/// sample. `Some(k)` forces exactly `k` lagged difference terms.
pub fn adf_test(series: &[Decimal], max_lag: Option<usize>) -> StatArbResult<AdfResult> {
    let n = series.len();
    if n < MIN_ADF_POINTS {
        return Err(StatArbError::InsufficientData(format!(
            "ADF test needs at least {} observations, got {}",
            MIN_ADF_POINTS, n
        )));
    }

    let diff: Vec<Decimal> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let bound = (n / 2).saturating_sub(2);

    let lag = match max_lag {
        Some(lag) => {
            if lag > bound {
                return Err(StatArbError::InvalidInput {
                    field: "max_lag".into(),
                    reason: format!(
                        "{} lags leave too few observations (limit {} for {} points)",
                        lag, bound, n
                    ),
                });
            }
            lag
        }
        None => select_lag_by_aic(series, &diff, schwert_lag_bound(n).min(bound))?,
    };

    let fit = fit_adf(series, &diff, lag, lag)?;
    let statistic = fit.t_statistic.ok_or_else(|| {
        StatArbError::DegenerateSeries("zero residual variance in ADF regression".into())
    })?;

    Ok(AdfResult {
        statistic,
        p_value: mackinnon_p_value(statistic),
        lags: lag,
        observations: fit.observations,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Schwert's rule of thumb for the maximum ADF lag order.
fn schwert_lag_bound(n: usize) -> usize {
    let ratio = Decimal::from(n as i64) / dec!(100);
    let root = sqrt_decimal(sqrt_decimal(ratio));
    (dec!(12) * root).ceil().to_usize().unwrap_or(0)
}

/// AIC lag selection over 0..=max_lag, every candidate fitted on the
/// sample the largest model leaves available.
fn select_lag_by_aic(
    levels: &[Decimal],
    diff: &[Decimal],
    max_lag: usize,
) -> StatArbResult<usize> {
    let mut best: Option<(Decimal, usize)> = None;
    let mut last_err = None;
    for lag in 0..=max_lag {
        let fit = match fit_adf(levels, diff, lag, max_lag) {
            Ok(fit) => fit,
            Err(e) => {
                last_err = Some(e);
                continue;
            }
        };
        if fit.sse <= Decimal::ZERO {
            // Exact fit; no larger model can improve on it.
            return Ok(lag);
        }
        let obs = Decimal::from(fit.observations as i64);
        let aic = obs * ln_decimal(fit.sse / obs) + dec!(2) * Decimal::from(fit.params as i64);
        match best {
            Some((best_aic, _)) if aic >= best_aic => {}
            _ => best = Some((aic, lag)),
        }
    }
    best.map(|(_, lag)| lag).ok_or_else(|| {
        last_err.unwrap_or_else(|| {
            StatArbError::InsufficientData("too few observations for ADF lag selection".into())
        })
    })
}

struct AdfFit {
    /// t-ratio of the lagged-level coefficient; None when the residual
    /// variance collapses to zero
    t_statistic: Option<Decimal>,
    sse: Decimal,
    observations: usize,
    params: usize,
}

/// Fit the ADF regression with `lag` difference terms, using rows from
/// `start` onward (so candidate lag orders can share one sample).
fn fit_adf(
    levels: &[Decimal],
    diff: &[Decimal],
    lag: usize,
    start: usize,
) -> StatArbResult<AdfFit> {
    let rows = diff.len().saturating_sub(start);
    let params = lag + 2;
    if rows <= params {
        return Err(StatArbError::InsufficientData(format!(
            "ADF regression with {} lags has {} observations for {} parameters",
            lag, rows, params
        )));
    }

    // Regressors per row t: [1, s_t, Δs_t-1, ..., Δs_t-lag]; response Δs_t.
    let k = params;
    let mut gram = vec![vec![Decimal::ZERO; k]; k];
    let mut moment = vec![Decimal::ZERO; k];
    let mut x = vec![Decimal::ZERO; k];
    for t in start..diff.len() {
        x[0] = Decimal::ONE;
        x[1] = levels[t];
        for i in 1..=lag {
            x[1 + i] = diff[t - i];
        }
        let y = diff[t];
        for i in 0..k {
            moment[i] += x[i] * y;
            for j in i..k {
                gram[i][j] += x[i] * x[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            gram[i][j] = gram[j][i];
        }
    }

    let mut unit = vec![Decimal::ZERO; k];
    unit[1] = Decimal::ONE;
    let solved = solve_linear(gram, vec![moment, unit]).ok_or_else(|| {
        StatArbError::DegenerateSeries("singular regressor matrix in ADF regression".into())
    })?;
    let beta = &solved[0];
    let gram_inv_level = solved[1][1];

    let mut sse = Decimal::ZERO;
    for t in start..diff.len() {
        x[0] = Decimal::ONE;
        x[1] = levels[t];
        for i in 1..=lag {
            x[1 + i] = diff[t - i];
        }
        let mut fitted = Decimal::ZERO;
        for i in 0..k {
            fitted += beta[i] * x[i];
        }
        let e = diff[t] - fitted;
        sse += e * e;
    }

    let dof = rows - k;
    let mse = sse / Decimal::from(dof as i64);
    let se = sqrt_decimal(mse * gram_inv_level);
    let t_statistic = if se == Decimal::ZERO {
        None
    } else {
        Some(beta[1] / se)
    };

    Ok(AdfFit {
        t_statistic,
        sse,
        observations: rows,
        params: k,
    })
}

/// Solve `A·x = b` for each right-hand side by Gaussian elimination with
/// partial pivoting. Returns None when A is singular.
fn solve_linear(
    mut a: Vec<Vec<Decimal>>,
    mut rhs: Vec<Vec<Decimal>>,
) -> Option<Vec<Vec<Decimal>>> {
    let k = a.len();
    for col in 0..k {
        let mut pivot = col;
        for row in (col + 1)..k {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col] == Decimal::ZERO {
            return None;
        }
        a.swap(col, pivot);
        for r in rhs.iter_mut() {
            r.swap(col, pivot);
        }
        for row in (col + 1)..k {
            let factor = a[row][col] / a[col][col];
            if factor == Decimal::ZERO {
                continue;
            }
            for j in col..k {
                let v = a[col][j];
                a[row][j] -= factor * v;
            }
            for r in rhs.iter_mut() {
                let v = r[col];
                r[row] -= factor * v;
            }
        }
    }

    let mut out = Vec::with_capacity(rhs.len());
    for r in &rhs {
        let mut solution = vec![Decimal::ZERO; k];
        for col in (0..k).rev() {
            let mut acc = r[col];
            for j in (col + 1)..k {
                acc -= a[col][j] * solution[j];
            }
            solution[col] = acc / a[col][col];
        }
        out.push(solution);
    }
    Some(out)
}

/// MacKinnon (1994) response-surface p-value for the constant-only,
/// single-series Dickey-Fuller distribution.
fn mackinnon_p_value(tau: Decimal) -> Decimal {
    let tau_max = dec!(2.74);
    let tau_min = dec!(-18.83);
    let tau_star = dec!(-1.61);
    if tau > tau_max {
        return Decimal::ONE;
    }
    if tau < tau_min {
        return Decimal::ZERO;
    }
    let arg = if tau <= tau_star {
        dec!(2.1659) + tau * (dec!(1.4412) + tau * dec!(0.038269))
    } else {
        dec!(1.7339) + tau * (dec!(0.93202) + tau * (dec!(-0.12745) + tau * dec!(-0.010368)))
    };
    norm_cdf_decimal(arg)
}

/// Mean-reversion half-life via AR(1) on the spread.
/// `s_t = c + φ·s_{t-1} + e`; half-life is `-ln(2) / ln(φ)`, meaningful
/// only for φ in (0, 1).
fn compute_half_life(spread: &[Decimal]) -> Option<Decimal> {
    let n = spread.len();
    if n < 3 {
        return None;
    }
    let m = n - 1;
    let m_dec = Decimal::from(m as i64);

    let mut sum_x = Decimal::ZERO;
    let mut sum_y = Decimal::ZERO;
    let mut sum_xy = Decimal::ZERO;
    let mut sum_x2 = Decimal::ZERO;
    for t in 1..n {
        let x = spread[t - 1];
        let y = spread[t];
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denom = m_dec * sum_x2 - sum_x * sum_x;
    if denom == Decimal::ZERO {
        return None;
    }
    let phi = (m_dec * sum_xy - sum_x * sum_y) / denom;
    if phi <= Decimal::ZERO || phi >= Decimal::ONE {
        return None;
    }

    let ln_phi = ln_decimal(phi);
    if ln_phi == Decimal::ZERO {
        return None;
    }
    Some((-dec!(0.6931471805599453) / ln_phi).abs())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PricePoint;
    use chrono::{Days, NaiveDate};

    fn series(symbol: &str, prices: Vec<Decimal>) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let points = prices
            .into_iter()
            .enumerate()
            .map(|(i, price)| PricePoint {
                date: start + Days::new(i as u64),
                price,
            })
            .collect();
        PriceSeries::new(symbol, points).unwrap()
    }

    /// Bounded scrambled noise in [-0.5, 0.5), deterministic in i.
    fn pseudo_noise(i: usize) -> Decimal {
        let v = (i * i * 3571 + i * 7919) % 1000;
        Decimal::from(v as i64) / dec!(1000) - dec!(0.5)
    }

    /// A walking series and a partner at twice its level plus bounded noise.
    fn make_cointegrated_pair(n: usize) -> (PriceSeries, PriceSeries) {
        let mut a_prices = Vec::with_capacity(n);
        let mut b_prices = Vec::with_capacity(n);
        let mut level = dec!(100);
        for i in 0..n {
            level += match i % 3 {
                0 => dec!(0.5),
                1 => dec!(-0.4),
                _ => dec!(0.25),
            };
            a_prices.push(level);
            b_prices.push(dec!(2) * level + pseudo_noise(i) * dec!(0.6));
        }
        (series("AAA", a_prices), series("BBB", b_prices))
    }

    // --- Decimal math helpers ---

    #[test]
    fn test_sqrt_decimal_basic() {
        assert!((sqrt_decimal(dec!(4)) - dec!(2)).abs() < dec!(0.0000000001));
        assert!((sqrt_decimal(dec!(10000)) - dec!(100)).abs() < dec!(0.0000000001));
        assert_eq!(sqrt_decimal(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(sqrt_decimal(dec!(-4)), Decimal::ZERO);
    }

    #[test]
    fn test_sqrt_decimal_tiny_argument() {
        let root = sqrt_decimal(dec!(0.000000000001));
        assert!((root - dec!(0.000001)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_ln_decimal_known_values() {
        assert_eq!(ln_decimal(Decimal::ONE), Decimal::ZERO);
        let e = dec!(2.718281828459045);
        assert!((ln_decimal(e) - Decimal::ONE).abs() < dec!(0.000001));
        assert!((ln_decimal(dec!(8)) - dec!(2.0794415416798359)).abs() < dec!(0.000001));
        assert_eq!(ln_decimal(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_exp_decimal_known_values() {
        assert_eq!(exp_decimal(Decimal::ZERO), Decimal::ONE);
        assert!((exp_decimal(Decimal::ONE) - dec!(2.718281828459045)).abs() < dec!(0.000000001));
        assert!((exp_decimal(dec!(-1)) - dec!(0.367879441171442)).abs() < dec!(0.000000001));
        assert_eq!(exp_decimal(dec!(-80)), Decimal::ZERO);
    }

    #[test]
    fn test_norm_cdf_symmetry() {
        assert!((norm_cdf_decimal(Decimal::ZERO) - dec!(0.5)).abs() < dec!(0.000001));
        assert!((norm_cdf_decimal(dec!(1.96)) - dec!(0.975)).abs() < dec!(0.0001));
        assert!((norm_cdf_decimal(dec!(-1.96)) - dec!(0.025)).abs() < dec!(0.0001));
        assert_eq!(norm_cdf_decimal(dec!(-15)), Decimal::ZERO);
        assert!(norm_cdf_decimal(dec!(6)) > dec!(0.999999));
    }

    // --- MacKinnon p-values ---

    #[test]
    fn test_mackinnon_five_percent_critical_value() {
        let p = mackinnon_p_value(dec!(-2.86));
        assert!((p - dec!(0.05)).abs() < dec!(0.005));
    }

    #[test]
    fn test_mackinnon_one_percent_critical_value() {
        let p = mackinnon_p_value(dec!(-3.43));
        assert!((p - dec!(0.01)).abs() < dec!(0.003));
    }

    #[test]
    fn test_mackinnon_clamps() {
        assert_eq!(mackinnon_p_value(dec!(-19)), Decimal::ZERO);
        assert_eq!(mackinnon_p_value(dec!(3)), Decimal::ONE);
        let near_zero_tau = mackinnon_p_value(Decimal::ZERO);
        assert!(near_zero_tau > dec!(0.9) && near_zero_tau < dec!(0.99));
    }

    #[test]
    fn test_mackinnon_monotone_in_tau() {
        let mut prev = Decimal::ZERO;
        for tau in [dec!(-6), dec!(-4), dec!(-3), dec!(-2), dec!(-1), dec!(0), dec!(1)] {
            let p = mackinnon_p_value(tau);
            assert!(p >= prev);
            prev = p;
        }
    }

    // --- ADF test ---

    #[test]
    fn test_adf_rejects_bounded_noise() {
        let data: Vec<Decimal> = (0..150).map(pseudo_noise).collect();
        let result = adf_test(&data, None).unwrap();
        assert!(result.statistic < dec!(-3));
        assert!(result.p_value < dec!(0.01));
    }

    #[test]
    fn test_adf_does_not_reject_trend() {
        let data: Vec<Decimal> = (0..150)
            .map(|i| Decimal::from(i as i64) / dec!(10) + pseudo_noise(i) / dec!(10))
            .collect();
        let result = adf_test(&data, None).unwrap();
        assert!(result.p_value > dec!(0.1));
    }

    #[test]
    fn test_adf_explicit_lag_is_honored() {
        let data: Vec<Decimal> = (0..100).map(pseudo_noise).collect();
        let result = adf_test(&data, Some(3)).unwrap();
        assert_eq!(result.lags, 3);
        assert!(result.p_value >= Decimal::ZERO && result.p_value <= Decimal::ONE);
    }

    #[test]
    fn test_adf_rejects_excessive_lag() {
        let data: Vec<Decimal> = (0..20).map(pseudo_noise).collect();
        let result = adf_test(&data, Some(15));
        assert!(matches!(result, Err(StatArbError::InvalidInput { .. })));
    }

    #[test]
    fn test_adf_too_short() {
        let data: Vec<Decimal> = (0..5).map(pseudo_noise).collect();
        assert!(matches!(
            adf_test(&data, None),
            Err(StatArbError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_adf_constant_series_is_degenerate() {
        let data = vec![dec!(7); 40];
        assert!(matches!(
            adf_test(&data, None),
            Err(StatArbError::DegenerateSeries(_))
        ));
    }

    // --- Estimation ---

    #[test]
    fn test_estimate_recovers_hedge_ratio() {
        let (a, b) = make_cointegrated_pair(120);
        let result = estimate(&a, &b).unwrap();
        assert!(result.hedge_ratio > dec!(1.9));
        assert!(result.hedge_ratio < dec!(2.1));
        assert_eq!(result.spread.len(), 120);
    }

    #[test]
    fn test_estimate_detects_cointegration() {
        let (a, b) = make_cointegrated_pair(120);
        let result = estimate(&a, &b).unwrap();
        assert!(result.p_value < dec!(0.05));
        assert!(result.adf_statistic < Decimal::ZERO);
    }

    #[test]
    fn test_estimate_p_value_in_unit_interval() {
        let (a, b) = make_cointegrated_pair(60);
        let result = estimate(&a, &b).unwrap();
        assert!(result.p_value >= Decimal::ZERO);
        assert!(result.p_value <= Decimal::ONE);
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let (a, b) = make_cointegrated_pair(80);
        let first = estimate(&a, &b).unwrap();
        let second = estimate(&a, &b).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_identical_series_give_unit_hedge_and_zero_spread() {
        let prices: Vec<Decimal> = (1..=50).map(Decimal::from).collect();
        let a = series("AAA", prices.clone());
        let b = series("BBB", prices);
        let result = estimate(&a, &b).unwrap();
        assert_eq!(result.hedge_ratio, Decimal::ONE);
        assert_eq!(result.intercept, Decimal::ZERO);
        assert!(result.spread.iter().all(|s| *s == Decimal::ZERO));
        assert_eq!(result.p_value, Decimal::ZERO);
        assert_eq!(result.half_life, None);
    }

    #[test]
    fn test_constant_series_a_is_degenerate() {
        let a = series("FLAT", vec![dec!(100); 30]);
        let b = series(
            "UP",
            (0..30).map(|i| dec!(200) + Decimal::from(i as i64)).collect(),
        );
        assert!(matches!(
            estimate(&a, &b),
            Err(StatArbError::DegenerateSeries(_))
        ));
    }

    #[test]
    fn test_constant_series_b_is_degenerate() {
        let a = series(
            "UP",
            (0..30).map(|i| dec!(200) + Decimal::from(i as i64)).collect(),
        );
        let b = series("FLAT", vec![dec!(100); 30]);
        assert!(matches!(
            estimate(&a, &b),
            Err(StatArbError::DegenerateSeries(_))
        ));
    }

    #[test]
    fn test_too_few_points() {
        let a = series("AAA", (0..10).map(|i| Decimal::from(i as i64)).collect());
        let b = series("BBB", (0..10).map(|i| Decimal::from(2 * i as i64)).collect());
        let result = estimate(&a, &b);
        assert!(result.is_err());
        let message = format!("{}", result.unwrap_err());
        assert!(message.contains("20"));
    }

    #[test]
    fn test_mismatched_lengths_are_misaligned() {
        let a = series("AAA", (0..30).map(|i| Decimal::from(i as i64)).collect());
        let b = series("BBB", (0..29).map(|i| Decimal::from(i as i64)).collect());
        assert!(matches!(
            estimate(&a, &b),
            Err(StatArbError::MisalignedSeries(_))
        ));
    }

    #[test]
    fn test_shifted_dates_are_misaligned() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let a = series("AAA", (0..30).map(|i| Decimal::from(i as i64)).collect());
        let points = (0..30)
            .map(|i| PricePoint {
                date: start + Days::new(i as u64 + 1),
                price: Decimal::from(i as i64),
            })
            .collect();
        let b = PriceSeries::new("BBB", points).unwrap();
        assert!(matches!(
            estimate(&a, &b),
            Err(StatArbError::MisalignedSeries(_))
        ));
    }

    #[test]
    fn test_half_life_positive_for_ar1_spread() {
        let n = 120;
        let mut a_prices = Vec::with_capacity(n);
        let mut b_prices = Vec::with_capacity(n);
        let mut level = dec!(100);
        let mut ar = Decimal::ZERO;
        for i in 0..n {
            level += match i % 3 {
                0 => dec!(0.5),
                1 => dec!(-0.4),
                _ => dec!(0.25),
            };
            ar = dec!(0.8) * ar + pseudo_noise(i) * dec!(0.2);
            a_prices.push(level);
            b_prices.push(dec!(2) * level + ar);
        }
        let a = series("AAA", a_prices);
        let b = series("BBB", b_prices);
        let result = estimate(&a, &b).unwrap();
        let half_life = result.half_life.unwrap();
        assert!(half_life > Decimal::ZERO);
        assert!(half_life < dec!(100));
    }

    #[test]
    fn test_compute_spread_formula() {
        let b = vec![dec!(10), dec!(12)];
        let a = vec![dec!(4), dec!(5)];
        let spread = compute_spread(&b, &a, dec!(2));
        assert_eq!(spread, vec![dec!(2), dec!(2)]);
    }

    #[test]
    fn test_result_serialization() {
        let (a, b) = make_cointegrated_pair(60);
        let result = estimate(&a, &b).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("hedge_ratio"));
        assert!(json.contains("p_value"));
        let back: CointegrationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_critical_values_ordering() {
        let cvs = AdfResult::critical_values();
        assert!(cvs[0].1 < cvs[1].1);
        assert!(cvs[1].1 < cvs[2].1);
    }
}
