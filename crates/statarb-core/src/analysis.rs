use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::cointegration;
use crate::signals::{self, PositionState};
use crate::types::PriceSeries;
use crate::zscore;
use crate::{StatArbError, StatArbResult};

// ---------------------------------------------------------------------------
// Decimal math helpers
// ---------------------------------------------------------------------------

fn sqrt_decimal(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut guess = x / dec!(2);
    if guess == Decimal::ZERO {
        guess = Decimal::ONE;
    }
    for _ in 0..50 {
        let next = (guess + x / guess) / dec!(2);
        if (next - guess).abs() <= dec!(0.0000000000000000000000000001) {
            return next;
        }
        guess = next;
    }
    guess
}

fn stdev_decimal(values: &[Decimal]) -> Decimal {
    let n = Decimal::from(values.len() as i64);
    if n <= Decimal::ONE {
        return Decimal::ZERO;
    }
    let mean = values.iter().copied().sum::<Decimal>() / n;
    let var = values
        .iter()
        .map(|v| {
            let d = *v - mean;
            d * d
        })
        .sum::<Decimal>()
        / (n - Decimal::ONE);
    sqrt_decimal(var)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_window() -> usize {
    30
}

fn default_entry_threshold() -> Decimal {
    dec!(2.0)
}

fn default_exit_threshold() -> Decimal {
    dec!(0.5)
}

fn default_significance_level() -> Decimal {
    dec!(0.05)
}

/// Input for a full pair analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairAnalysisInput {
    /// Price history of the instrument used to hedge
    pub series_a: PriceSeries,
    /// Price history of the instrument being hedged
    pub series_b: PriceSeries,
    /// Rolling window for the z-score (default 30)
    #[serde(default = "default_window")]
    pub window: usize,
    /// Z-score magnitude that opens a position (default 2.0)
    #[serde(default = "default_entry_threshold")]
    pub entry_threshold: Decimal,
    /// Z-score magnitude band reported for exits (default 0.5)
    #[serde(default = "default_exit_threshold")]
    pub exit_threshold: Decimal,
    /// ADF p-value below which the pair counts as cointegrated (default 0.05)
    #[serde(default = "default_significance_level")]
    pub significance_level: Decimal,
}

/// Output of a full pair analysis. All series share one date index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairAnalysisOutput {
    pub symbol_a: String,
    pub symbol_b: String,
    /// The shared timestamp index
    pub dates: Vec<NaiveDate>,
    /// OLS hedge ratio of B on A
    pub hedge_ratio: Decimal,
    /// Fitted OLS intercept (diagnostic; not part of the spread)
    pub intercept: Decimal,
    /// ADF t-statistic on the spread
    pub adf_statistic: Decimal,
    /// ADF p-value, in [0, 1]
    pub p_value: Decimal,
    /// Whether p_value < significance_level
    pub is_cointegrated: bool,
    /// Mean-reversion half-life in periods, when defined
    pub half_life: Option<Decimal>,
    /// Residual spread series
    pub spread: Vec<Decimal>,
    /// Full-sample spread mean
    pub spread_mean: Decimal,
    /// Full-sample spread standard deviation (sample)
    pub spread_std: Decimal,
    /// Rolling z-score series; None where undefined
    pub zscore: Vec<Option<Decimal>>,
    /// Position state per timestamp
    pub positions: Vec<PositionState>,
    /// Most recent defined z-score, if any
    pub latest_zscore: Option<Decimal>,
    /// Position state at the final timestamp
    pub current_state: PositionState,
    pub long_count: usize,
    pub short_count: usize,
    pub flat_count: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full pipeline for one pair: cointegration estimation, rolling
/// z-score, position classification, and the summary scalars a renderer
/// needs.
///
/// The cointegration verdict (`is_cointegrated`) is decided here against
/// `significance_level`; the estimator itself only reports the p-value.
pub fn analyze_pair(input: &PairAnalysisInput) -> StatArbResult<PairAnalysisOutput> {
    if input.significance_level <= Decimal::ZERO || input.significance_level >= Decimal::ONE {
        return Err(StatArbError::InvalidInput {
            field: "significance_level".into(),
            reason: format!("must be in (0, 1), got {}", input.significance_level),
        });
    }
    signals::validate_thresholds(input.entry_threshold, input.exit_threshold)?;

    let estimation = cointegration::estimate(&input.series_a, &input.series_b)?;
    let zscore = zscore::normalize(&estimation.spread, input.window)?;
    let positions =
        signals::generate_signals(&zscore, input.entry_threshold, input.exit_threshold)?;

    let n_dec = Decimal::from(estimation.spread.len() as i64);
    let spread_mean = estimation.spread.iter().copied().sum::<Decimal>() / n_dec;
    let spread_std = stdev_decimal(&estimation.spread);

    let long_count = positions.iter().filter(|p| **p == PositionState::Long).count();
    let short_count = positions.iter().filter(|p| **p == PositionState::Short).count();
    let flat_count = positions.len() - long_count - short_count;

    let latest_zscore = zscore.iter().rev().find_map(|z| *z);
    let current_state = positions.last().copied().unwrap_or(PositionState::Flat);

    Ok(PairAnalysisOutput {
        symbol_a: input.series_a.symbol.clone(),
        symbol_b: input.series_b.symbol.clone(),
        dates: input.series_a.dates(),
        hedge_ratio: estimation.hedge_ratio,
        intercept: estimation.intercept,
        adf_statistic: estimation.adf_statistic,
        p_value: estimation.p_value,
        is_cointegrated: estimation.p_value < input.significance_level,
        half_life: estimation.half_life,
        spread: estimation.spread,
        spread_mean,
        spread_std,
        zscore,
        positions,
        latest_zscore,
        current_state,
        long_count,
        short_count,
        flat_count,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
