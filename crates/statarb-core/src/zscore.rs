use rust_decimal::Decimal;
use rust_decimal_macros::dec;

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

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Rolling z-score of a spread series over a trailing window.
///
/// For each index with a full trailing window the value is
/// `(spread[t] - mean) / std`, where mean and sample standard deviation
/// (n-1 denominator) cover the `window` points ending at t inclusive.
///
/// The first `window - 1` entries are `None` (no backfill, no zero
/// padding), as is any entry whose trailing window has zero standard
/// deviation. Output length always equals input length.
pub fn normalize(spread: &[Decimal], window: usize) -> StatArbResult<Vec<Option<Decimal>>> {
    check_window(spread.len(), window)?;

    let mut out: Vec<Option<Decimal>> = vec![None; window - 1];
    for i in (window - 1)..spread.len() {
        let slice = &spread[i + 1 - window..=i];
        let (mean, std) = window_stats(slice);
        if std == Decimal::ZERO {
            out.push(None);
        } else {
            out.push(Some((spread[i] - mean) / std));
        }
    }
    Ok(out)
}

/// Trailing-window means, with the same `None` edge semantics as
/// [`normalize`].
pub fn rolling_mean(series: &[Decimal], window: usize) -> StatArbResult<Vec<Option<Decimal>>> {
    check_window(series.len(), window)?;

    let mut out: Vec<Option<Decimal>> = vec![None; window - 1];
    for i in (window - 1)..series.len() {
        let slice = &series[i + 1 - window..=i];
        let (mean, _) = window_stats(slice);
        out.push(Some(mean));
    }
    Ok(out)
}

/// Trailing-window sample standard deviations, with the same `None` edge
/// semantics as [`normalize`].
pub fn rolling_std(series: &[Decimal], window: usize) -> StatArbResult<Vec<Option<Decimal>>> {
    check_window(series.len(), window)?;

    let mut out: Vec<Option<Decimal>> = vec![None; window - 1];
    for i in (window - 1)..series.len() {
        let slice = &series[i + 1 - window..=i];
        let (_, std) = window_stats(slice);
        out.push(Some(std));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn check_window(len: usize, window: usize) -> StatArbResult<()> {
    if window < 2 || window > len {
        return Err(StatArbError::InvalidWindow { window, len });
    }
    Ok(())
}

/// Mean and sample standard deviation of one window.
fn window_stats(slice: &[Decimal]) -> (Decimal, Decimal) {
    let n = Decimal::from(slice.len() as i64);
    let mean = slice.iter().copied().sum::<Decimal>() / n;
    let var = slice
        .iter()
        .map(|v| {
            let d = *v - mean;
            d * d
        })
        .sum::<Decimal>()
        / (n - Decimal::ONE);
    (mean, sqrt_decimal(var))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
