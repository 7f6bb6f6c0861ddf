use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{StatArbError, StatArbResult};

/// Observed price levels. Wraps Decimal to prevent accidental f64 usage.
pub type Price = Decimal;

/// A single observed price at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: Price,
}

/// An ordered price history for one instrument.
///
/// Dates must be strictly increasing (no duplicates). The series must
/// already be cleaned: any provider gaps or missing rows are the caller's
/// problem and must be resolved before handing the series to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, rejecting out-of-order or duplicate dates.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> StatArbResult<Self> {
        let series = Self {
            symbol: symbol.into(),
            points,
        };
        series.validate()?;
        Ok(series)
    }

    /// Check the ordering invariant: strictly increasing dates.
    ///
    /// Deserialized or literal-constructed series bypass `new`, so the
    /// estimator re-checks before computing.
    pub fn validate(&self) -> StatArbResult<()> {
        for pair in self.points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(StatArbError::MisalignedSeries(format!(
                    "'{}' dates must be strictly increasing: {} follows {}",
                    self.symbol, pair[1].date, pair[0].date
                )));
            }
        }
        Ok(())
    }

    /// Verify both series share one timestamp index.
    pub fn ensure_aligned_with(&self, other: &PriceSeries) -> StatArbResult<()> {
        if self.len() != other.len() {
            return Err(StatArbError::MisalignedSeries(format!(
                "'{}' has {} points but '{}' has {}",
                self.symbol,
                self.len(),
                other.symbol,
                other.len()
            )));
        }
        for (a, b) in self.points.iter().zip(other.points.iter()) {
            if a.date != b.date {
                return Err(StatArbError::MisalignedSeries(format!(
                    "'{}' has {} where '{}' has {}",
                    self.symbol, a.date, other.symbol, b.date
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Price values in date order.
    pub fn prices(&self) -> Vec<Price> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// The timestamp index.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }
}
