use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{StatArbError, StatArbResult};

/// Position on the spread at a single timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    /// Long the spread: spread is unusually low and expected to rise
    Long,
    /// Short the spread: spread is unusually high and expected to fall
    Short,
    /// No position
    Flat,
}

impl PositionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionState::Long => "LONG",
            PositionState::Short => "SHORT",
            PositionState::Flat => "FLAT",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, PositionState::Flat)
    }
}

/// Check the threshold contract: `entry > exit >= 0`.
pub fn validate_thresholds(
    entry_threshold: Decimal,
    exit_threshold: Decimal,
) -> StatArbResult<()> {
    if exit_threshold < Decimal::ZERO {
        return Err(StatArbError::InvalidInput {
            field: "exit_threshold".into(),
            reason: "must be non-negative".into(),
        });
    }
    if entry_threshold <= exit_threshold {
        return Err(StatArbError::InvalidInput {
            field: "entry_threshold".into(),
            reason: format!(
                "must exceed exit_threshold ({} <= {})",
                entry_threshold, exit_threshold
            ),
        });
    }
    Ok(())
}

/// Classify each z-score into a position state.
///
/// Classification is memoryless: every timestamp is judged against the
/// entry bands alone, with no carry-over from prior positions.
/// `z < -entry` is Long, `z > entry` is Short, everything else (including
/// undefined z-scores) is Flat. The exit threshold bounds the reporting
/// band between entries and is validated here, but it does not alter
/// classification.
pub fn generate_signals(
    zscore: &[Option<Decimal>],
    entry_threshold: Decimal,
    exit_threshold: Decimal,
) -> StatArbResult<Vec<PositionState>> {
    validate_thresholds(entry_threshold, exit_threshold)?;

    Ok(zscore
        .iter()
        .map(|z| match z {
            Some(z) if *z < -entry_threshold => PositionState::Long,
            Some(z) if *z > entry_threshold => PositionState::Short,
            _ => PositionState::Flat,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn defined(values: &[Decimal]) -> Vec<Option<Decimal>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_threshold_classification() {
        let zscore = defined(&[dec!(-3), dec!(-1), dec!(0), dec!(1), dec!(3)]);
        let positions = generate_signals(&zscore, dec!(2.0), dec!(0.5)).unwrap();
        assert_eq!(
            positions,
            vec![
                PositionState::Long,
                PositionState::Flat,
                PositionState::Flat,
                PositionState::Flat,
                PositionState::Short,
            ]
        );
    }

    #[test]
    fn test_entry_band_is_exclusive() {
        let zscore = defined(&[dec!(-2), dec!(2)]);
        let positions = generate_signals(&zscore, dec!(2.0), dec!(0.5)).unwrap();
        assert_eq!(positions, vec![PositionState::Flat, PositionState::Flat]);
    }

    #[test]
    fn test_undefined_zscore_is_flat() {
        let zscore = vec![None, Some(dec!(-5)), None];
        let positions = generate_signals(&zscore, dec!(2.0), dec!(0.5)).unwrap();
        assert_eq!(
            positions,
            vec![PositionState::Flat, PositionState::Long, PositionState::Flat]
        );
    }

    #[test]
    fn test_widening_entry_never_grows_active_set() {
        let zscore = defined(&[
            dec!(-4),
            dec!(-2.5),
            dec!(-1.5),
            dec!(-0.5),
            dec!(0),
            dec!(0.5),
            dec!(1.5),
            dec!(2.5),
            dec!(4),
        ]);
        let mut prev_active = usize::MAX;
        for entry in [dec!(1.0), dec!(2.0), dec!(3.0), dec!(5.0)] {
            let positions = generate_signals(&zscore, entry, dec!(0.5)).unwrap();
            let active = positions.iter().filter(|p| p.is_active()).count();
            assert!(active <= prev_active);
            prev_active = active;
        }
    }

    #[test]
    fn test_negative_exit_threshold_rejected() {
        let zscore = defined(&[dec!(0)]);
        let result = generate_signals(&zscore, dec!(2.0), dec!(-0.1));
        assert!(matches!(result, Err(StatArbError::InvalidInput { .. })));
    }

    #[test]
    fn test_entry_not_above_exit_rejected() {
        let zscore = defined(&[dec!(0)]);
        assert!(generate_signals(&zscore, dec!(0.5), dec!(0.5)).is_err());
        assert!(generate_signals(&zscore, dec!(0.3), dec!(0.5)).is_err());
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let positions = generate_signals(&[], dec!(2.0), dec!(0.5)).unwrap();
        assert!(positions.is_empty());
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(PositionState::Long.as_str(), "LONG");
        assert_eq!(PositionState::Short.as_str(), "SHORT");
        assert_eq!(PositionState::Flat.as_str(), "FLAT");
        assert!(PositionState::Long.is_active());
        assert!(!PositionState::Flat.is_active());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&PositionState::Long).unwrap();
        assert_eq!(json, "\"Long\"");
        let back: PositionState = serde_json::from_str("\"Short\"").unwrap();
        assert_eq!(back, PositionState::Short);
    }
}
