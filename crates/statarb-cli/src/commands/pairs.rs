use clap::Args;
use colored::Colorize;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use statarb_core::analysis::{self, PairAnalysisInput};
use statarb_core::cointegration;
use statarb_core::signals::{self, PositionState};
use statarb_core::types::PriceSeries;
use statarb_core::zscore;

use crate::input;

/// Arguments for cointegration estimation
#[derive(Args)]
pub struct CointegrationArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for z-score normalization
#[derive(Args)]
pub struct ZscoreArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for signal classification
#[derive(Args)]
pub struct SignalsArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the full pair analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

fn default_window() -> usize {
    30
}

fn default_entry_threshold() -> Decimal {
    dec!(2.0)
}

fn default_exit_threshold() -> Decimal {
    dec!(0.5)
}

/// Two price series sharing one date index.
#[derive(Deserialize)]
struct PairInput {
    series_a: PriceSeries,
    series_b: PriceSeries,
}

/// A spread series plus the rolling window.
#[derive(Deserialize)]
struct SpreadInput {
    spread: Vec<Decimal>,
    #[serde(default = "default_window")]
    window: usize,
}

#[derive(Serialize)]
struct ZscoreOutput {
    zscore: Vec<Option<Decimal>>,
}

/// A z-score series plus classification thresholds.
#[derive(Deserialize)]
struct SignalsInput {
    zscore: Vec<Option<Decimal>>,
    #[serde(default = "default_entry_threshold")]
    entry_threshold: Decimal,
    #[serde(default = "default_exit_threshold")]
    exit_threshold: Decimal,
}

#[derive(Serialize)]
struct SignalsOutput {
    positions: Vec<PositionState>,
    long_count: usize,
    short_count: usize,
    flat_count: usize,
}

pub fn run_cointegration(args: CointegrationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pair: PairInput = input::read(args.input.as_deref(), "cointegration estimation")?;
    let result = cointegration::estimate(&pair.series_a, &pair.series_b)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_zscore(args: ZscoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let spread_input: SpreadInput = input::read(args.input.as_deref(), "z-score normalization")?;
    let zscore = zscore::normalize(&spread_input.spread, spread_input.window)?;
    Ok(serde_json::to_value(ZscoreOutput { zscore })?)
}

pub fn run_signals(args: SignalsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let signals_input: SignalsInput = input::read(args.input.as_deref(), "signal classification")?;
    let positions = signals::generate_signals(
        &signals_input.zscore,
        signals_input.entry_threshold,
        signals_input.exit_threshold,
    )?;
    let long_count = positions.iter().filter(|p| **p == PositionState::Long).count();
    let short_count = positions.iter().filter(|p| **p == PositionState::Short).count();
    let flat_count = positions.len() - long_count - short_count;
    Ok(serde_json::to_value(SignalsOutput {
        positions,
        long_count,
        short_count,
        flat_count,
    })?)
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input: PairAnalysisInput = input::read(args.input.as_deref(), "pair analysis")?;
    let result = analysis::analyze_pair(&analysis_input)?;
    if !result.is_cointegrated {
        eprintln!(
            "{}: pair is not cointegrated at the {} level; mean-reversion signals may be unreliable",
            "warning".yellow().bold(),
            analysis_input.significance_level
        );
    }
    Ok(serde_json::to_value(result)?)
}
