mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::pairs::{AnalyzeArgs, CointegrationArgs, SignalsArgs, ZscoreArgs};

/// Pairs-trading cointegration and signal analytics
#[derive(Parser)]
#[command(
    name = "sta",
    version,
    about = "Pairs-trading cointegration and signal analytics",
    long_about = "A CLI for evaluating statistical-arbitrage pairs with decimal \
                  precision. Estimates hedge ratios and spread stationarity, \
                  normalizes spreads into rolling z-scores, and classifies \
                  z-scores into long/short/flat position states."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the hedge ratio and test the spread for stationarity
    Cointegration(CointegrationArgs),
    /// Rolling z-score of a spread series
    Zscore(ZscoreArgs),
    /// Classify a z-score series into long/short/flat position states
    Signals(SignalsArgs),
    /// Full pipeline: cointegration, z-score, position states
    Analyze(AnalyzeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Cointegration(args) => commands::pairs::run_cointegration(args),
        Commands::Zscore(args) => commands::pairs::run_zscore(args),
        Commands::Signals(args) => commands::pairs::run_signals(args),
        Commands::Analyze(args) => commands::pairs::run_analyze(args),
        Commands::Version => {
            println!("sta {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
