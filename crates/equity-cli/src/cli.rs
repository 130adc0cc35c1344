//! Command-line arguments

use clap::{Parser, Subcommand};
use equity_engine::StrategyKind;

#[derive(Parser, Debug)]
#[command(name = "equity")]
#[command(about = "Stock analysis from technical signals and sector-relative fundamentals", long_about = None)]
pub struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Fundamental scoring strategy (weighted or sector_comparison)
    #[arg(long, global = true)]
    pub strategy: Option<StrategyKind>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse symbols; the whole portfolio when none are given
    Analyze {
        symbols: Vec<String>,
    },
    /// Indicator panels and buy/sell markers for one symbol
    Chart {
        symbol: String,
    },
    /// Manage tracked symbols
    Portfolio {
        #[command(subcommand)]
        action: PortfolioAction,
    },
    /// Sector benchmark table
    Benchmarks {
        #[command(subcommand)]
        action: BenchmarkAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum PortfolioAction {
    /// Show tracked symbols
    List,
    /// Validate a symbol and start tracking it
    Add { symbol: String },
    /// Stop tracking a symbol
    Remove { symbol: String },
}

#[derive(Subcommand, Debug)]
pub enum BenchmarkAction {
    /// Show the benchmark file and the table in use
    Status,
    /// Recompute sector medians from representative companies
    Refresh,
}
