//! Command-line interface for equity analysis

mod cli;
mod output;

use anyhow::Context;
use clap::Parser;
use cli::{BenchmarkAction, Cli, Command, PortfolioAction};
use equity_service::portfolio::normalize_symbol;
use equity_service::{AnalysisService, ServiceConfig, StockReport};
use serde::Serialize;
use serde_json::json;
use tracing::info;

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn analyze(service: &AnalysisService, symbols: Vec<String>, json: bool) -> anyhow::Result<()> {
    let results: Vec<(String, Result<StockReport, String>)> = if symbols.is_empty() {
        let reports = service.analyze_portfolio().await?;
        if reports.is_empty() {
            println!("Portfolio is empty. Add symbols with `equity portfolio add <SYMBOL>`.");
            return Ok(());
        }
        reports
            .into_iter()
            .map(|(entry, report)| (entry.symbol, report.map_err(|e| e.to_string())))
            .collect()
    } else {
        let mut results = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let report = service.analyze(&symbol).await.map_err(|e| e.to_string());
            results.push((symbol, report));
        }
        results
    };

    if json {
        let values: Vec<serde_json::Value> = results
            .iter()
            .map(|(symbol, result)| match result {
                Ok(report) => serde_json::to_value(report).unwrap_or_else(|e| json!({ "symbol": symbol, "error": e.to_string() })),
                Err(err) => json!({ "symbol": symbol, "error": err }),
            })
            .collect();
        return print_json(&values);
    }

    println!("{}", output::summary_table(&results));
    if let [(_, Ok(report))] = results.as_slice() {
        println!("{}", output::detail_table(report));
    }
    Ok(())
}

async fn run(service: &AnalysisService, command: Command, json: bool) -> anyhow::Result<()> {
    match command {
        Command::Analyze { symbols } => analyze(service, symbols, json).await,
        Command::Chart { symbol } => {
            let chart = service
                .chart(&symbol)
                .await
                .with_context(|| format!("building chart for {symbol}"))?;
            if json {
                print_json(&chart)
            } else {
                println!("{}", output::chart_table(&chart));
                Ok(())
            }
        },
        Command::Portfolio { action } => match action {
            PortfolioAction::List => {
                let entries = service.portfolio().await?;
                if json {
                    print_json(&json!({ "portfolio": entries }))
                } else {
                    println!("{}", output::portfolio_table(&entries));
                    Ok(())
                }
            },
            PortfolioAction::Add { symbol } => {
                let entry = service.add_to_portfolio(&symbol).await?;
                if json {
                    print_json(&entry)
                } else {
                    println!("Added {} ({}) to portfolio", entry.symbol, entry.name);
                    Ok(())
                }
            },
            PortfolioAction::Remove { symbol } => {
                let symbol = normalize_symbol(&symbol)?;
                service.remove_from_portfolio(&symbol).await?;
                if json {
                    print_json(&json!({ "removed": symbol }))
                } else {
                    println!("Removed {symbol} from portfolio");
                    Ok(())
                }
            },
        },
        Command::Benchmarks { action } => match action {
            BenchmarkAction::Status => {
                let status = service.benchmark_status().await;
                if json {
                    print_json(&status)
                } else {
                    println!("{}", output::benchmark_status_table(&status));
                    Ok(())
                }
            },
            BenchmarkAction::Refresh => {
                let summary = service
                    .refresh_benchmarks()
                    .await
                    .context("refreshing sector benchmarks")?;
                if json {
                    print_json(&summary)
                } else {
                    println!("{}", output::refresh_table(&summary));
                    Ok(())
                }
            },
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = equity_utils::Config::from_env()?;
    equity_utils::init_tracing_with(&settings);

    let mut config = ServiceConfig::from_env().context("loading configuration")?;
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    info!(strategy = %config.strategy, environment = %settings.environment, "Starting equity");

    let service = AnalysisService::from_config(config).await?;
    run(&service, cli.command, cli.json).await
}
