//! Table rendering for terminal output

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use equity_engine::{Category, ChartData};
use equity_service::{BenchmarkStatus, Freshness, PortfolioEntry, RefreshSummary, StockReport};

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn freshness_label(freshness: Freshness) -> &'static str {
    match freshness {
        Freshness::Fetched => "fresh",
        Freshness::Cached => "cached",
        Freshness::Stale => "stale",
    }
}

fn category_label(category: Category) -> &'static str {
    match category {
        Category::Valuation => "Valuation",
        Category::Profitability => "Profitability",
        Category::Growth => "Growth",
        Category::FinancialHealth => "Financial Health",
    }
}

/// One row per analysed symbol; failures show their error
pub fn summary_table(results: &[(String, Result<StockReport, String>)]) -> Table {
    let mut table = table(&[
        "Symbol",
        "Company",
        "Score",
        "Ranking",
        "Technical",
        "Overall",
        "Updated",
        "Data",
    ]);
    for (symbol, result) in results {
        match result {
            Ok(report) => table.add_row(vec![
                Cell::new(&report.symbol),
                Cell::new(report.company_name.as_deref().unwrap_or("-")),
                Cell::new(format!("{:.1}", report.fundamental_analysis.total_score)),
                Cell::new(report.fundamental_analysis.ranking),
                Cell::new(report.technical_recommendation),
                Cell::new(report.overall_recommendation),
                Cell::new(&report.last_updated),
                Cell::new(freshness_label(report.freshness)),
            ]),
            Err(err) => table.add_row(vec![Cell::new(symbol), Cell::new(format!("error: {err}"))]),
        };
    }
    table
}

/// Category scores followed by every formatted metric
pub fn detail_table(report: &StockReport) -> Table {
    let mut table = table(&["Field", "Value"]);
    for category in Category::ALL {
        if let Some(score) = report.fundamental_analysis.category_scores.get(&category) {
            table.add_row(vec![format!("{} score", category_label(category)), format!("{score:.1}")]);
        }
    }
    if let Some(comparison) = &report.fundamental_analysis.comparison {
        table.add_row(vec!["Benchmark sector".to_string(), comparison.sector_name.clone()]);
        table.add_row(vec![
            "Beats sector median".to_string(),
            format!("{}/{}", comparison.sector_positives(), comparison.metrics.len()),
        ]);
    }
    for (key, value) in &report.fundamental_metrics {
        table.add_row(vec![key.as_str(), value.as_str()]);
    }
    table
}

/// Five most recent entries, newest first
fn recent(dates: &[impl ToString]) -> String {
    dates
        .iter()
        .rev()
        .take(5)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Latest value of every chart line plus the signal markers
pub fn chart_table(chart: &ChartData) -> Table {
    let mut table = table(&["Series", "Latest"]);
    if let (Some(first), Some(last)) = (chart.dates.first(), chart.dates.last()) {
        table.add_row(vec!["Sessions".to_string(), format!("{} ({first} to {last})", chart.dates.len())]);
    }
    for line in chart.panels.iter().flat_map(|p| &p.lines) {
        let latest = line
            .values
            .iter()
            .rev()
            .find(|v| v.is_finite())
            .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        table.add_row(vec![line.label.clone(), latest]);
    }
    table.add_row(vec![format!("Buy signals ({})", chart.buy_dates.len()), recent(&chart.buy_dates)]);
    table.add_row(vec![format!("Sell signals ({})", chart.sell_dates.len()), recent(&chart.sell_dates)]);
    table
}

pub fn portfolio_table(entries: &[PortfolioEntry]) -> Table {
    let mut table = table(&["Symbol", "Name", "Added"]);
    for entry in entries {
        table.add_row(vec![&entry.symbol, &entry.name, &entry.date_added]);
    }
    table
}

pub fn benchmark_status_table(status: &BenchmarkStatus) -> Table {
    let mut table = table(&["Field", "Value"]);
    let file = &status.file_status;
    let data = &status.benchmark_data;
    let rows = [
        ("File", file.path.clone()),
        ("Exists", file.exists.to_string()),
        ("Last modified", file.last_modified.clone()),
        ("Size", file.size.clone()),
        ("Sectors", data.total_sectors.to_string()),
        ("Last calculated", data.last_calculated.clone()),
        ("Method", data.calculation_method.clone()),
        ("Using fallback", data.using_fallback.to_string()),
        (
            "Representative stocks",
            status.representative_stocks.total_stocks.to_string(),
        ),
    ];
    for (field, value) in rows {
        table.add_row(vec![field.to_string(), value]);
    }
    table
}

pub fn refresh_table(summary: &RefreshSummary) -> Table {
    let mut table = table(&["Field", "Value"]);
    table.add_row(vec!["Sectors".to_string(), summary.total_sectors.to_string()]);
    table.add_row(vec!["Calculated".to_string(), summary.sectors_calculated.join(", ")]);
    table.add_row(vec!["Last updated".to_string(), summary.last_updated.clone()]);
    table.add_row(vec!["Saved to".to_string(), summary.file_saved.clone()]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portfolio_table_lists_entries() {
        let entries = vec![PortfolioEntry {
            symbol: "AAPL".to_string(),
            name: "Apple Inc.".to_string(),
            date_added: "2024-06-01".to_string(),
        }];
        let rendered = portfolio_table(&entries).to_string();
        assert!(rendered.contains("AAPL"));
        assert!(rendered.contains("Apple Inc."));
    }

    #[test]
    fn test_summary_table_shows_errors() {
        let results = vec![("ZZZZ".to_string(), Err("invalid symbol: ZZZZ".to_string()))];
        let rendered = summary_table(&results).to_string();
        assert!(rendered.contains("error: invalid symbol"));
    }
}
