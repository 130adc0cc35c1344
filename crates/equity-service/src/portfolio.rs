//! Tracked symbols, persisted as `{"portfolio": [...]}`

use crate::error::{Result, ServiceError};
use crate::store::{read_json, write_json};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub symbol: String,
    pub name: String,
    /// `%Y-%m-%d`
    pub date_added: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PortfolioDocument {
    #[serde(default)]
    portfolio: Vec<PortfolioEntry>,
}

/// Upper-cased, trimmed ticker; `InvalidSymbol` when blank
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ServiceError::InvalidSymbol("Symbol is required".to_string()));
    }
    Ok(symbol)
}

/// Portfolio list on disk; mutations are serialised within the process
#[derive(Debug)]
pub struct PortfolioStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PortfolioStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<PortfolioEntry>> {
        Ok(read_json::<PortfolioDocument>(&self.path)
            .await?
            .unwrap_or_default()
            .portfolio)
    }

    async fn save(&self, portfolio: Vec<PortfolioEntry>) -> Result<()> {
        write_json(&self.path, &PortfolioDocument { portfolio }).await
    }

    /// Entries sorted by symbol
    pub async fn list(&self) -> Result<Vec<PortfolioEntry>> {
        let mut entries = self.load().await?;
        entries.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(entries)
    }

    pub async fn contains(&self, symbol: &str) -> Result<bool> {
        Ok(self.load().await?.iter().any(|e| e.symbol == symbol))
    }

    pub async fn add(&self, entry: PortfolioEntry) -> Result<PortfolioEntry> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.iter().any(|e| e.symbol == entry.symbol) {
            return Err(ServiceError::AlreadyInPortfolio(entry.symbol));
        }
        entries.push(entry.clone());
        self.save(entries).await?;
        info!(symbol = %entry.symbol, "Added to portfolio");
        Ok(entry)
    }

    pub async fn remove(&self, symbol: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        let before = entries.len();
        entries.retain(|e| e.symbol != symbol);
        if entries.len() == before {
            return Err(ServiceError::NotInPortfolio(symbol.to_string()));
        }
        self.save(entries).await?;
        info!(symbol, "Removed from portfolio");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str) -> PortfolioEntry {
        PortfolioEntry {
            symbol: symbol.to_string(),
            name: format!("{symbol} Inc."),
            date_added: "2024-06-01".to_string(),
        }
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("  brk.b ").unwrap(), "BRK.B");
        assert!(matches!(normalize_symbol("   "), Err(ServiceError::InvalidSymbol(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_portfolio() {
        let dir = tempfile::tempdir().unwrap();
        let store = PortfolioStore::new(dir.path().join("portfolio.json"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = PortfolioStore::new(dir.path().join("portfolio.json"));

        store.add(entry("MSFT")).await.unwrap();
        store.add(entry("AAPL")).await.unwrap();

        let symbols: Vec<String> = store.list().await.unwrap().into_iter().map(|e| e.symbol).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
        assert!(store.contains("MSFT").await.unwrap());

        let err = store.add(entry("AAPL")).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyInPortfolio(_)));

        store.remove("MSFT").await.unwrap();
        assert!(!store.contains("MSFT").await.unwrap());
        assert!(matches!(store.remove("MSFT").await, Err(ServiceError::NotInPortfolio(_))));
    }

    #[tokio::test]
    async fn test_reads_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.json");
        tokio::fs::write(
            &path,
            br#"{"portfolio": [{"symbol": "NVDA", "name": "NVIDIA Corporation", "date_added": "2024-01-15"}]}"#,
        )
        .await
        .unwrap();

        let store = PortfolioStore::new(path);
        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "NVIDIA Corporation");
    }
}
