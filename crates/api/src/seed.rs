//! Catalog import.

use domain::CatalogEntry;
use serde_json::Value;
use store::Store;

/// Outcome of a catalog import.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Inserts every well-formed entry of a JSON catalog array.
///
/// Entries that do not parse or whose prices are unreadable are logged and
/// skipped. Store failures abort the import.
pub async fn seed_catalog<S: Store>(store: &S, raw: &str) -> Result<SeedReport, SeedError> {
    let entries: Vec<Value> = serde_json::from_str(raw)?;
    let mut report = SeedReport::default();

    for (index, entry) in entries.into_iter().enumerate() {
        let product = serde_json::from_value::<CatalogEntry>(entry)
            .map_err(|err| err.to_string())
            .and_then(|entry| entry.into_new_product().map_err(|err| err.to_string()));

        match product {
            Ok(product) => {
                let product = store.insert_product(product).await?;
                tracing::debug!(product_id = %product.id, title = %product.title, "product inserted");
                report.inserted += 1;
            }
            Err(reason) => {
                tracing::warn!(index, %reason, "skipping malformed catalog entry");
                report.skipped += 1;
            }
        }
    }

    tracing::info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "catalog import finished"
    );
    Ok(report)
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("catalog file is not a JSON array: {0}")]
    Format(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] store::StoreError),
}
