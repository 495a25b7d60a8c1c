//! The static product catalog.
//!
//! Products are loaded once at startup from a JSON array and never mutated
//! afterwards. Records are kept raw: lookup works against whatever the file
//! contained, and materializing a [`Product`] from a record is a separate,
//! fallible step.

use crate::error::{Result, RufusError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// A sellable product as exposed through the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    pub category: String,
    pub tags: Vec<String>,
}

impl Product {
    /// Materializes a product from a raw catalog record.
    ///
    /// A record that `lookup` can find may still fail here when required
    /// fields are missing or ill-typed, or when the price is negative.
    pub fn from_record(record: &Value) -> Result<Self> {
        let id = record
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<missing id>")
            .to_string();

        let product: Product = serde_json::from_value(record.clone())
            .map_err(|err| RufusError::validation(&id, err.to_string()))?;

        if product.price < 0.0 {
            return Err(RufusError::validation(
                &id,
                format!("negative price {}", product.price),
            ));
        }

        Ok(product)
    }
}

/// In-memory store for the product catalog.
///
/// Holds the raw records in source order plus an id index. Read-only for the
/// process lifetime.
#[derive(Debug)]
pub struct CatalogStore {
    records: Vec<Value>,
    index: HashMap<String, usize>,
}

impl CatalogStore {
    /// Creates a store with no products.
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Builds a store from already-parsed records.
    ///
    /// The id index maps each id to its first occurrence; later duplicates
    /// are logged and stay reachable only through [`CatalogStore::all`].
    /// Records without a string `id` are indexed under nothing but are still
    /// part of the ordered sequence.
    pub fn from_records(records: Vec<Value>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            match record.get("id").and_then(Value::as_str) {
                Some(id) => {
                    if index.contains_key(id) {
                        tracing::warn!("Duplicate product id '{}' in catalog, keeping the first", id);
                    } else {
                        index.insert(id.to_string(), position);
                    }
                }
                None => {
                    tracing::warn!("Catalog record at position {} has no string id", position);
                }
            }
        }
        Self { records, index }
    }

    /// Loads the catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// `CatalogNotFound` when the file is missing, `CatalogMalformed` when it
    /// does not parse as a JSON array. Callers are expected to fall back to
    /// [`CatalogStore::empty`] on either.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => {
                RufusError::catalog_not_found(path.display().to_string())
            }
            _ => RufusError::internal(format!(
                "failed to read catalog at {}: {}",
                path.display(),
                err
            )),
        })?;

        let records: Vec<Value> = serde_json::from_str(&raw).map_err(|err| {
            RufusError::catalog_malformed(format!("{}: {}", path.display(), err))
        })?;

        Ok(Self::from_records(records))
    }

    /// Returns the raw record for an id, if any.
    pub fn lookup(&self, id: &str) -> Option<&Value> {
        self.index.get(id).map(|position| &self.records[*position])
    }

    /// All records in source order. Callers must not mutate.
    pub fn all(&self) -> &[Value] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
