use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::{Query, Row, StoreError};

/// Remote relational store capability. Implementations only translate
/// `Query` to their backend; they never retry.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query(&self, query: &Query) -> Result<Vec<Row>, StoreError>;
}

/// Run a query and decode every row.
pub async fn fetch<T: DeserializeOwned>(
    store: &dyn RecordStore,
    query: &Query,
) -> Result<Vec<T>, StoreError> {
    let rows = store.query(query).await?;
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| {
                StoreError::Decode {
                    table: query.table.as_str().into(),
                    reason: e.to_string(),
                }
            })
        })
        .collect()
}

/// Run a query and decode the first row, if any.
pub async fn fetch_first<T: DeserializeOwned>(
    store: &dyn RecordStore,
    query: Query,
) -> Result<Option<T>, StoreError> {
    let query = query.limit(1);
    Ok(fetch(store, &query).await?.into_iter().next())
}
