use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::ledger::models::{CoinBalance, ObjectSnapshot, TransactionPage, TransactionRecord};

/// Read-only ledger access, implemented by the host application.
///
/// INVARIANTS:
/// - History pages are chronological and never reordered by the implementor
/// - `get_object_snapshots` omits ids that no longer exist instead of failing
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Transactions sent by `address`, one page per call
    async fn query_account_transactions(
        &self,
        address: &str,
        cursor: Option<String>,
    ) -> AppResult<TransactionPage>;

    /// Batched snapshot fetch, keyed by object id
    async fn get_object_snapshots(
        &self,
        ids: &[String],
    ) -> AppResult<HashMap<String, ObjectSnapshot>>;

    /// Total balance of `coin_type` owned by `owner`; zero when none is held
    async fn get_balance(&self, owner: &str, coin_type: &str) -> AppResult<CoinBalance>;

    /// Single-object fetch used by coin-type detection
    async fn get_object(&self, id: &str) -> AppResult<Option<ObjectSnapshot>> {
        let mut snapshots = self.get_object_snapshots(&[id.to_string()]).await?;
        Ok(snapshots.remove(id))
    }
}

/// Follow history cursors until the ledger reports no further page or `max_pages` is reached.
///
/// A truncated result is still a well-defined prefix of the history.
pub async fn fetch_history(
    ledger: &dyn LedgerQuery,
    address: &str,
    max_pages: usize,
) -> AppResult<Vec<TransactionRecord>> {
    let mut history = Vec::new();
    let mut cursor = None;

    for page_number in 0..max_pages.max(1) {
        let page = ledger.query_account_transactions(address, cursor).await?;
        debug!(
            "Fetched history page {} for {}: {} transactions",
            page_number,
            address,
            page.data.len()
        );
        history.extend(page.data);

        match (page.has_next_page, page.next_cursor) {
            (true, Some(next)) => cursor = Some(next),
            _ => return Ok(history),
        }
    }

    warn!(
        "History for {} truncated after {} pages",
        address,
        max_pages.max(1)
    );
    Ok(history)
}
