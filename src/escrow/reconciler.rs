use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::config::EscrowConfig;
use crate::error::AppResult;
use crate::escrow::correlator::correlate;
use crate::escrow::models::ReconciliationReport;
use crate::escrow::scanner::scan;
use crate::ledger::query::{fetch_history, LedgerQuery};

/// One reconciliation pass: fetch history, scan it, fetch snapshots in one batch, correlate.
///
/// Correlation only runs once both inputs have fully resolved; a fetch
/// failure aborts the pass and is returned unchanged.
#[instrument(skip(ledger, config))]
pub async fn reconcile(
    ledger: &dyn LedgerQuery,
    account: &str,
    config: &EscrowConfig,
) -> AppResult<ReconciliationReport> {
    if account.is_empty() {
        return Ok(ReconciliationReport::empty(account));
    }

    let history = fetch_history(ledger, account, config.max_history_pages).await?;
    let records = scan(&history, config);
    if records.is_empty() {
        debug!("No escrow creations found for {}", account);
        return Ok(ReconciliationReport::empty(account));
    }

    let mut seen = HashSet::new();
    let ids: Vec<String> = records
        .iter()
        .filter(|r| seen.insert(r.escrow_id.as_str()))
        .map(|r| r.escrow_id.clone())
        .collect();

    let snapshots = ledger.get_object_snapshots(&ids).await?;
    let escrows = correlate(&records, &snapshots, config.decimals);

    let open = escrows.iter().filter(|e| e.is_open()).count();
    info!(
        "Reconciled {} escrows for {} ({} open, {} closed)",
        escrows.len(),
        account,
        open,
        escrows.len() - open
    );

    Ok(ReconciliationReport {
        account: account.to_string(),
        escrows,
        reconciled_at: Utc::now(),
    })
}

/// Handle for an in-flight pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassTicket {
    account: String,
    generation: u64,
}

impl PassTicket {
    pub fn account(&self) -> &str {
        &self.account
    }
}

#[derive(Debug, Default)]
struct SessionState {
    account: Option<String>,
    next_generation: u64,
    applied_generation: u64,
    latest: Option<ReconciliationReport>,
}

/// Current escrow view for the connected account.
///
/// Passes are keyed by account; completions for a previous account, or
/// older than the result already shown, are dropped.
pub struct ReconciliationSession {
    config: EscrowConfig,
    state: RwLock<SessionState>,
}

impl ReconciliationSession {
    pub fn new(config: EscrowConfig) -> Self {
        Self {
            config,
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    pub fn current_account(&self) -> Option<String> {
        self.state.read().account.clone()
    }

    pub fn latest(&self) -> Option<ReconciliationReport> {
        self.state.read().latest.clone()
    }

    /// The user connected, switched or disconnected a wallet
    pub fn switch_account(&self, account: Option<&str>) {
        let mut state = self.state.write();
        if state.account.as_deref() == account {
            return;
        }
        info!("Escrow view switching account to {:?}", account);
        state.account = account.map(str::to_string);
        state.latest = None;
        state.applied_generation = state.next_generation;
    }

    /// Start a pass for `account`, switching to it if needed
    pub fn begin(&self, account: &str) -> PassTicket {
        self.switch_account(Some(account));
        let mut state = self.state.write();
        state.next_generation += 1;
        PassTicket {
            account: account.to_string(),
            generation: state.next_generation,
        }
    }

    /// Store a finished pass; returns false when the result was stale and dropped
    pub fn complete(&self, ticket: &PassTicket, report: ReconciliationReport) -> bool {
        let mut state = self.state.write();
        let current = state.account.as_deref() == Some(ticket.account.as_str());
        if !current || ticket.generation <= state.applied_generation {
            debug!(
                "Dropping stale reconciliation for {} (generation {})",
                ticket.account, ticket.generation
            );
            return false;
        }
        state.applied_generation = ticket.generation;
        state.latest = Some(report);
        true
    }

    /// Run a full pass and publish it if still current
    pub async fn run(&self, ledger: &dyn LedgerQuery, account: &str) -> AppResult<bool> {
        let ticket = self.begin(account);
        let report = reconcile(ledger, account, &self.config).await?;
        Ok(self.complete(&ticket, report))
    }
}
