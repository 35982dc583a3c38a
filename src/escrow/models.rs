use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ledger::models::{ArgumentRef, InputValue};
use crate::types::TypeTag;

/// Trailing `NAME` of a `addr::module::NAME` string, for list display
fn short_type_name(coin_type: &str) -> &str {
    coin_type.rsplit("::").next().unwrap_or(coin_type)
}

/// A successful `create_escrow` call recovered from history.
///
/// Lives only for one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowCreationRecord {
    pub escrow_id: String,
    pub tx_digest: String,
    /// Raw type arguments of the call; empty when the call carried none
    pub deposit_type: String,
    pub payment_type: String,
    /// Unresolved reference to the requested amount (second call argument)
    pub requested_amount_ref: Option<ArgumentRef>,
    pub transaction_inputs: Vec<InputValue>,
}

impl EscrowCreationRecord {
    pub fn deposit_tag(&self) -> Option<TypeTag> {
        TypeTag::from_str(&self.deposit_type).ok()
    }

    pub fn payment_tag(&self) -> Option<TypeTag> {
        TypeTag::from_str(&self.payment_type).ok()
    }
}

/// Lifecycle state as observed on the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowStatus {
    Open,
    Closed,
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscrowStatus::Open => write!(f, "Open"),
            EscrowStatus::Closed => write!(f, "Closed"),
        }
    }
}

/// Requested amount in display units, or the `Unknown` sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestedAmount {
    Known(Decimal),
    Unknown,
}

impl RequestedAmount {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            RequestedAmount::Known(v) => Some(*v),
            RequestedAmount::Unknown => None,
        }
    }
}

impl fmt::Display for RequestedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestedAmount::Known(v) => write!(f, "{}", v),
            RequestedAmount::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Final view model for one escrow
///
/// INVARIANT: `status == Closed` iff the snapshot was absent or reported `exists = false`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledEscrow {
    pub id: String,
    pub deposit_type: String,
    pub payment_type: String,
    pub requested_amount: RequestedAmount,
    pub status: EscrowStatus,
    pub origin_digest: String,
}

impl ReconciledEscrow {
    pub fn is_open(&self) -> bool {
        self.status == EscrowStatus::Open
    }

    pub fn deposit_short_name(&self) -> &str {
        short_type_name(&self.deposit_type)
    }

    pub fn payment_short_name(&self) -> &str {
        short_type_name(&self.payment_type)
    }
}

/// Result of one reconciliation pass for one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub account: String,
    pub escrows: Vec<ReconciledEscrow>,
    pub reconciled_at: DateTime<Utc>,
}

impl ReconciliationReport {
    pub fn empty(account: &str) -> Self {
        Self {
            account: account.to_string(),
            escrows: Vec::new(),
            reconciled_at: Utc::now(),
        }
    }

    pub fn open(&self) -> impl Iterator<Item = &ReconciledEscrow> {
        self.escrows.iter().filter(|e| e.is_open())
    }

    pub fn closed(&self) -> impl Iterator<Item = &ReconciledEscrow> {
        self.escrows.iter().filter(|e| !e.is_open())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_short_names_and_display() {
        let escrow = ReconciledEscrow {
            id: "0x1".to_string(),
            deposit_type: "0xab::mock_coin::MOCK_COIN".to_string(),
            payment_type: String::new(),
            requested_amount: RequestedAmount::Known(dec!(1.5)),
            status: EscrowStatus::Open,
            origin_digest: "D1".to_string(),
        };
        assert_eq!(escrow.deposit_short_name(), "MOCK_COIN");
        assert_eq!(escrow.payment_short_name(), "");
        assert_eq!(escrow.requested_amount.to_string(), "1.5");
        assert_eq!(RequestedAmount::Unknown.to_string(), "Unknown");
        assert_eq!(EscrowStatus::Closed.to_string(), "Closed");
    }
}
