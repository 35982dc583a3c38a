use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ledger::models::{CoinObject, ObjectSnapshot};
use crate::types::TypeTag;
use crate::units::{parse_raw, to_display};

/// Raw deposit held by the escrow. The field is either a plain amount or a
/// wrapped `Balance`/`Coin` with a nested `value` or `balance`.
fn deposit_raw(snapshot: &ObjectSnapshot) -> u64 {
    let Some(deposit) = snapshot.field("deposit") else {
        return 0;
    };
    if let Ok(raw) = parse_raw(deposit) {
        return raw;
    }
    let nested = |name: &str| {
        deposit
            .get("fields")
            .and_then(|fields| fields.get(name))
            .and_then(|value| parse_raw(value).ok())
    };
    nested("value").or_else(|| nested("balance")).unwrap_or(0)
}

fn field_raw(snapshot: &ObjectSnapshot, name: &str) -> u64 {
    snapshot
        .field(name)
        .and_then(|value: &Value| parse_raw(value).ok())
        .unwrap_or(0)
}

/// What the taker gives and gets, shown before accepting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowTerms {
    pub escrow_id: String,
    pub deposit_amount: Decimal,
    pub requested_amount: Decimal,
}

impl EscrowTerms {
    /// Terms of a live escrow; missing amounts read as zero
    pub fn from_snapshot(snapshot: &ObjectSnapshot, decimals: u8) -> Option<Self> {
        if !snapshot.exists {
            return None;
        }
        Some(Self {
            escrow_id: snapshot.object_id.clone(),
            deposit_amount: to_display(deposit_raw(snapshot), decimals).ok()?,
            requested_amount: to_display(field_raw(snapshot, "requested_amount"), decimals).ok()?,
        })
    }
}

/// First owned coin of `coin_type`
pub fn select_payment_coin<'a>(coins: &'a [CoinObject], coin_type: &TypeTag) -> Option<&'a CoinObject> {
    coins.iter().find(|coin| {
        coin.coin_type
            .parse::<TypeTag>()
            .map(|tag| tag.same_type(coin_type))
            .unwrap_or(false)
    })
}

/// `0x1234...abcd`; ids too short to abbreviate come back unchanged
pub fn short_object_id(id: &str, head: usize, tail: usize) -> String {
    let hex = id.strip_prefix("0x").unwrap_or(id);
    if !hex.is_ascii() || hex.len() <= head + tail {
        return id.to_string();
    }
    format!("0x{}...{}", &hex[..head], &hex[hex.len() - tail..])
}
