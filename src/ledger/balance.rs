use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::config::{CoinPreset, EscrowConfig};
use crate::error::{AppResult, LedgerError};
use crate::ledger::query::LedgerQuery;
use crate::types::TypeTag;
use crate::units::to_display;

/// Display balance of every configured preset held by `owner`, in preset order
#[instrument(skip(ledger, config))]
pub async fn preset_balances(
    ledger: &dyn LedgerQuery,
    owner: &str,
    config: &EscrowConfig,
) -> AppResult<Vec<(CoinPreset, Decimal)>> {
    let mut balances = Vec::with_capacity(config.coin_presets.len());

    for preset in &config.coin_presets {
        let coin_type = preset.coin_type.to_string();
        let balance = ledger.get_balance(owner, &coin_type).await?;

        let reported = TypeTag::from_str(&balance.coin_type).ok();
        if !reported.is_some_and(|tag| tag.same_type(&preset.coin_type)) {
            return Err(LedgerError::Malformed(format!(
                "asked for {} balance, got {}",
                coin_type, balance.coin_type
            ))
            .into());
        }

        let amount = to_display(balance.total_balance, config.decimals)?;
        debug!("{} holds {} {}", owner, amount, preset.label);
        balances.push((preset.clone(), amount));
    }

    Ok(balances)
}
