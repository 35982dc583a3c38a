use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EscrowConfig;
use crate::error::PlanError;
use crate::ledger::models::{ArgumentRef, InputValue, MoveCall, ObjectSnapshot, ProgrammableCommand};
use crate::types::{InstanceTypes, TypeTag};
use crate::units::{parse_raw, to_raw};

/// Unsigned programmable transaction, ready for the wallet to sign
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPlan {
    pub inputs: Vec<InputValue>,
    pub commands: Vec<ProgrammableCommand>,
}

impl TransactionPlan {
    pub fn move_calls(&self) -> impl Iterator<Item = &MoveCall> {
        self.commands.iter().filter_map(|c| c.as_move_call())
    }

    fn input(&mut self, value: InputValue) -> ArgumentRef {
        self.inputs.push(value);
        ArgumentRef::Input((self.inputs.len() - 1) as u16)
    }

    fn command(&mut self, command: ProgrammableCommand) -> u16 {
        self.commands.push(command);
        (self.commands.len() - 1) as u16
    }
}

fn require_id(id: &str, what: &'static str) -> Result<String, PlanError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(PlanError::MissingObjectId(what));
    }
    Ok(id.to_string())
}

fn escrow_call(
    config: &EscrowConfig,
    function: &str,
    deposit: &TypeTag,
    payment: &TypeTag,
    arguments: Vec<ArgumentRef>,
) -> ProgrammableCommand {
    ProgrammableCommand::MoveCall(MoveCall {
        package: config.package_id.clone(),
        module: config.escrow_module.clone(),
        function: function.to_string(),
        type_arguments: vec![deposit.to_string(), payment.to_string()],
        arguments,
    })
}

/// Split `deposit_amount` off the deposit coin and lock it in a new escrow
pub fn create_escrow(
    config: &EscrowConfig,
    deposit_coin_id: &str,
    deposit_amount: Decimal,
    requested_amount: Decimal,
    deposit: &TypeTag,
    payment: &TypeTag,
) -> Result<TransactionPlan, PlanError> {
    if deposit.same_type(payment) {
        return Err(PlanError::SameCoinType(deposit.to_string()));
    }
    let coin_id = require_id(deposit_coin_id, "deposit coin")?;
    let deposit_raw = to_raw(deposit_amount, config.decimals)?;
    let requested_raw = to_raw(requested_amount, config.decimals)?;

    let mut plan = TransactionPlan::default();
    let coin = plan.input(InputValue::object(coin_id));
    let amount = plan.input(InputValue::pure_u64(deposit_raw));
    let requested = plan.input(InputValue::pure_u64(requested_raw));

    let split = plan.command(ProgrammableCommand::SplitCoins(coin, vec![amount]));
    plan.command(escrow_call(
        config,
        &config.create_function,
        deposit,
        payment,
        vec![ArgumentRef::NestedResult(split, 0), requested],
    ));

    debug!(
        "Planned escrow of {} {} for {} {}",
        deposit_amount, deposit, requested_amount, payment
    );
    Ok(plan)
}

/// Pay exactly the live requested amount from `payment_coin_id` and take the deposit
pub fn accept_escrow(
    config: &EscrowConfig,
    escrow: &ObjectSnapshot,
    payment_coin_id: &str,
    types: &InstanceTypes,
) -> Result<TransactionPlan, PlanError> {
    if !escrow.exists {
        return Err(PlanError::EscrowClosed(escrow.object_id.clone()));
    }
    let escrow_id = require_id(&escrow.object_id, "escrow")?;
    let coin_id = require_id(payment_coin_id, "payment coin")?;

    let missing = || PlanError::MissingField {
        object_id: escrow_id.clone(),
        field: "requested_amount",
    };
    let requested_raw = escrow
        .field("requested_amount")
        .ok_or_else(missing)
        .and_then(|value| parse_raw(value).map_err(|_| missing()))?;

    let mut plan = TransactionPlan::default();
    let coin = plan.input(InputValue::object(coin_id));
    let amount = plan.input(InputValue::pure_u64(requested_raw));
    let escrow_arg = plan.input(InputValue::object(escrow_id.clone()));

    let split = plan.command(ProgrammableCommand::SplitCoins(coin, vec![amount]));
    plan.command(escrow_call(
        config,
        &config.accept_function,
        &types.deposit_type,
        &types.payment_type,
        vec![escrow_arg, ArgumentRef::NestedResult(split, 0)],
    ));

    debug!("Planned accept of {} paying {} raw", escrow_id, requested_raw);
    Ok(plan)
}

/// Return the deposit to the creator
pub fn cancel_escrow(
    config: &EscrowConfig,
    escrow_id: &str,
    types: &InstanceTypes,
) -> Result<TransactionPlan, PlanError> {
    let escrow_id = require_id(escrow_id, "escrow")?;

    let mut plan = TransactionPlan::default();
    let escrow_arg = plan.input(InputValue::object(escrow_id));
    plan.command(escrow_call(
        config,
        &config.cancel_function,
        &types.deposit_type,
        &types.payment_type,
        vec![escrow_arg],
    ));
    Ok(plan)
}

/// `faucet::claim<T>(faucet, clock)`
pub fn faucet_claim(config: &EscrowConfig, coin_type: &TypeTag) -> TransactionPlan {
    let mut plan = TransactionPlan::default();
    let faucet = plan.input(InputValue::object(config.faucet_id.clone()));
    let clock = plan.input(InputValue::object(config.clock_object_id.clone()));
    plan.command(ProgrammableCommand::MoveCall(MoveCall {
        package: config.package_id.clone(),
        module: config.faucet_module.clone(),
        function: config.claim_function.clone(),
        type_arguments: vec![coin_type.to_string()],
        arguments: vec![faucet, clock],
    }));
    plan
}
