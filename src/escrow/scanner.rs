use tracing::debug;

use crate::config::EscrowConfig;
use crate::escrow::models::EscrowCreationRecord;
use crate::ledger::models::{MoveCall, ObjectChange, TransactionRecord};
use crate::types::{parse_type_expr, TypeExpr};

/// An escrow object created by a transaction, not yet paired with a call
struct CreatedEscrow<'a> {
    object_id: &'a str,
    object_type: TypeExpr,
    claimed: bool,
}

/// Created objects whose type is exactly the escrow struct of this package.
///
/// `EscrowCap` or any other object created in the same batch never qualifies.
fn created_escrows<'a>(tx: &'a TransactionRecord, config: &EscrowConfig) -> Vec<CreatedEscrow<'a>> {
    tx.object_changes
        .iter()
        .filter_map(|change| match change {
            ObjectChange::Created {
                object_id,
                object_type,
                ..
            } => Some((object_id.as_str(), object_type.as_str())),
            _ => None,
        })
        .filter_map(|(object_id, object_type)| {
            let expr = parse_type_expr(object_type).ok()?;
            expr.is_struct(&config.package_id, &config.escrow_module, &config.escrow_struct)
                .then_some(CreatedEscrow {
                    object_id,
                    object_type: expr,
                    claimed: false,
                })
        })
        .collect()
}

/// `Some(true)` when the created object's parameters equal the call's type
/// arguments, `None` when the call's arguments cannot be compared.
fn parameters_match(created: &TypeExpr, call: &MoveCall) -> Option<bool> {
    let call_params = call
        .type_arguments
        .iter()
        .map(|arg| parse_type_expr(arg).ok())
        .collect::<Option<Vec<_>>>()?;

    if created.params.is_empty() || call_params.is_empty() {
        return None;
    }

    Some(
        created.params.len() == call_params.len()
            && created
                .params
                .iter()
                .zip(&call_params)
                .all(|(a, b)| a.same_type(b)),
    )
}

/// Claim the first unclaimed escrow whose comparison with `call` gives `wanted`.
///
/// `Some(true)` asks for an exact type match, `None` for a call whose types
/// cannot be compared.
fn claim<'a>(
    created: &mut [CreatedEscrow<'a>],
    call: &MoveCall,
    wanted: Option<bool>,
) -> Option<&'a str> {
    let index = created
        .iter()
        .position(|c| !c.claimed && parameters_match(&c.object_type, call) == wanted)?;
    created[index].claimed = true;
    Some(created[index].object_id)
}

/// Recover escrow-creation events from an account's history.
///
/// Output follows history order. Calls without a matching created escrow
/// (reverted or failed) produce nothing. Within a transaction, calls with an
/// exact type match are paired before any call falls back to an untyped match.
pub fn scan(history: &[TransactionRecord], config: &EscrowConfig) -> Vec<EscrowCreationRecord> {
    let mut records = Vec::new();

    for tx in history {
        let calls: Vec<&MoveCall> = tx
            .commands
            .iter()
            .filter_map(|c| c.as_move_call())
            .filter(|call| {
                call.targets(
                    &config.package_id,
                    &config.escrow_module,
                    &config.create_function,
                )
            })
            .collect();
        if calls.is_empty() {
            continue;
        }

        let mut created = created_escrows(tx, config);
        let mut paired: Vec<Option<&str>> = calls
            .iter()
            .map(|call| claim(&mut created, call, Some(true)))
            .collect();
        for (call, slot) in calls.iter().zip(paired.iter_mut()) {
            if slot.is_none() {
                *slot = claim(&mut created, call, None);
            }
        }

        for (call, escrow_id) in calls.into_iter().zip(paired) {
            let Some(escrow_id) = escrow_id else {
                debug!(
                    "Skipping {} call in {}: no escrow object created",
                    config.create_function, tx.digest
                );
                continue;
            };

            records.push(EscrowCreationRecord {
                escrow_id: escrow_id.to_string(),
                tx_digest: tx.digest.clone(),
                deposit_type: call.type_arguments.first().cloned().unwrap_or_default(),
                payment_type: call.type_arguments.get(1).cloned().unwrap_or_default(),
                requested_amount_ref: call.arguments.get(1).copied(),
                transaction_inputs: tx.inputs.clone(),
            });
        }
    }

    debug!(
        "Scanned {} transactions, found {} escrow creations",
        history.len(),
        records.len()
    );
    records
}
