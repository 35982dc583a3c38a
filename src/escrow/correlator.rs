use std::collections::HashMap;
use tracing::warn;

use crate::escrow::models::{EscrowCreationRecord, EscrowStatus, ReconciledEscrow, RequestedAmount};
use crate::ledger::models::{ArgumentRef, InputValue, ObjectSnapshot};
use crate::types::addresses_equal;
use crate::units::{parse_raw, to_display};

const REQUESTED_AMOUNT_FIELD: &str = "requested_amount";

fn find_snapshot<'a>(
    snapshots: &'a HashMap<String, ObjectSnapshot>,
    escrow_id: &str,
) -> Option<&'a ObjectSnapshot> {
    snapshots.get(escrow_id).or_else(|| {
        snapshots
            .values()
            .find(|s| addresses_equal(&s.object_id, escrow_id))
    })
}

/// Requested amount from the live object; the authoritative current value
fn live_amount(snapshot: &ObjectSnapshot, decimals: u8) -> Option<RequestedAmount> {
    let raw = parse_raw(snapshot.field(REQUESTED_AMOUNT_FIELD)?).ok()?;
    to_display(raw, decimals).ok().map(RequestedAmount::Known)
}

/// Requested amount as submitted at creation. Only a pure `Input` is resolvable.
fn creation_amount(record: &EscrowCreationRecord, decimals: u8) -> RequestedAmount {
    let Some(ArgumentRef::Input(index)) = record.requested_amount_ref else {
        return RequestedAmount::Unknown;
    };
    match record.transaction_inputs.get(index as usize) {
        Some(InputValue::Pure { value, .. }) => parse_raw(value)
            .and_then(|raw| to_display(raw, decimals))
            .map(RequestedAmount::Known)
            .unwrap_or(RequestedAmount::Unknown),
        _ => RequestedAmount::Unknown,
    }
}

/// Project one creation event against its current snapshot
pub fn project(
    record: &EscrowCreationRecord,
    snapshot: Option<&ObjectSnapshot>,
    decimals: u8,
) -> ReconciledEscrow {
    let live = snapshot.filter(|s| s.exists);

    let (status, requested_amount) = match live {
        Some(snapshot) => {
            let amount = live_amount(snapshot, decimals).unwrap_or_else(|| {
                warn!(
                    "Escrow {} has no readable {}, using creation input",
                    record.escrow_id, REQUESTED_AMOUNT_FIELD
                );
                creation_amount(record, decimals)
            });
            (EscrowStatus::Open, amount)
        }
        None => (EscrowStatus::Closed, creation_amount(record, decimals)),
    };

    if requested_amount == RequestedAmount::Unknown {
        warn!(
            "Requested amount of escrow {} unresolvable (ref {:?})",
            record.escrow_id, record.requested_amount_ref
        );
    }

    ReconciledEscrow {
        id: record.escrow_id.clone(),
        deposit_type: record.deposit_type.clone(),
        payment_type: record.payment_type.clone(),
        requested_amount,
        status,
        origin_digest: record.tx_digest.clone(),
    }
}

/// Fold creation events over the current snapshot mapping.
///
/// An id missing from `snapshots` means the object was consumed (accepted or cancelled).
pub fn correlate(
    records: &[EscrowCreationRecord],
    snapshots: &HashMap<String, ObjectSnapshot>,
    decimals: u8,
) -> Vec<ReconciledEscrow> {
    records
        .iter()
        .fold(Vec::with_capacity(records.len()), |mut view, record| {
            view.push(project(
                record,
                find_snapshot(snapshots, &record.escrow_id),
                decimals,
            ));
            view
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::{json, Map, Value};

    fn record(id: &str, amount_ref: Option<ArgumentRef>) -> EscrowCreationRecord {
        EscrowCreationRecord {
            escrow_id: id.to_string(),
            tx_digest: format!("digest-{}", id),
            deposit_type: "0xab::mock_coin::MOCK_COIN".to_string(),
            payment_type: "0xab::mock_zsui::MOCK_ZSUI".to_string(),
            requested_amount_ref: amount_ref,
            transaction_inputs: vec![
                InputValue::object("0xc01n"),
                InputValue::pure_u64(2_000_000_000),
                InputValue::pure_u64(3_000_000_000),
            ],
        }
    }

    fn live(id: &str, requested: Value) -> ObjectSnapshot {
        let mut fields = Map::new();
        fields.insert("requested_amount".to_string(), requested);
        ObjectSnapshot::live(
            id,
            "0xab::simple_escrow::Escrow<0xab::mock_coin::MOCK_COIN, 0xab::mock_zsui::MOCK_ZSUI>",
            fields,
        )
    }

    #[test]
    fn test_missing_snapshot_is_closed_with_creation_amount() {
        let records = vec![record("E1", Some(ArgumentRef::Input(2)))];
        let view = correlate(&records, &HashMap::new(), 9);

        assert_eq!(view.len(), 1);
        assert_eq!(view[0].status, EscrowStatus::Closed);
        assert_eq!(view[0].requested_amount, RequestedAmount::Known(dec!(3)));
        assert_eq!(view[0].origin_digest, "digest-E1");
    }

    #[test]
    fn test_live_snapshot_is_open_with_live_amount() {
        let records = vec![record("E1", Some(ArgumentRef::Input(2)))];
        let snapshots = HashMap::from([("E1".to_string(), live("E1", json!("5000000000")))]);
        let view = correlate(&records, &snapshots, 9);

        assert_eq!(view[0].status, EscrowStatus::Open);
        assert_eq!(view[0].requested_amount, RequestedAmount::Known(dec!(5.0)));
    }

    #[test]
    fn test_exists_false_is_closed() {
        let records = vec![record("E1", Some(ArgumentRef::Input(1)))];
        let snapshots = HashMap::from([("E1".to_string(), ObjectSnapshot::deleted("E1"))]);
        let view = correlate(&records, &snapshots, 9);

        assert_eq!(view[0].status, EscrowStatus::Closed);
        assert_eq!(view[0].requested_amount, RequestedAmount::Known(dec!(2)));
    }

    #[test]
    fn test_non_input_reference_degrades_to_unknown() {
        let records = vec![
            record("E1", Some(ArgumentRef::Result(0))),
            record("E2", Some(ArgumentRef::NestedResult(0, 0))),
            record("E3", None),
            // points at an object input, not a pure value
            record("E4", Some(ArgumentRef::Input(0))),
            record("E5", Some(ArgumentRef::Input(9))),
        ];
        let view = correlate(&records, &HashMap::new(), 9);

        assert_eq!(view.len(), 5);
        assert!(view
            .iter()
            .all(|e| e.requested_amount == RequestedAmount::Unknown && e.status == EscrowStatus::Closed));
    }

    #[test]
    fn test_malformed_live_field_falls_back_without_affecting_others() {
        let records = vec![
            record("E1", Some(ArgumentRef::Input(2))),
            record("E2", Some(ArgumentRef::Input(2))),
        ];
        let snapshots = HashMap::from([
            ("E1".to_string(), live("E1", json!("not-a-number"))),
            ("E2".to_string(), live("E2", json!(7_000_000_000u64))),
        ]);
        let view = correlate(&records, &snapshots, 9);

        assert_eq!(view[0].status, EscrowStatus::Open);
        assert_eq!(view[0].requested_amount, RequestedAmount::Known(dec!(3)));
        assert_eq!(view[1].requested_amount, RequestedAmount::Known(dec!(7)));
    }

    #[test]
    fn test_snapshot_lookup_tolerates_address_padding() {
        let records = vec![record("0x0e1", Some(ArgumentRef::Input(2)))];
        let snapshots = HashMap::from([("0xe1".to_string(), live("0xe1", json!("1000000000")))]);
        let view = correlate(&records, &snapshots, 9);
        assert_eq!(view[0].status, EscrowStatus::Open);
        assert_eq!(view[0].requested_amount, RequestedAmount::Known(dec!(1)));
    }

    #[test]
    fn test_preserves_record_order() {
        let records = vec![
            record("E3", Some(ArgumentRef::Input(2))),
            record("E1", Some(ArgumentRef::Input(2))),
        ];
        let ids: Vec<_> = correlate(&records, &HashMap::new(), 9)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["E3", "E1"]);
    }
}
