use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::EscrowConfig;
use crate::ledger::models::ObjectSnapshot;
use crate::ledger::query::LedgerQuery;
use crate::types::{parse_instance_type, InstanceTypes, TypeTag};

/// Deposit and payment types of a live escrow, or `None` when they cannot be read
pub fn detect(snapshot: &ObjectSnapshot) -> Option<InstanceTypes> {
    if !snapshot.exists {
        return None;
    }
    let object_type = snapshot.object_type.as_deref()?;
    match parse_instance_type(object_type) {
        Ok(types) => Some(types),
        Err(e) => {
            debug!(
                "Type of {} not detectable ({}): {}",
                snapshot.object_id, object_type, e
            );
            None
        }
    }
}

fn looks_like_object_id(identifier: &str) -> bool {
    identifier
        .strip_prefix("0x")
        .map(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// What a detection run did to the detector's values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionOutcome {
    Updated(InstanceTypes),
    /// Empty or malformed identifier; nothing fetched
    Ignored,
    /// Object missing or its type is not an escrow instance
    Undetected,
    /// The identifier changed while the fetch was in flight
    Stale,
    Failed(String),
}

#[derive(Debug)]
struct DetectorState {
    identifier: String,
    generation: u64,
    deposit_type: TypeTag,
    payment_type: TypeTag,
}

/// Keeps the deposit/payment types for an escrow id typed by the user.
///
/// Anything short of a successful detection for the current identifier
/// leaves the last-known-good values in place.
pub struct CoinTypeDetector {
    escrow_struct: String,
    state: RwLock<DetectorState>,
}

impl CoinTypeDetector {
    pub fn new(config: &EscrowConfig) -> Self {
        Self {
            escrow_struct: config.escrow_struct.clone(),
            state: RwLock::new(DetectorState {
                identifier: String::new(),
                generation: 0,
                deposit_type: config.default_deposit_type.clone(),
                payment_type: config.default_payment_type.clone(),
            }),
        }
    }

    pub fn deposit_type(&self) -> TypeTag {
        self.state.read().deposit_type.clone()
    }

    pub fn payment_type(&self) -> TypeTag {
        self.state.read().payment_type.clone()
    }

    pub fn identifier(&self) -> String {
        self.state.read().identifier.clone()
    }

    /// Re-run detection; must be called on every identifier change
    pub async fn on_identifier_changed(
        &self,
        identifier: &str,
        ledger: &dyn LedgerQuery,
    ) -> DetectionOutcome {
        let identifier = identifier.trim();
        let generation = {
            let mut state = self.state.write();
            state.identifier = identifier.to_string();
            state.generation += 1;
            state.generation
        };

        if !looks_like_object_id(identifier) {
            return DetectionOutcome::Ignored;
        }

        let fetched = ledger.get_object(identifier).await;

        let mut state = self.state.write();
        if state.generation != generation {
            debug!("Dropping detection for {}: identifier changed", identifier);
            return DetectionOutcome::Stale;
        }

        let snapshot = match fetched {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return DetectionOutcome::Undetected,
            Err(e) => {
                warn!("Failed to fetch {} for type detection: {}", identifier, e);
                return DetectionOutcome::Failed(e.to_string());
            }
        };

        match detect(&snapshot) {
            Some(types) if types.base.rsplit("::").next() == Some(self.escrow_struct.as_str()) => {
                info!(
                    "Detected escrow types for {}: {} / {}",
                    identifier, types.deposit_type, types.payment_type
                );
                state.deposit_type = types.deposit_type.clone();
                state.payment_type = types.payment_type.clone();
                DetectionOutcome::Updated(types)
            }
            _ => DetectionOutcome::Undetected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult, LedgerError};
    use crate::ledger::models::{CoinBalance, TransactionPage};
    use async_trait::async_trait;
    use serde_json::Map;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Notify;

    const ESCROW: &str = "0xe1";
    const ESCROW_TYPE: &str =
        "0xab::simple_escrow::Escrow<0x2::sui::SUI, 0xab::mock_tbtc::MOCK_TBTC>";

    struct ObjectLedger {
        objects: HashMap<String, ObjectSnapshot>,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl ObjectLedger {
        fn new() -> Self {
            let mut objects = HashMap::new();
            objects.insert(
                ESCROW.to_string(),
                ObjectSnapshot::live(ESCROW, ESCROW_TYPE, Map::new()),
            );
            objects.insert(
                "0xc011".to_string(),
                ObjectSnapshot::live("0xc011", "0x2::coin::Coin<0x2::sui::SUI>", Map::new()),
            );
            objects.insert(
                "0xbad".to_string(),
                ObjectSnapshot::live("0xbad", "Escrow<broken", Map::new()),
            );
            Self {
                objects,
                gate: None,
            }
        }
    }

    #[async_trait]
    impl LedgerQuery for ObjectLedger {
        async fn query_account_transactions(
            &self,
            _address: &str,
            _cursor: Option<String>,
        ) -> AppResult<TransactionPage> {
            Ok(TransactionPage::default())
        }

        async fn get_object_snapshots(
            &self,
            ids: &[String],
        ) -> AppResult<HashMap<String, ObjectSnapshot>> {
            if let Some((started, release)) = &self.gate {
                started.notify_one();
                release.notified().await;
            }
            if ids.iter().any(|id| id == "0xdead") {
                return Err(AppError::Ledger(LedgerError::Fetch("timeout".to_string())));
            }
            Ok(ids
                .iter()
                .filter_map(|id| self.objects.get(id).map(|s| (id.clone(), s.clone())))
                .collect())
        }

        async fn get_balance(&self, _owner: &str, coin_type: &str) -> AppResult<CoinBalance> {
            Ok(CoinBalance::zero(coin_type))
        }
    }

    #[test]
    fn test_detect() {
        let snapshot = ObjectSnapshot::live(ESCROW, ESCROW_TYPE, Map::new());
        let types = detect(&snapshot).unwrap();
        assert_eq!(types.deposit_type, TypeTag::new("0x2", "sui", "SUI"));
        assert_eq!(types.payment_type.name, "MOCK_TBTC");

        let broken = ObjectSnapshot::live("0x1", "Escrow<0x1::a::A>", Map::new());
        assert!(detect(&broken).is_none());
        assert!(detect(&ObjectSnapshot::deleted("0x1")).is_none());
    }

    #[tokio::test]
    async fn test_updates_on_detection() {
        let ledger = ObjectLedger::new();
        let detector = CoinTypeDetector::new(&EscrowConfig::for_package("0xab"));
        assert_eq!(detector.deposit_type().name, "MOCK_COIN");

        let outcome = detector.on_identifier_changed(ESCROW, &ledger).await;
        assert!(matches!(outcome, DetectionOutcome::Updated(_)));
        assert_eq!(detector.deposit_type(), TypeTag::new("0x2", "sui", "SUI"));
        assert_eq!(detector.payment_type().name, "MOCK_TBTC");
    }

    #[tokio::test]
    async fn test_keeps_last_known_good() {
        let ledger = ObjectLedger::new();
        let detector = CoinTypeDetector::new(&EscrowConfig::for_package("0xab"));
        detector.on_identifier_changed(ESCROW, &ledger).await;
        let expected = (detector.deposit_type(), detector.payment_type());

        for identifier in ["", "   ", "0x", "not-an-id"] {
            assert_eq!(
                detector.on_identifier_changed(identifier, &ledger).await,
                DetectionOutcome::Ignored
            );
        }
        assert_eq!(
            detector.on_identifier_changed("0xc011", &ledger).await,
            DetectionOutcome::Undetected
        );
        assert_eq!(
            detector.on_identifier_changed("0xbad", &ledger).await,
            DetectionOutcome::Undetected
        );
        assert_eq!(
            detector.on_identifier_changed("0x404", &ledger).await,
            DetectionOutcome::Undetected
        );
        assert!(matches!(
            detector.on_identifier_changed("0xdead", &ledger).await,
            DetectionOutcome::Failed(_)
        ));

        assert_eq!((detector.deposit_type(), detector.payment_type()), expected);
        assert_eq!(detector.identifier(), "0xdead");
    }

    #[tokio::test]
    async fn test_stale_completion_is_dropped() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let mut slow = ObjectLedger::new();
        slow.gate = Some((started.clone(), release.clone()));
        let fast = ObjectLedger::new();

        let detector = CoinTypeDetector::new(&EscrowConfig::for_package("0xab"));

        let (first, _) = tokio::join!(detector.on_identifier_changed(ESCROW, &slow), async {
            started.notified().await;
            detector.on_identifier_changed("", &fast).await;
            release.notify_one();
        });

        assert_eq!(first, DetectionOutcome::Stale);
        assert_eq!(detector.deposit_type().name, "MOCK_COIN");
    }
}
