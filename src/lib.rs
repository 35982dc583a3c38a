//! Reconciles a wallet's escrow history against current ledger state.
//!
//! History is scanned for successful `create_escrow` calls, the created
//! escrow objects are fetched in one batch, and each creation is reported
//! as open or closed with its requested amount.

pub mod config;
pub mod error;
pub mod escrow;
pub mod ledger;
pub mod types;
pub mod units;

pub use config::{CoinPreset, CoinSelection, EscrowConfig};
pub use error::{AppError, AppResult};
pub use escrow::{reconcile, CoinTypeDetector, ReconciledEscrow, ReconciliationReport, ReconciliationSession};
pub use ledger::{preset_balances, LedgerQuery};
pub use types::{parse_instance_type, InstanceTypes, TypeTag};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Initialize logging and tracing; a subscriber already installed by the host wins
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,escrow_reconciler=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
