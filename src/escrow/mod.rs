pub mod correlator;
pub mod detector;
pub mod models;
pub mod plans;
pub mod preview;
pub mod reconciler;
pub mod scanner;

pub use correlator::correlate;
pub use detector::{detect, CoinTypeDetector, DetectionOutcome};
pub use models::{
    EscrowCreationRecord, EscrowStatus, ReconciledEscrow, ReconciliationReport, RequestedAmount,
};
pub use plans::{accept_escrow, cancel_escrow, create_escrow, faucet_claim, TransactionPlan};
pub use preview::{select_payment_coin, short_object_id, EscrowTerms};
pub use reconciler::{reconcile, PassTicket, ReconciliationSession};
pub use scanner::scan;
