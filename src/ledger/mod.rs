pub mod balance;
pub mod models;
pub mod query;

pub use balance::preset_balances;
pub use models::{
    Address, ArgumentRef, CoinBalance, CoinObject, InputValue, MoveCall, ObjectChange,
    ObjectSnapshot, ProgrammableCommand, TransactionPage, TransactionRecord,
};
pub use query::{fetch_history, LedgerQuery};
