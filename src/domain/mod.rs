pub mod commission;
pub mod money;
pub mod transaction;

pub use transaction::{
    Commissionist, Expense, NewExpense, Transaction, TransactionKind, TransactionStatus,
    VehicleStatus,
};
