//! Persistence and audit ports consumed by the lifecycle engine.
//!
//! The engine never touches a live store directly; everything goes
//! through `DealershipStore`, so tests and alternative backends can
//! substitute their own implementation.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    Commissionist, Expense, NewExpense, Transaction, TransactionKind, TransactionStatus,
    VehicleStatus,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row not found".to_string()),
            other => RepositoryError::Database(other.to_string()),
        }
    }
}

/// Field-level patch for a transaction update. `None` leaves the stored
/// value untouched; the nested options distinguish "unchanged" from
/// "set to null".
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub vehicle_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub commissionist_id: Option<Option<Uuid>>,
    pub total_amount: Option<BigDecimal>,
    pub commission: Option<BigDecimal>,
    pub payment_method: Option<String>,
    pub delivery_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
}

#[async_trait]
pub trait DealershipStore: Send + Sync {
    async fn insert_transaction(&self, tx: &Transaction) -> RepositoryResult<Transaction>;

    async fn find_transaction(&self, id: Uuid) -> RepositoryResult<Transaction>;

    async fn list_transactions(&self, limit: i64, offset: i64)
        -> RepositoryResult<Vec<Transaction>>;

    async fn update_transaction(
        &self,
        id: Uuid,
        patch: &TransactionPatch,
    ) -> RepositoryResult<Transaction>;

    async fn find_commissionist(&self, id: Uuid) -> RepositoryResult<Commissionist>;

    async fn update_vehicle_status(
        &self,
        vehicle_id: Uuid,
        status: VehicleStatus,
    ) -> RepositoryResult<()>;

    async fn create_expense(&self, expense: &NewExpense) -> RepositoryResult<Expense>;

    /// Null a dangling commissionist reference on a transaction without
    /// going through the full update path, so a referential-integrity
    /// failure cannot block the update of unrelated fields.
    async fn clear_commissionist(&self, transaction_id: Uuid) -> RepositoryResult<()>;

    /// Issue the next human-readable transaction number for `kind`.
    /// Assigned once at creation; never reused.
    async fn next_transaction_number(&self, kind: TransactionKind) -> RepositoryResult<String>;
}

#[derive(Debug, Error)]
#[error("audit write failed: {0}")]
pub struct AuditError(pub String);

/// One append-only audit record: who did what to which entity.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub entity_kind: &'static str,
    pub entity_id: Uuid,
    pub action: &'static str,
    pub description: String,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub actor_id: Option<Uuid>,
    pub actor_email: Option<String>,
}

pub const ENTITY_TRANSACTION: &str = "transaction";
pub const ENTITY_EXPENSE: &str = "expense";

pub const ACTION_CREATE: &str = "create";
pub const ACTION_UPDATE: &str = "update";
pub const ACTION_CANCEL: &str = "cancel";

/// Best-effort audit trail. The caller inspects the result, logs
/// failures, and never lets them surface as an operation error.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log_action(&self, entry: AuditEntry) -> Result<(), AuditError>;
}
