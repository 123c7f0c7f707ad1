//! Transaction lifecycle orchestration.
//!
//! Each operation runs as an ordered sequence of independent writes
//! against the store port; there is no enclosing atomic transaction.
//! Validation and business-rule checks happen before the first write.
//! Everything after the transaction write commits is best-effort:
//! vehicle sync and audit failures are logged, never propagated, and
//! earlier writes are never undone.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    commission::{self, CommissionInputs},
    money, NewExpense, Transaction, TransactionKind, TransactionStatus,
};
use crate::error::AppError;
use crate::ports::{
    AuditEntry, AuditSink, DealershipStore, TransactionPatch, ACTION_CANCEL, ACTION_CREATE,
    ACTION_UPDATE, ENTITY_EXPENSE, ENTITY_TRANSACTION,
};
use crate::services::reference_guard::ReferenceGuard;
use crate::services::vehicle_sync::VehicleStatusSynchronizer;

pub const EXPENSE_CATEGORY_PURCHASE: &str = "vehicle_purchase";
pub const EXPENSE_CATEGORY_REVERSAL: &str = "sale_reversal";

/// Inbound payload for creating a transaction. Amounts arrive as
/// locale-formatted strings and the commissionist reference as a raw
/// string so sentinel normalization happens once, here at the boundary.
#[derive(Debug, Clone, Default)]
pub struct CreateTransactionInput {
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub vehicle_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub commissionist_id: Option<String>,
    pub total_amount: Option<String>,
    pub commission_override: Option<String>,
    pub commission: Option<String>,
    pub payment_method: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub actor_email: Option<String>,
}

/// Inbound payload for updating a transaction. A PUT replaces the
/// editable fields, so the required ones must be present again.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub vehicle_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    /// Absent means "leave unchanged"; empty or sentinel strings clear.
    pub commissionist_id: Option<String>,
    pub total_amount: Option<String>,
    pub commission_override: Option<String>,
    pub commission: Option<String>,
    pub payment_method: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub actor_email: Option<String>,
}

pub struct TransactionLifecycleService {
    store: Arc<dyn DealershipStore>,
    audit: Arc<dyn AuditSink>,
}

impl TransactionLifecycleService {
    pub fn new(store: Arc<dyn DealershipStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub async fn get(&self, id: Uuid) -> Result<Transaction, AppError> {
        Ok(self.store.find_transaction(id).await?)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Transaction>, AppError> {
        Ok(self.store.list_transactions(limit, offset).await?)
    }

    pub async fn create(&self, input: CreateTransactionInput) -> Result<Transaction, AppError> {
        let kind = input
            .kind
            .ok_or_else(|| AppError::Validation("type is required".to_string()))?;
        let vehicle_id = input
            .vehicle_id
            .ok_or_else(|| AppError::Validation("vehicle_id is required".to_string()))?;
        let customer_id = input
            .customer_id
            .ok_or_else(|| AppError::Validation("customer_id is required".to_string()))?;
        let total_raw = input
            .total_amount
            .as_deref()
            .ok_or_else(|| AppError::Validation("total_amount is required".to_string()))?;
        let total_amount = money::parse_amount(total_raw)?;

        let status = input.status.unwrap_or(TransactionStatus::Pending);

        let guard = ReferenceGuard::new(self.store.as_ref());
        let commissionist = guard.resolve(input.commissionist_id.as_deref()).await;
        let commission_amount = commission::compute(
            &total_amount,
            CommissionInputs {
                commission_override: input.commission_override.as_deref(),
                commissionist_rate: commissionist.as_ref().map(|c| &c.commission_rate),
                explicit_commission: input.commission.as_deref(),
            },
        );

        let number = self.store.next_transaction_number(kind).await?;
        let tx = Transaction::new(
            number,
            kind,
            status,
            vehicle_id,
            customer_id,
            commissionist.map(|c| c.id),
            total_amount,
            commission_amount,
            input.payment_method.unwrap_or_default(),
            input.delivery_date,
            input.notes,
        );

        let stored = self.store.insert_transaction(&tx).await?;
        info!(
            transaction_id = %stored.id,
            number = %stored.transaction_number,
            kind = kind.as_str(),
            "transaction created"
        );

        // A completed purchase is a cash outflow the moment it lands.
        if kind == TransactionKind::Purchase && stored.status == TransactionStatus::Completed {
            self.record_purchase_expense(&stored).await;
        }

        VehicleStatusSynchronizer::new(self.store.as_ref())
            .sync(&stored)
            .await;

        self.record_audit(AuditEntry {
            entity_kind: ENTITY_TRANSACTION,
            entity_id: stored.id,
            action: ACTION_CREATE,
            description: format!("Transaction {} created", stored.transaction_number),
            before: None,
            after: snapshot(&stored),
            actor_id: None,
            actor_email: input.actor_email,
        })
        .await;

        Ok(stored)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateTransactionInput,
    ) -> Result<Transaction, AppError> {
        let existing = self.store.find_transaction(id).await?;

        let kind = input
            .kind
            .ok_or_else(|| AppError::Validation("type is required".to_string()))?;
        let vehicle_id = input
            .vehicle_id
            .ok_or_else(|| AppError::Validation("vehicle_id is required".to_string()))?;
        let customer_id = input
            .customer_id
            .ok_or_else(|| AppError::Validation("customer_id is required".to_string()))?;
        let total_raw = input
            .total_amount
            .as_deref()
            .ok_or_else(|| AppError::Validation("total_amount is required".to_string()))?;
        let total_amount = money::parse_amount(total_raw)?;

        if let Some(next) = input.status {
            // Cancelling a completed sale reverses money and must go
            // through the dedicated cancel operation, which records the
            // reversal expense and its audit trail.
            if existing.kind == TransactionKind::Sale
                && existing.status == TransactionStatus::Completed
                && next == TransactionStatus::Cancelled
            {
                return Err(AppError::BusinessRule(
                    "a completed sale cannot be cancelled through an update; use the cancel operation"
                        .to_string(),
                ));
            }
            if !existing.status.can_transition_to(next) {
                return Err(AppError::BusinessRule(format!(
                    "cannot change status from {} to {}",
                    existing.status.as_str(),
                    next.as_str()
                )));
            }
        }

        let guard = ReferenceGuard::new(self.store.as_ref());

        // Repair a stored dangling reference first, through its own
        // persistence path, so a referential-integrity failure cannot
        // block the update of unrelated fields.
        let repaired = guard.repair_stored(&existing).await?;
        let stored_commissionist_id = if repaired {
            None
        } else {
            existing.commissionist_id
        };

        let (commissionist_patch, commissionist) = match input.commissionist_id.as_deref() {
            Some(raw) => {
                let resolved = guard.resolve(Some(raw)).await;
                (Some(resolved.as_ref().map(|c| c.id)), resolved)
            }
            None => (
                None,
                guard.resolve_stored(stored_commissionist_id).await,
            ),
        };

        let commission_amount = commission::compute(
            &total_amount,
            CommissionInputs {
                commission_override: input.commission_override.as_deref(),
                commissionist_rate: commissionist.as_ref().map(|c| &c.commission_rate),
                explicit_commission: input.commission.as_deref(),
            },
        );

        let patch = TransactionPatch {
            kind: Some(kind),
            status: input.status,
            vehicle_id: Some(vehicle_id),
            customer_id: Some(customer_id),
            commissionist_id: commissionist_patch,
            total_amount: Some(total_amount),
            commission: Some(commission_amount),
            payment_method: input.payment_method,
            delivery_date: Some(input.delivery_date),
            notes: Some(input.notes),
        };

        let updated = self.store.update_transaction(id, &patch).await?;
        info!(
            transaction_id = %updated.id,
            status = updated.status.as_str(),
            "transaction updated"
        );

        VehicleStatusSynchronizer::new(self.store.as_ref())
            .sync(&updated)
            .await;

        self.record_audit(AuditEntry {
            entity_kind: ENTITY_TRANSACTION,
            entity_id: updated.id,
            action: ACTION_UPDATE,
            description: format!("Transaction {} updated", updated.transaction_number),
            before: snapshot(&existing),
            after: snapshot(&updated),
            actor_id: None,
            actor_email: input.actor_email,
        })
        .await;

        Ok(updated)
    }

    /// Cancel a transaction. Idempotent: cancelling an already-cancelled
    /// transaction is a no-op success and creates no duplicate expense.
    pub async fn cancel(
        &self,
        id: Uuid,
        actor_email: Option<String>,
    ) -> Result<Transaction, AppError> {
        let existing = self.store.find_transaction(id).await?;

        if existing.status == TransactionStatus::Cancelled {
            info!(transaction_id = %existing.id, "transaction already cancelled");
            return Ok(existing);
        }

        // A completed sale already counted as revenue; cancelling it
        // records an offsetting expense before the status flips.
        if existing.kind == TransactionKind::Sale
            && existing.status == TransactionStatus::Completed
        {
            let expense = self
                .store
                .create_expense(&NewExpense {
                    amount: existing.total_amount.clone(),
                    description: format!(
                        "Reversal of cancelled sale {}",
                        existing.transaction_number
                    ),
                    category: EXPENSE_CATEGORY_REVERSAL.to_string(),
                })
                .await?;
            info!(
                transaction_id = %existing.id,
                expense_id = %expense.id,
                "reversal expense recorded"
            );
            self.record_audit(AuditEntry {
                entity_kind: ENTITY_EXPENSE,
                entity_id: expense.id,
                action: ACTION_CREATE,
                description: format!(
                    "Reversal expense for cancelled sale {}",
                    existing.transaction_number
                ),
                before: None,
                after: serde_json::to_value(&expense).ok(),
                actor_id: None,
                actor_email: actor_email.clone(),
            })
            .await;
        }

        let patch = TransactionPatch {
            status: Some(TransactionStatus::Cancelled),
            ..TransactionPatch::default()
        };
        let cancelled = self.store.update_transaction(id, &patch).await?;
        info!(transaction_id = %cancelled.id, "transaction cancelled");

        self.record_audit(AuditEntry {
            entity_kind: ENTITY_TRANSACTION,
            entity_id: cancelled.id,
            action: ACTION_CANCEL,
            description: format!("Transaction {} cancelled", cancelled.transaction_number),
            before: snapshot(&existing),
            after: snapshot(&cancelled),
            actor_id: None,
            actor_email,
        })
        .await;

        VehicleStatusSynchronizer::new(self.store.as_ref())
            .sync(&cancelled)
            .await;

        Ok(cancelled)
    }

    async fn record_purchase_expense(&self, tx: &Transaction) {
        let result = self
            .store
            .create_expense(&NewExpense {
                amount: tx.total_amount.clone(),
                description: format!("Vehicle purchase {}", tx.transaction_number),
                category: EXPENSE_CATEGORY_PURCHASE.to_string(),
            })
            .await;
        match result {
            Ok(expense) => {
                self.record_audit(AuditEntry {
                    entity_kind: ENTITY_EXPENSE,
                    entity_id: expense.id,
                    action: ACTION_CREATE,
                    description: format!("Purchase expense for {}", tx.transaction_number),
                    before: None,
                    after: serde_json::to_value(&expense).ok(),
                    actor_id: None,
                    actor_email: None,
                })
                .await;
            }
            Err(err) => {
                error!(
                    transaction_id = %tx.id,
                    error = %err,
                    "purchase expense write failed after transaction commit"
                );
            }
        }
    }

    async fn record_audit(&self, entry: AuditEntry) {
        let entity_id = entry.entity_id;
        let action = entry.action;
        if let Err(err) = self.audit.log_action(entry).await {
            warn!(entity_id = %entity_id, action, error = %err, "audit write failed");
        }
    }
}

fn snapshot(tx: &Transaction) -> Option<serde_json::Value> {
    serde_json::to_value(tx).ok()
}
