//! In-memory port implementations shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use dealer_core::domain::{
    Commissionist, Expense, NewExpense, Transaction, TransactionKind, VehicleStatus,
};
use dealer_core::ports::{
    AuditEntry, AuditError, AuditSink, DealershipStore, RepositoryError, RepositoryResult,
    TransactionPatch,
};

#[derive(Default)]
pub struct InMemoryStore {
    pub transactions: Mutex<HashMap<Uuid, Transaction>>,
    pub commissionists: Mutex<HashMap<Uuid, Commissionist>>,
    pub vehicles: Mutex<HashMap<Uuid, VehicleStatus>>,
    pub expenses: Mutex<Vec<Expense>>,
    counter: AtomicI64,
    pub fail_vehicle_updates: AtomicBool,
}

impl InMemoryStore {
    pub fn add_commissionist(&self, rate: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.commissionists.lock().unwrap().insert(
            id,
            Commissionist {
                id,
                name: "Agent".to_string(),
                commission_rate: BigDecimal::from_str(rate).unwrap(),
            },
        );
        id
    }

    pub fn remove_commissionist(&self, id: Uuid) {
        self.commissionists.lock().unwrap().remove(&id);
    }

    pub fn add_vehicle(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.vehicles
            .lock()
            .unwrap()
            .insert(id, VehicleStatus::Available);
        id
    }

    pub fn vehicle_status(&self, id: Uuid) -> VehicleStatus {
        *self.vehicles.lock().unwrap().get(&id).unwrap()
    }

    pub fn expense_count(&self) -> usize {
        self.expenses.lock().unwrap().len()
    }

    pub fn all_expenses(&self) -> Vec<Expense> {
        self.expenses.lock().unwrap().clone()
    }
}

#[async_trait]
impl DealershipStore for InMemoryStore {
    async fn insert_transaction(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        self.transactions
            .lock()
            .unwrap()
            .insert(tx.id, tx.clone());
        Ok(tx.clone())
    }

    async fn find_transaction(&self, id: Uuid) -> RepositoryResult<Transaction> {
        self.transactions
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("transaction {id}")))
    }

    async fn list_transactions(
        &self,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Transaction>> {
        let mut all: Vec<Transaction> =
            self.transactions.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update_transaction(
        &self,
        id: Uuid,
        patch: &TransactionPatch,
    ) -> RepositoryResult<Transaction> {
        let mut transactions = self.transactions.lock().unwrap();
        let current = transactions
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("transaction {id}")))?;

        if let Some(kind) = patch.kind {
            current.kind = kind;
        }
        if let Some(status) = patch.status {
            current.status = status;
        }
        if let Some(vehicle_id) = patch.vehicle_id {
            current.vehicle_id = vehicle_id;
        }
        if let Some(customer_id) = patch.customer_id {
            current.customer_id = customer_id;
        }
        if let Some(commissionist_id) = patch.commissionist_id {
            current.commissionist_id = commissionist_id;
        }
        if let Some(ref total_amount) = patch.total_amount {
            current.total_amount = total_amount.clone();
        }
        if let Some(ref commission) = patch.commission {
            current.commission = commission.clone();
        }
        if let Some(ref payment_method) = patch.payment_method {
            current.payment_method = payment_method.clone();
        }
        if let Some(delivery_date) = patch.delivery_date {
            current.delivery_date = delivery_date;
        }
        if let Some(ref notes) = patch.notes {
            current.notes = notes.clone();
        }
        current.updated_at = Utc::now();
        Ok(current.clone())
    }

    async fn find_commissionist(&self, id: Uuid) -> RepositoryResult<Commissionist> {
        self.commissionists
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("commissionist {id}")))
    }

    async fn update_vehicle_status(
        &self,
        vehicle_id: Uuid,
        status: VehicleStatus,
    ) -> RepositoryResult<()> {
        if self.fail_vehicle_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(
                "vehicle table offline".to_string(),
            ));
        }
        let mut vehicles = self.vehicles.lock().unwrap();
        match vehicles.get_mut(&vehicle_id) {
            Some(current) => {
                *current = status;
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("vehicle {vehicle_id}"))),
        }
    }

    async fn create_expense(&self, expense: &NewExpense) -> RepositoryResult<Expense> {
        let stored = Expense {
            id: Uuid::new_v4(),
            amount: expense.amount.clone(),
            description: expense.description.clone(),
            category: expense.category.clone(),
            created_at: Utc::now(),
        };
        self.expenses.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn clear_commissionist(&self, transaction_id: Uuid) -> RepositoryResult<()> {
        let mut transactions = self.transactions.lock().unwrap();
        let current = transactions
            .get_mut(&transaction_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("transaction {transaction_id}")))?;
        current.commissionist_id = None;
        Ok(())
    }

    async fn next_transaction_number(&self, kind: TransactionKind) -> RepositoryResult<String> {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let prefix = match kind {
            TransactionKind::Sale => "SAL",
            TransactionKind::Purchase => "PUR",
        };
        Ok(format!("{prefix}-{seq:06}"))
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    pub entries: Mutex<Vec<AuditEntry>>,
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn log_action(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

pub struct FailingAudit;

#[async_trait]
impl AuditSink for FailingAudit {
    async fn log_action(&self, _entry: AuditEntry) -> Result<(), AuditError> {
        Err(AuditError("audit store unavailable".to_string()))
    }
}
