//! Postgres implementation of the dealership store and audit ports.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    Commissionist, Expense, NewExpense, Transaction, TransactionKind, TransactionStatus,
    VehicleStatus,
};
use crate::ports::{
    AuditEntry, AuditError, AuditSink, DealershipStore, RepositoryError, RepositoryResult,
    TransactionPatch,
};

/// Postgres-backed dealership store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DealershipStore for PostgresStore {
    async fn insert_transaction(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                id, transaction_number, kind, status, vehicle_id, customer_id,
                commissionist_id, total_amount, commission, payment_method,
                delivery_date, notes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(tx.id)
        .bind(&tx.transaction_number)
        .bind(tx.kind.as_str())
        .bind(tx.status.as_str())
        .bind(tx.vehicle_id)
        .bind(tx.customer_id)
        .bind(tx.commissionist_id)
        .bind(&tx.total_amount)
        .bind(&tx.commission)
        .bind(&tx.payment_method)
        .bind(tx.delivery_date)
        .bind(&tx.notes)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        row.into_domain()
    }

    async fn find_transaction(&self, id: Uuid) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        row.ok_or_else(|| RepositoryError::NotFound(format!("transaction {id}")))?
            .into_domain()
    }

    async fn list_transactions(
        &self,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn update_transaction(
        &self,
        id: Uuid,
        patch: &TransactionPatch,
    ) -> RepositoryResult<Transaction> {
        // Read-merge-write: the engine accepts last-writer-wins on
        // concurrent updates to the same transaction.
        let mut current = self.find_transaction(id).await?;

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

        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE transactions SET
                kind = $2, status = $3, vehicle_id = $4, customer_id = $5,
                commissionist_id = $6, total_amount = $7, commission = $8,
                payment_method = $9, delivery_date = $10, notes = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(current.kind.as_str())
        .bind(current.status.as_str())
        .bind(current.vehicle_id)
        .bind(current.customer_id)
        .bind(current.commissionist_id)
        .bind(&current.total_amount)
        .bind(&current.commission)
        .bind(&current.payment_method)
        .bind(current.delivery_date)
        .bind(&current.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        row.into_domain()
    }

    async fn find_commissionist(&self, id: Uuid) -> RepositoryResult<Commissionist> {
        let row = sqlx::query_as::<_, CommissionistRow>(
            "SELECT id, name, commission_rate FROM commissionists WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        row.map(CommissionistRow::into_domain)
            .ok_or_else(|| RepositoryError::NotFound(format!("commissionist {id}")))
    }

    async fn update_vehicle_status(
        &self,
        vehicle_id: Uuid,
        status: VehicleStatus,
    ) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE vehicles SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(vehicle_id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("vehicle {vehicle_id}")));
        }
        Ok(())
    }

    async fn create_expense(&self, expense: &NewExpense) -> RepositoryResult<Expense> {
        let row = sqlx::query_as::<_, ExpenseRow>(
            r#"
            INSERT INTO expenses (id, amount, description, category, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&expense.amount)
        .bind(&expense.description)
        .bind(&expense.category)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(row.into_domain())
    }

    async fn clear_commissionist(&self, transaction_id: Uuid) -> RepositoryResult<()> {
        sqlx::query(
            "UPDATE transactions SET commissionist_id = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(transaction_id)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn next_transaction_number(&self, kind: TransactionKind) -> RepositoryResult<String> {
        let (seq,): (i64,) = sqlx::query_as("SELECT nextval('transaction_numbers')")
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        let prefix = match kind {
            TransactionKind::Sale => "SAL",
            TransactionKind::Purchase => "PUR",
        };
        Ok(format!("{prefix}-{seq:06}"))
    }
}

/// Postgres-backed audit trail. Rows go through their own statement so
/// a failure here cannot roll back the mutation that triggered it.
#[derive(Clone)]
pub struct PostgresAuditSink {
    pool: PgPool,
}

impl PostgresAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn log_action(&self, entry: AuditEntry) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, entity_kind, entity_id, action, description,
                before_state, after_state, actor_id, actor_email, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.entity_kind)
        .bind(entry.entity_id)
        .bind(entry.action)
        .bind(&entry.description)
        .bind(&entry.before)
        .bind(&entry.after)
        .bind(entry.actor_id)
        .bind(&entry.actor_email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AuditError(e.to_string()))?;
        Ok(())
    }
}

/// Internal row types for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    transaction_number: String,
    kind: String,
    status: String,
    vehicle_id: Uuid,
    customer_id: Uuid,
    commissionist_id: Option<Uuid>,
    total_amount: bigdecimal::BigDecimal,
    commission: bigdecimal::BigDecimal,
    payment_method: String,
    delivery_date: Option<chrono::NaiveDate>,
    notes: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let kind = TransactionKind::parse(&self.kind)
            .ok_or_else(|| RepositoryError::Database(format!("invalid kind {:?}", self.kind)))?;
        let status = TransactionStatus::parse(&self.status).ok_or_else(|| {
            RepositoryError::Database(format!("invalid status {:?}", self.status))
        })?;
        Ok(Transaction {
            id: self.id,
            transaction_number: self.transaction_number,
            kind,
            status,
            vehicle_id: self.vehicle_id,
            customer_id: self.customer_id,
            commissionist_id: self.commissionist_id,
            total_amount: self.total_amount,
            commission: self.commission,
            payment_method: self.payment_method,
            delivery_date: self.delivery_date,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommissionistRow {
    id: Uuid,
    name: String,
    commission_rate: bigdecimal::BigDecimal,
}

impl CommissionistRow {
    fn into_domain(self) -> Commissionist {
        Commissionist {
            id: self.id,
            name: self.name,
            commission_rate: self.commission_rate,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ExpenseRow {
    id: Uuid,
    amount: bigdecimal::BigDecimal,
    description: String,
    category: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl ExpenseRow {
    fn into_domain(self) -> Expense {
        Expense {
            id: self.id,
            amount: self.amount,
            description: self.description,
            category: self.category,
            created_at: self.created_at,
        }
    }
}
