//! Transaction domain entities.
//! Framework-agnostic representation of dealership sales and purchases.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether the dealership is selling a vehicle or buying one in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Sale,
    Purchase,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "sale",
            TransactionKind::Purchase => "purchase",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sale" => Some(TransactionKind::Sale),
            "purchase" => Some(TransactionKind::Purchase),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "cancelled" => Some(TransactionStatus::Cancelled),
            _ => None,
        }
    }

    /// Allowed transitions: pending -> completed, pending -> cancelled,
    /// completed -> cancelled. Cancelled is terminal.
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Pending, Completed)
                | (Pending, Cancelled)
                | (Completed, Completed)
                | (Completed, Cancelled)
                | (Cancelled, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    Reserved,
    Sold,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Reserved => "reserved",
            VehicleStatus::Sold => "sold",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(VehicleStatus::Available),
            "reserved" => Some(VehicleStatus::Reserved),
            "sold" => Some(VehicleStatus::Sold),
            _ => None,
        }
    }
}

/// Domain entity representing a dealership transaction.
///
/// Transactions are never physically deleted; cancellation is a status
/// transition and the row stays in place for the audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    /// Human-readable number, assigned once at creation and immutable.
    pub transaction_number: String,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub vehicle_id: Uuid,
    /// Buyer for a sale, seller of the vehicle for a purchase.
    pub customer_id: Uuid,
    /// Weak reference: the commissionist row may have been deleted since.
    pub commissionist_id: Option<Uuid>,
    pub total_amount: BigDecimal,
    pub commission: BigDecimal,
    pub payment_method: String,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transaction_number: String,
        kind: TransactionKind,
        status: TransactionStatus,
        vehicle_id: Uuid,
        customer_id: Uuid,
        commissionist_id: Option<Uuid>,
        total_amount: BigDecimal,
        commission: BigDecimal,
        payment_method: String,
        delivery_date: Option<NaiveDate>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            transaction_number,
            kind,
            status,
            vehicle_id,
            customer_id,
            commissionist_id,
            total_amount,
            commission,
            payment_method,
            delivery_date,
            notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An agent entitled to a percentage-based commission on a sale.
#[derive(Debug, Clone, Serialize)]
pub struct Commissionist {
    pub id: Uuid,
    pub name: String,
    /// Percentage, 0-100.
    pub commission_rate: BigDecimal,
}

/// A recorded cash outflow: vehicle purchases and sale reversals.
#[derive(Debug, Clone, Serialize)]
pub struct Expense {
    pub id: Uuid,
    pub amount: BigDecimal,
    pub description: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: BigDecimal,
    pub description: String,
    pub category: String,
}
