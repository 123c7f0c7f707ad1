//! Vehicle availability synchronization.
//!
//! A sale that completes takes the vehicle off the lot; a sale that is
//! cancelled puts it back. The sync runs after the transaction write
//! has committed and its failure is logged, never propagated: a vehicle
//! left transiently inconsistent is an accepted condition that a later
//! reconciliation pass corrects.

use tracing::error;

use crate::domain::{Transaction, TransactionKind, TransactionStatus, VehicleStatus};
use crate::ports::DealershipStore;

pub struct VehicleStatusSynchronizer<'a> {
    store: &'a dyn DealershipStore,
}

impl<'a> VehicleStatusSynchronizer<'a> {
    pub fn new(store: &'a dyn DealershipStore) -> Self {
        Self { store }
    }

    pub async fn sync(&self, tx: &Transaction) {
        if tx.kind != TransactionKind::Sale {
            return;
        }
        let target = match tx.status {
            TransactionStatus::Completed => VehicleStatus::Sold,
            TransactionStatus::Cancelled => VehicleStatus::Available,
            TransactionStatus::Pending => return,
        };
        if let Err(err) = self.store.update_vehicle_status(tx.vehicle_id, target).await {
            error!(
                transaction_id = %tx.id,
                vehicle_id = %tx.vehicle_id,
                target = target.as_str(),
                error = %err,
                "vehicle status sync failed, vehicle left inconsistent"
            );
        }
    }
}
