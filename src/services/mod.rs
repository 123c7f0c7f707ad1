pub mod lifecycle;
pub mod reference_guard;
pub mod vehicle_sync;

pub use lifecycle::TransactionLifecycleService;
