//! Commissionist reference validation and repair.
//!
//! `commissionist_id` is a weak reference: the commissionist row may
//! have been deleted after transactions pointed at it. A dangling
//! reference is a cosmetic defect and must never fail a financially
//! meaningful write, so lookups degrade to "no commissionist" and
//! stored dangling values are proactively nulled before an update.

use tracing::warn;
use uuid::Uuid;

use crate::domain::{Commissionist, Transaction};
use crate::ports::{DealershipStore, RepositoryError, RepositoryResult};

/// Normalize a raw commissionist reference from a request payload.
/// Empty strings and the literal sentinels `"null"` / `"undefined"`
/// that sloppy clients send all mean "no commissionist".
pub fn normalize_reference(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty()
        || value.eq_ignore_ascii_case("null")
        || value.eq_ignore_ascii_case("undefined")
    {
        return None;
    }
    Some(value.to_string())
}

pub struct ReferenceGuard<'a> {
    store: &'a dyn DealershipStore,
}

impl<'a> ReferenceGuard<'a> {
    pub fn new(store: &'a dyn DealershipStore) -> Self {
        Self { store }
    }

    /// Normalize and resolve an inbound reference. Anything that does
    /// not resolve to an existing commissionist is treated as absent.
    pub async fn resolve(&self, raw: Option<&str>) -> Option<Commissionist> {
        let candidate = normalize_reference(raw)?;
        let id = match Uuid::parse_str(&candidate) {
            Ok(id) => id,
            Err(_) => {
                warn!(reference = %candidate, "malformed commissionist reference, treating as absent");
                return None;
            }
        };
        match self.store.find_commissionist(id).await {
            Ok(commissionist) => Some(commissionist),
            Err(RepositoryError::NotFound(_)) => {
                warn!(commissionist_id = %id, "commissionist does not exist, treating as absent");
                None
            }
            Err(err) => {
                warn!(commissionist_id = %id, error = %err, "commissionist lookup failed, treating as absent");
                None
            }
        }
    }

    /// Resolve an already-stored reference, degrading to `None` when it
    /// no longer points at a live commissionist.
    pub async fn resolve_stored(&self, id: Option<Uuid>) -> Option<Commissionist> {
        let id = id?;
        self.resolve(Some(&id.to_string())).await
    }

    /// Null out a stored commissionist reference that no longer
    /// resolves, before the main update runs. Returns whether a repair
    /// was applied.
    pub async fn repair_stored(&self, tx: &Transaction) -> RepositoryResult<bool> {
        let Some(id) = tx.commissionist_id else {
            return Ok(false);
        };
        match self.store.find_commissionist(id).await {
            Ok(_) => Ok(false),
            Err(RepositoryError::NotFound(_)) => {
                warn!(
                    transaction_id = %tx.id,
                    commissionist_id = %id,
                    "clearing dangling commissionist reference"
                );
                self.store.clear_commissionist(tx.id).await?;
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_normalize_to_none() {
        assert_eq!(normalize_reference(None), None);
        assert_eq!(normalize_reference(Some("")), None);
        assert_eq!(normalize_reference(Some("   ")), None);
        assert_eq!(normalize_reference(Some("null")), None);
        assert_eq!(normalize_reference(Some("NULL")), None);
        assert_eq!(normalize_reference(Some("undefined")), None);
    }

    #[test]
    fn real_values_pass_through_trimmed() {
        assert_eq!(
            normalize_reference(Some(" 0a0b0c0d-1111-2222-3333-444455556666 ")),
            Some("0a0b0c0d-1111-2222-3333-444455556666".to_string())
        );
    }
}
