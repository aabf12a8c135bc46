//! Quota Ledger
//!
//! Per-owner critical sections around read-check-write of `QuotaState`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{KolibriError, Result};
use crate::record::QuotaState;
use crate::store::UserDirectory;

/// Gate for every byte charged to or refunded from an owner
///
/// ## Concurrency:
/// - `owner_locks`: one mutex per registered owner, created on first use
/// - Reserve/release for the same owner are serialized; different owners
///   never contend beyond the short map lookup
pub struct QuotaLedger {
    directory: Arc<dyn UserDirectory>,
    owner_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QuotaLedger {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            directory,
            owner_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Charge `bytes` to `owner_id` if they fit
    ///
    /// Returns the updated state, or `QuotaExceeded` with nothing changed.
    pub fn reserve(&self, owner_id: &str, bytes: u64) -> Result<QuotaState> {
        self.with_owner(owner_id, |account| account.reserve(bytes))
    }

    /// Refund `bytes` to `owner_id`, clamping `used` at zero
    pub fn release(&self, owner_id: &str, bytes: u64) -> Result<QuotaState> {
        self.with_owner(owner_id, |account| account.release(bytes))
    }

    /// Consistent read of an owner's quota
    pub fn quota(&self, owner_id: &str) -> Result<QuotaState> {
        self.with_owner(owner_id, |account| account.quota())
    }

    /// Run `f` while holding `owner_id`'s lock
    ///
    /// Used by callers that must keep other quota changes for the same
    /// owner out while they do related work (e.g. removing a blob and
    /// refunding it as one step). `f` must not call back into the ledger
    /// for the same owner.
    pub fn with_owner<T>(
        &self,
        owner_id: &str,
        f: impl FnOnce(&mut OwnerAccount<'_>) -> Result<T>,
    ) -> Result<T> {
        // Only registered owners get a lock entry
        self.directory.get_quota(owner_id)?;

        let lock = self.owner_lock(owner_id);
        let _guard = lock.lock();

        let mut account = OwnerAccount {
            owner_id,
            directory: self.directory.as_ref(),
        };
        f(&mut account)
    }

    /// Number of owners with a lock entry
    pub fn tracked_owners(&self) -> usize {
        self.owner_locks.lock().len()
    }

    fn owner_lock(&self, owner_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.owner_locks.lock();
        Arc::clone(
            locks
                .entry(owner_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

/// Quota operations for one owner, valid only inside [`QuotaLedger::with_owner`]
pub struct OwnerAccount<'a> {
    owner_id: &'a str,
    directory: &'a dyn UserDirectory,
}

impl OwnerAccount<'_> {
    pub fn owner_id(&self) -> &str {
        self.owner_id
    }

    pub fn quota(&self) -> Result<QuotaState> {
        self.directory.get_quota(self.owner_id)
    }

    pub fn reserve(&mut self, bytes: u64) -> Result<QuotaState> {
        let mut quota = self.directory.get_quota(self.owner_id)?;
        let available = quota.available();

        if bytes > available {
            debug!(owner = self.owner_id, available, required = bytes, "reservation rejected");
            return Err(KolibriError::QuotaExceeded {
                available,
                required: bytes,
            });
        }

        quota.used += bytes;
        self.directory.persist_quota(self.owner_id, quota)?;
        debug!(owner = self.owner_id, bytes, used = quota.used, "reserved");
        Ok(quota)
    }

    pub fn release(&mut self, bytes: u64) -> Result<QuotaState> {
        let mut quota = self.directory.get_quota(self.owner_id)?;

        if bytes > quota.used {
            warn!(
                owner = self.owner_id,
                used = quota.used,
                release = bytes,
                "release exceeds usage, clamping to zero"
            );
            quota.used = 0;
        } else {
            quota.used -= bytes;
        }

        self.directory.persist_quota(self.owner_id, quota)?;
        debug!(owner = self.owner_id, bytes, used = quota.used, "released");
        Ok(quota)
    }
}
