//! Field-lock engine data.

use std::collections::HashSet;

use crate::models::slot::Slot;

/// Locked field/slot names on a movie. Stored as a single JSON column
/// (`locked_fields`) rather than one boolean column per field — the set is
/// small and open-ended (metadata fields plus every asset slot), and a JSON
/// set avoids a migration every time a new lockable field is added.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldLocks(pub HashSet<String>);

impl FieldLocks {
    pub fn is_locked(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn lock(&mut self, field: impl Into<String>) {
        self.0.insert(field.into());
    }

    /// Unlocking never rewrites the value, it only clears the flag.
    pub fn unlock(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn lock_slot(&mut self, slot: Slot) {
        self.lock(slot.as_str());
    }

    pub fn is_slot_locked(&self, slot: Slot) -> bool {
        self.is_locked(slot.as_str())
    }
}

/// Lock policy: callers consult this before mutating a locked field or slot.
pub trait LockPolicy {
    /// Returns `Ok(())` when the write may proceed, `Err(Conflict)` when the
    /// field is locked and no override was supplied.
    fn check(&self, locks: &FieldLocks, field: &str, force: bool) -> crate::error::Result<()>;
}

/// User writes always lock the field; automation writes must honour the
/// lock unless `force` is set.
pub struct StandardLockPolicy;

impl LockPolicy for StandardLockPolicy {
    fn check(&self, locks: &FieldLocks, field: &str, force: bool) -> crate::error::Result<()> {
        if locks.is_locked(field) && !force {
            return Err(crate::error::CuratorError::conflict(format!(
                "field '{field}' is locked"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_field_rejects_unforced_automation_write() {
        let mut locks = FieldLocks::default();
        locks.lock_slot(Slot::Poster);
        let policy = StandardLockPolicy;
        assert!(policy.check(&locks, "poster", false).is_err());
        assert!(policy.check(&locks, "poster", true).is_ok());
        assert!(policy.check(&locks, "fanart", false).is_ok());
    }

    #[test]
    fn unlock_does_not_rewrite_value_itself() {
        // Unlock is a pure flag operation: callers decide separately whether to
        // also reset the value.
        let mut locks = FieldLocks::default();
        locks.lock_slot(Slot::Poster);
        locks.unlock("poster");
        assert!(!locks.is_slot_locked(Slot::Poster));
    }
}
