//! Admin/viewer toggle behind a shared secret. This is a UI convenience
//! gate, not an access-control boundary: the secret is an embedded constant
//! compared in plaintext, and anyone inspecting the client or its storage
//! can bypass it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::storage::{Storage, KEY_IS_ADMIN};

const ADMIN_SECRET: &str = "cinelaunch-master";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Viewer,
    Admin,
}

pub struct RoleGate {
    storage: Arc<Storage>,
    admin: AtomicBool,
}

impl RoleGate {
    pub fn open(storage: Arc<Storage>) -> Self {
        let admin = storage.load::<bool>(KEY_IS_ADMIN).unwrap_or(false);
        RoleGate {
            storage,
            admin: AtomicBool::new(admin),
        }
    }

    pub fn role(&self) -> Role {
        if self.admin.load(Ordering::SeqCst) {
            Role::Admin
        } else {
            Role::Viewer
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    /// The correct secret toggles the persisted flag: Viewer becomes Admin,
    /// and re-entering the same secret flips Admin back to Viewer. A wrong
    /// secret leaves the state unchanged.
    pub fn verify(&self, secret: &str) -> Result<Role> {
        if secret != ADMIN_SECRET {
            return Err(Error::InvalidSecret);
        }
        let now_admin = !self.admin.fetch_xor(true, Ordering::SeqCst);
        if let Err(e) = self.storage.save(KEY_IS_ADMIN, &now_admin) {
            warn!(error = %e, "failed to persist admin flag");
        }
        info!(admin = now_admin, "role toggled");
        Ok(self.role())
    }

    /// Fails with `ReadOnly` unless the gate is unlocked; mutating
    /// operations call this before touching the collection.
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::ReadOnly)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> (tempfile::TempDir, RoleGate) {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::new(tmp.path().to_path_buf()).unwrap());
        (tmp, RoleGate::open(storage))
    }

    #[test]
    fn wrong_secret_is_rejected_and_state_unchanged() {
        let (_tmp, gate) = gate();
        assert!(matches!(gate.verify("guess"), Err(Error::InvalidSecret)));
        assert_eq!(gate.role(), Role::Viewer);
    }

    #[test]
    fn correct_secret_toggles_both_ways() {
        let (_tmp, gate) = gate();
        assert_eq!(gate.verify(ADMIN_SECRET).unwrap(), Role::Admin);
        assert_eq!(gate.verify(ADMIN_SECRET).unwrap(), Role::Viewer);
    }

    #[test]
    fn admin_flag_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::new(tmp.path().to_path_buf()).unwrap());

        let gate = RoleGate::open(storage.clone());
        gate.verify(ADMIN_SECRET).unwrap();

        let reopened = RoleGate::open(storage);
        assert_eq!(reopened.role(), Role::Admin);
    }
}
