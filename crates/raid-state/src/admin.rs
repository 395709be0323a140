//! # Admin Capability
//!
//! Administrative setters (pause, thresholds, fee withdrawal, admin
//! rotation) take an explicit [`AdminCapability`] instead of consulting an
//! ambient caller identity. The [`AdminRole`] remembers which capability is
//! current; rotating it invalidates every earlier one.

use thiserror::Error;
use uuid::Uuid;

/// Proof of administrative authority over one head state machine.
#[derive(Debug, PartialEq, Eq)]
pub struct AdminCapability {
    id: Uuid,
}

/// Admin failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    /// The capability is stale or belongs to another machine.
    #[error("capability does not hold the admin role")]
    NotAdmin,
}

/// Tracks the current admin capability.
#[derive(Debug, Clone)]
pub struct AdminRole {
    current: Uuid,
}

impl AdminRole {
    /// Create a role and its first capability.
    pub fn new() -> (Self, AdminCapability) {
        let id = Uuid::new_v4();
        (Self { current: id }, AdminCapability { id })
    }

    /// Check that `capability` is current.
    pub fn check(&self, capability: &AdminCapability) -> Result<(), AdminError> {
        if capability.id == self.current {
            Ok(())
        } else {
            Err(AdminError::NotAdmin)
        }
    }

    /// Replace the current capability. The old one stops working.
    pub fn rotate(&mut self, capability: &AdminCapability) -> Result<AdminCapability, AdminError> {
        self.check(capability)?;
        let id = Uuid::new_v4();
        self.current = id;
        Ok(AdminCapability { id })
    }
}
