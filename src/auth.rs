//! Identity of the user performing a write.
//!
//! Authentication happens upstream; this crate only needs to know who is
//! acting and whether they carry superuser privileges.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated user on whose behalf a write runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub is_superuser: bool,
}

impl Actor {
    pub fn new(id: Uuid, is_superuser: bool) -> Self {
        Self { id, is_superuser }
    }

    /// A regular, unprivileged user.
    pub fn user(id: Uuid) -> Self {
        Self::new(id, false)
    }

    pub fn superuser(id: Uuid) -> Self {
        Self::new(id, true)
    }

    /// Check if the actor may modify a record created by `owner`
    pub fn can_modify(&self, owner: Uuid) -> bool {
        self.is_superuser || self.id == owner
    }
}
