//! Credit balances reported alongside finished jobs.

/// Remaining balances as last reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Credits {
    pub user: Option<f64>,
    pub workspace: Option<f64>,
}

/// Balances carried by one status response. Absent values leave the
/// corresponding counter untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CreditsUpdate {
    pub user: Option<f64>,
    pub workspace: Option<f64>,
}

impl CreditsUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.user.is_none() && self.workspace.is_none()
    }
}

impl Credits {
    /// Apply an update; returns whether any counter changed.
    pub fn apply(&mut self, update: CreditsUpdate) -> bool {
        let mut changed = false;
        if let Some(user) = update.user {
            self.user = Some(user);
            changed = true;
        }
        if let Some(workspace) = update.workspace {
            self.workspace = Some(workspace);
            changed = true;
        }
        changed
    }
}
