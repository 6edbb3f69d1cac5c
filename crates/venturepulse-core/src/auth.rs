//! Authorization policy for source-management and refresh operations.

use std::collections::HashSet;

/// Decides which users hold refresh/source-management authority.
///
/// Built once at startup from the configured admin email list and injected
/// into whatever needs to make the decision; nothing downstream reads the
/// environment directly.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    admin_emails: HashSet<String>,
}

impl AdminPolicy {
    #[must_use]
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admin_emails: emails
                .into_iter()
                .map(|e| e.into().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// True if the given email holds admin authority. Case-insensitive.
    #[must_use]
    pub fn is_admin(&self, email: &str) -> bool {
        self.admin_emails.contains(&email.trim().to_lowercase())
    }
}
