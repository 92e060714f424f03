use serde::{Deserialize, Serialize};

use super::identity::AccountRef;

/// Result of a successful `connect()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResult {
    /// Always `true` on success; `connect()` fails otherwise.
    pub connected: bool,

    /// The authenticated user, when the credential maps to one.
    #[serde(default)]
    pub user: Option<AccountRef>,

    /// The owning organization.
    #[serde(default)]
    pub organization: Option<AccountRef>,
}
