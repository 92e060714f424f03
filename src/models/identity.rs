use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user or organization reference returned by credential validation.
///
/// The server may attach additional fields (name, plan, roles); they are
/// preserved in `extra` without being individually modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRef {
    /// Server-assigned identifier.
    pub id: String,

    /// Remaining fields from the server payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identity returned by `GET /auth/validate` and cached on the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Identity {
    /// The authenticated user, when the credential maps to one.
    #[serde(default)]
    pub user: Option<AccountRef>,

    /// The owning organization.
    #[serde(default)]
    pub organization: Option<AccountRef>,
}
