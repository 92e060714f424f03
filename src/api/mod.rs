//! Resource call surface, one module per resource family.
//!
//! Every method follows the same shape: gate on session state, validate
//! inputs locally, then issue exactly one request through the executor.

pub mod analytics;
pub mod events;
pub mod integrations;
pub mod media;
pub mod notifications;
pub mod watchers;
pub mod webhooks;

use crate::error::{ArgusError, Result};

pub use watchers::WatchParams;

/// Append query parameters to a path. Empty values are skipped.
pub(crate) fn query_path(path: &str, params: &[(&str, Option<&str>)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in params {
        if let Some(value) = value {
            if !value.is_empty() {
                serializer.append_pair(key, value);
                any = true;
            }
        }
    }
    if any {
        format!("{}?{}", path, serializer.finish())
    } else {
        path.to_string()
    }
}

/// Validate a caller-supplied identifier before it is spliced into a path.
pub(crate) fn require_id(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(ArgusError::Validation(format!("{} must not be empty", what)))
    } else {
        Ok(())
    }
}
