use serde::{Deserialize, Serialize};

/// Last observed rate-limit metadata from response headers.
///
/// Purely advisory: the client never enforces limits locally, and the
/// snapshot may be stale. Fields missing from a response are left unchanged
/// rather than zeroed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    /// Requests allowed per window.
    pub limit: Option<u64>,

    /// Requests remaining in the current window.
    pub remaining: Option<u64>,

    /// Unix timestamp when the window resets.
    pub reset: Option<u64>,
}

impl RateLimitSnapshot {
    /// Merge newly observed values, keeping previous ones where absent.
    pub fn merge(&mut self, limit: Option<u64>, remaining: Option<u64>, reset: Option<u64>) {
        if limit.is_some() {
            self.limit = limit;
        }
        if remaining.is_some() {
            self.remaining = remaining;
        }
        if reset.is_some() {
            self.reset = reset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_previous_values() {
        let mut snapshot = RateLimitSnapshot::default();
        snapshot.merge(Some(100), Some(99), Some(1_700_000_000));
        snapshot.merge(None, Some(98), None);
        assert_eq!(snapshot.limit, Some(100));
        assert_eq!(snapshot.remaining, Some(98));
        assert_eq!(snapshot.reset, Some(1_700_000_000));
    }
}
