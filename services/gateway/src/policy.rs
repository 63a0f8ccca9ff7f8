//! Degradation policy for unavailable dependencies

/// What an edge component answers when its dependency cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Permit the request
    Open,
    /// Deny the request
    Closed,
}

impl FailurePolicy {
    /// Whether the request goes through under this policy
    pub const fn permits(self) -> bool {
        matches!(self, FailurePolicy::Open)
    }
}
