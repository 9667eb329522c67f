//! Request lifecycle states.

use std::fmt;

/// Lifecycle of a single scheduled request.
///
/// ```text
/// Unissued ──► Issued ──► Active ──► Received
///     │           │          │  └──► Failed
///     └───────────┴──────────┴─────► Cancelled
/// ```
///
/// `Received`, `Failed` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RequestState {
    /// Created but never submitted.
    #[default]
    Unissued,
    /// Submitted and waiting in the priority queue.
    Issued,
    /// Admitted; the transport future is in flight.
    Active,
    /// The transport future resolved successfully.
    Received,
    /// The transport future resolved with an error.
    Failed,
    /// Cancelled before the transport settled.
    Cancelled,
}

impl RequestState {
    /// Returns true for states a request never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Received | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unissued => "unissued",
            Self::Issued => "issued",
            Self::Active => "active",
            Self::Received => "received",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unissued() {
        assert_eq!(RequestState::default(), RequestState::Unissued);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!RequestState::Unissued.is_terminal());
        assert!(!RequestState::Issued.is_terminal());
        assert!(!RequestState::Active.is_terminal());
        assert!(RequestState::Received.is_terminal());
        assert!(RequestState::Failed.is_terminal());
        assert!(RequestState::Cancelled.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(RequestState::Active.to_string(), "active");
        assert_eq!(RequestState::Cancelled.to_string(), "cancelled");
    }
}
