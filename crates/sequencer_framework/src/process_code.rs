//! The two-valued outcome of every component call.

use crate::error::ProcessError;

/// Outcome of a component call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessCode {
    /// The call did its work; the event continues.
    Success,
    /// The component asks to stop this event.
    Abort,
}

impl ProcessCode {
    /// Returns `true` for [`ProcessCode::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// What components return: a [`ProcessCode`], or an error that aborts the
/// event with a more specific cause.
pub type ProcessResult = Result<ProcessCode, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(ProcessCode::Success.is_success());
        assert!(!ProcessCode::Abort.is_success());
    }
}
