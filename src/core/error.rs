//! Engine error taxonomy.
//!
//! Every fallible engine operation returns [`Result`]. The variants mirror the
//! ways an instruction can fail: a count bound, a requirement, a dependency, an
//! illegal narrowing, and so on. `Abort` is a control signal that asks an
//! atomic block to roll back silently.

/// Errors raised by the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A count bound would be exceeded, or a mandatory amount cannot be met.
    #[error("limits: {0}")]
    Limits(String),

    /// A mandatory requirement does not hold.
    #[error("requirement not met: {0}")]
    Requirement(String),

    /// A proposed instruction does not narrow the current one.
    #[error("invalid narrowing: {0}")]
    Narrowing(String),

    /// A referenced component is missing, or something still depends on it.
    #[error("dependency: {0}")]
    Dependency(String),

    /// A commit cannot make progress (cascade too deep, dependents stuck).
    #[error("dead end: {0}")]
    DeadEnd(String),

    /// A concrete instruction was required.
    #[error("abstract: {0}")]
    Abstract(String),

    /// The task queue refused the operation.
    #[error("task: {0}")]
    Task(String),

    /// The session's access tier does not allow the operation.
    #[error("access denied: {0}")]
    Access(String),

    /// A custom instruction could not be translated.
    #[error("custom instruction: {0}")]
    Custom(String),

    /// A type expression is malformed or unknown.
    #[error("type: {0}")]
    Type(String),

    /// Abandon the enclosing atomic block without an error.
    #[error("operation aborted")]
    Abort,
}

impl EngineError {
    /// Failures that only mean "not possible right now".
    ///
    /// An `Or` branch failing this way is dropped during preparation instead
    /// of failing the whole instruction.
    #[must_use]
    pub fn is_not_now(&self) -> bool {
        matches!(
            self,
            EngineError::Limits(_) | EngineError::Requirement(_) | EngineError::Dependency(_)
        )
    }

    /// Same kind of error with `context` prepended to the message.
    #[must_use]
    pub fn context(self, context: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Limits(m) => EngineError::Limits(format!("{context}: {m}")),
            EngineError::Requirement(m) => EngineError::Requirement(format!("{context}: {m}")),
            EngineError::Narrowing(m) => EngineError::Narrowing(format!("{context}: {m}")),
            EngineError::Dependency(m) => EngineError::Dependency(format!("{context}: {m}")),
            EngineError::DeadEnd(m) => EngineError::DeadEnd(format!("{context}: {m}")),
            EngineError::Abstract(m) => EngineError::Abstract(format!("{context}: {m}")),
            EngineError::Task(m) => EngineError::Task(format!("{context}: {m}")),
            EngineError::Access(m) => EngineError::Access(format!("{context}: {m}")),
            EngineError::Custom(m) => EngineError::Custom(format!("{context}: {m}")),
            EngineError::Type(m) => EngineError::Type(format!("{context}: {m}")),
            EngineError::Abort => EngineError::Abort,
        }
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_now_classification() {
        assert!(EngineError::Limits("x".into()).is_not_now());
        assert!(EngineError::Requirement("x".into()).is_not_now());
        assert!(EngineError::Dependency("x".into()).is_not_now());
        assert!(!EngineError::DeadEnd("x".into()).is_not_now());
        assert!(!EngineError::Abstract("x".into()).is_not_now());
        assert!(!EngineError::Abort.is_not_now());
    }

    #[test]
    fn test_context_keeps_kind() {
        let err = EngineError::Limits("max possible is 2".into()).context("gain 3 Plant");
        assert_eq!(err, EngineError::Limits("gain 3 Plant: max possible is 2".into()));
        assert_eq!(err.to_string(), "limits: gain 3 Plant: max possible is 2");
        assert_eq!(EngineError::Abort.context("ignored"), EngineError::Abort);
    }
}
