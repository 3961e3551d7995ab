//! Engine error types.
//!
//! Only structural problems are errors. Empty denominators (no questions,
//! no answers) resolve to neutral values inside the aggregator instead.

use thiserror::Error;

/// Errors raised by the learning statistics engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LearningError {
    /// The topic forest is malformed (missing parent, cycle, depth or root
    /// mismatch, duplicate id, foreign discipline).
    #[error("invalid topology at topic '{topic_id}': {reason}")]
    InvalidTopology { topic_id: String, reason: String },

    /// A lookup was invoked without its required key.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// A topic id that does not belong to the discipline.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),
}

impl LearningError {
    pub(crate) fn topology(topic_id: impl Into<String>, reason: impl Into<String>) -> Self {
        LearningError::InvalidTopology {
            topic_id: topic_id.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error means the input snapshot is corrupt and
    /// must be rejected before the engine is invoked again.
    pub fn is_corrupt_input(&self) -> bool {
        matches!(self, LearningError::InvalidTopology { .. })
    }
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, LearningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_error_message() {
        let err = LearningError::topology("t1", "parent 'p9' not found");
        assert_eq!(
            err.to_string(),
            "invalid topology at topic 't1': parent 'p9' not found"
        );
        assert!(err.is_corrupt_input());
    }

    #[test]
    fn missing_argument_is_not_corrupt_input() {
        let err = LearningError::MissingArgument("topic_id");
        assert_eq!(err.to_string(), "missing argument: topic_id");
        assert!(!err.is_corrupt_input());
    }
}
