#![forbid(unsafe_code)]

//! Error kinds for stream pipelines.
//!
//! Three kinds exist, matching where a failure can originate:
//!
//! - [`StreamError::Producer`]: an underlying source failed (a lost event
//!   source, a non-2xx or transport-level HTTP failure).
//! - [`StreamError::Operator`]: a user-supplied transform or predicate
//!   failed (see `Observable::try_map`).
//! - [`StreamError::Teardown`]: cleanup failed during cancellation.
//!
//! Producer and operator errors are terminal for their subscription and
//! propagate to the observer's `error` callback; `catch_error` is the sole
//! recovery mechanism. Teardown errors are never raised out of
//! `Subscription::unsubscribe`; they are reported via `tracing::warn!` and
//! sibling teardowns still run.

/// An error delivered on a stream's error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// An underlying source failed while producing values.
    Producer {
        /// Human-readable description of the source failure.
        message: String,
    },
    /// A user-supplied transform or predicate failed.
    Operator {
        /// Human-readable description of the operator failure.
        message: String,
    },
    /// A cleanup action failed during cancellation.
    Teardown {
        /// Human-readable description of the cleanup failure.
        message: String,
    },
}

impl StreamError {
    /// Build a producer error.
    #[must_use]
    pub fn producer(message: impl Into<String>) -> Self {
        Self::Producer {
            message: message.into(),
        }
    }

    /// Build an operator error.
    #[must_use]
    pub fn operator(message: impl Into<String>) -> Self {
        Self::Operator {
            message: message.into(),
        }
    }

    /// Build a teardown error.
    #[must_use]
    pub fn teardown(message: impl Into<String>) -> Self {
        Self::Teardown {
            message: message.into(),
        }
    }

    /// The error message without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Producer { message } | Self::Operator { message } | Self::Teardown { message } => {
                message
            }
        }
    }
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Producer { message } => write!(f, "producer error: {message}"),
            Self::Operator { message } => write!(f, "operator error: {message}"),
            Self::Teardown { message } => write!(f, "teardown error: {message}"),
        }
    }
}

impl std::error::Error for StreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        assert_eq!(
            StreamError::producer("socket closed").to_string(),
            "producer error: socket closed"
        );
        assert_eq!(
            StreamError::operator("bad key").to_string(),
            "operator error: bad key"
        );
        assert_eq!(
            StreamError::teardown("listener gone").to_string(),
            "teardown error: listener gone"
        );
    }

    #[test]
    fn message_strips_kind() {
        assert_eq!(StreamError::producer("x").message(), "x");
        assert_eq!(StreamError::teardown("y").message(), "y");
    }
}
