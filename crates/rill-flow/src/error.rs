#![forbid(unsafe_code)]

//! Error reasons delivered through `on_error`.
//!
//! Cancellation is not an error and has no variant here. Protocol violations
//! (a delivery after a terminal notification) are prevented by the sink and
//! never surface as values either.

use std::fmt;

/// Reason carried by an `on_error` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The data source reported a fault while producing.
    Producer(String),
    /// A user function inside an operator failed.
    Operator {
        operator: &'static str,
        message: String,
    },
}

impl FlowError {
    /// Fault reported by a source.
    #[must_use]
    pub fn producer(message: impl Into<String>) -> Self {
        Self::Producer(message.into())
    }

    /// Fault raised by an operator's user function.
    #[must_use]
    pub fn operator(operator: &'static str, message: impl Into<String>) -> Self {
        Self::Operator {
            operator,
            message: message.into(),
        }
    }

    /// Human-readable message without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Producer(msg) => msg,
            Self::Operator { message, .. } => message,
        }
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Producer(msg) => write!(f, "producer failed: {msg}"),
            Self::Operator { operator, message } => {
                write!(f, "operator '{operator}' failed: {message}")
            }
        }
    }
}

impl std::error::Error for FlowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_producer() {
        let err = FlowError::producer("disk gone");
        assert_eq!(err.to_string(), "producer failed: disk gone");
        assert_eq!(err.message(), "disk gone");
    }

    #[test]
    fn display_operator() {
        let err = FlowError::operator("try_map", "bad input");
        assert_eq!(err.to_string(), "operator 'try_map' failed: bad input");
        assert_eq!(err.message(), "bad input");
    }

    #[test]
    fn is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&FlowError::producer("x"));
    }
}
