//! Error classification at the operation boundary.
//!
//! Raw failures from the external operation (HTTP rejections, transport
//! errors) are classified exactly once, when the operation resolves, into a
//! small fixed taxonomy. Presentation layers only ever see the
//! classification; raw details (bodies, stack traces) are never retained in
//! state.

use serde::{Deserialize, Serialize};

/// The classified cause of a failed operation.
///
/// This is the default error type for request stores. Stores that need a
/// richer taxonomy can substitute their own type and classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The operation failed with a not-found-style signal (HTTP 404)
    NotFound,

    /// Any other failure (network failure, server error, validation rejection)
    General,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::General => write!(f, "general error"),
        }
    }
}

/// Classify an HTTP-like status code.
///
/// Status 404 maps to [`ErrorKind::NotFound`]; every other status maps to
/// [`ErrorKind::General`].
///
/// # Example
///
/// ```
/// use reqsync_core::classify::{ErrorKind, classify_status};
///
/// assert_eq!(classify_status(404), ErrorKind::NotFound);
/// assert_eq!(classify_status(500), ErrorKind::General);
/// assert_eq!(classify_status(400), ErrorKind::General);
/// ```
#[must_use]
pub const fn classify_status(status: u16) -> ErrorKind {
    match status {
        404 => ErrorKind::NotFound,
        _ => ErrorKind::General,
    }
}

/// A raw failure that may carry an HTTP-like status code.
///
/// Implemented by the failure type of the external operation so the store
/// can classify rejections without understanding their shape. Failures with
/// no status (e.g. connection loss) classify as [`ErrorKind::General`].
pub trait StatusCoded {
    /// The status code carried by this failure, if any
    fn status(&self) -> Option<u16>;

    /// Classify this failure into the fixed taxonomy
    fn classify(&self) -> ErrorKind {
        match self.status() {
            Some(status) => classify_status(status),
            None => ErrorKind::General,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Failure(Option<u16>);

    impl StatusCoded for Failure {
        fn status(&self) -> Option<u16> {
            self.0
        }
    }

    #[test]
    fn not_found_only_for_404() {
        assert_eq!(Failure(Some(404)).classify(), ErrorKind::NotFound);
        assert_eq!(Failure(Some(500)).classify(), ErrorKind::General);
        assert_eq!(Failure(Some(403)).classify(), ErrorKind::General);
    }

    #[test]
    fn statusless_failures_are_general() {
        assert_eq!(Failure(None).classify(), ErrorKind::General);
    }

    proptest! {
        #[test]
        fn classification_is_deterministic(status in any::<u16>()) {
            let expected = if status == 404 {
                ErrorKind::NotFound
            } else {
                ErrorKind::General
            };
            prop_assert_eq!(classify_status(status), expected);
            prop_assert_eq!(classify_status(status), classify_status(status));
        }
    }
}
