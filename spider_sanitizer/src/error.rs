/// Errors surfaced by sanitization.
///
/// Malformed markup and content the policy rejects are not errors: they are
/// recovered or stripped and show up in the output and in
/// [`Sanitized::was_modified`](crate::sanitizer::Sanitized::was_modified).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The input is larger than the configured ceiling.
    #[error("input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge {
        /// Input size in bytes.
        size: usize,
        /// The configured ceiling.
        limit: usize,
    },
    /// The markup nests deeper than the configured ceiling.
    #[error("markup nesting exceeds the limit of {limit} elements")]
    DepthExceeded {
        /// The configured ceiling.
        limit: usize,
    },
    /// A row of a persisted policy table is malformed.
    #[error("invalid policy table at line {line}: {reason}")]
    InvalidPolicyTable {
        /// One based line number.
        line: usize,
        /// What is wrong with the row.
        reason: String,
    },
    /// A defect inside the sanitizer.
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}

impl Error {
    /// The error comes from a resource ceiling, the input was refused as a whole.
    pub fn is_resource_limit(&self) -> bool {
        matches!(
            self,
            Error::InputTooLarge { .. } | Error::DepthExceeded { .. }
        )
    }
}

/// Result alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
