use thiserror::Error;

/// Unified error type for `devis` operations.
///
/// The pricing core itself never fails: degenerate inputs produce zero or
/// infinite figures. These variants only surface at the quoting boundary.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Raised when an operation needs an upstream choice that was never made.
    #[error("{component} must be selected before building the breakdown")]
    MissingSelection {
        /// Human-readable name of the missing selection.
        component: &'static str,
    },

    /// Raised when the selected solution id is not part of the batch.
    #[error("solution `{id}` is not part of the current estimate")]
    UnknownSolution { id: String },

    /// Raised when a configuration field holds NaN or an infinite value.
    #[error("configuration field `{field}` must be finite, found {value}")]
    InvalidConfiguration {
        /// Name of the offending field.
        field: String,
        /// The value that was supplied.
        value: f64,
    },
}

impl QuoteError {
    /// Helper for bubbling up missing selections from the quoting pipeline.
    pub fn missing_selection(component: &'static str) -> Self {
        Self::MissingSelection { component }
    }

    /// Helper to flag a non-finite configuration value.
    pub fn invalid_configuration(field: impl Into<String>, value: f64) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            value,
        }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, QuoteError>;
