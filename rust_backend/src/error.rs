//! Error types for crescent visibility runs.

use crate::astro::ProviderError;

/// Result type for crescent visibility operations
pub type CrescentResult<T> = Result<T, CrescentError>;

/// Error type for crescent visibility operations
#[derive(Debug, thiserror::Error)]
pub enum CrescentError {
    /// Invalid run configuration, reported before any computation starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The astronomy provider could not answer a query.
    #[error("Provider query error: {0}")]
    ProviderQuery(String),

    /// A non-finite value reached derivation or model evaluation.
    #[error("Numeric fault: {field} is not finite ({value})")]
    NumericFault { field: &'static str, value: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProviderError> for CrescentError {
    fn from(e: ProviderError) -> Self {
        CrescentError::ProviderQuery(e.to_string())
    }
}

impl CrescentError {
    /// Shorthand for building a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        CrescentError::Configuration(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, CrescentError::Configuration(_))
    }
}

/// Reject non-finite values with a [`CrescentError::NumericFault`].
pub fn ensure_finite(field: &'static str, value: f64) -> CrescentResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CrescentError::NumericFault { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite_accepts_regular_values() {
        assert_eq!(ensure_finite("moon_altitude", -3.5).unwrap(), -3.5);
    }

    #[test]
    fn test_ensure_finite_rejects_nan_and_infinity() {
        let err = ensure_finite("separation", f64::NAN).unwrap_err();
        assert!(matches!(err, CrescentError::NumericFault { field: "separation", .. }));
        assert!(ensure_finite("separation", f64::INFINITY).is_err());
    }

    #[test]
    fn test_provider_error_maps_to_query_error() {
        let err: CrescentError = ProviderError::InvalidTime("bad".into()).into();
        assert!(matches!(err, CrescentError::ProviderQuery(_)));
        assert!(!err.is_configuration());
    }
}
