use thiserror::Error;

/// Failures raised by the geocoding and forecast clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Transport failure or a non-success HTTP status.
    #[error("Network error: {0}")]
    Network(String),

    /// The geocoder answered, but with zero candidates.
    #[error("No results for '{0}'")]
    NoResults(String),

    /// The upstream body did not have the documented shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl LookupError {
    pub fn is_no_results(&self) -> bool {
        matches!(self, LookupError::NoResults(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_query_for_no_results() {
        let err = LookupError::NoResults("Xyzzyplonk".into());
        assert_eq!(err.to_string(), "No results for 'Xyzzyplonk'");
        assert!(err.is_no_results());
    }

    #[test]
    fn network_error_is_not_no_results() {
        let err = LookupError::Network("connection refused".into());
        assert!(!err.is_no_results());
        assert!(err.to_string().contains("connection refused"));
    }
}
