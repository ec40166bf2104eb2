use thiserror::Error;

/// Errors surfaced by the dashboard data engine.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid noise factor {0}: must be between 0.0 and 1.0")]
    InvalidNoiseFactor(f64),

    #[error("Storage unavailable: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DashboardError {
    /// Machine-readable code carried in error envelopes.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::InvalidNoiseFactor(_) => "VALIDATION_ERROR",
            Self::MissingParameter(_) => "MISSING_PARAMETER",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Serialization(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status the error maps to at the request boundary.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingParameter(_) => 400,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            DashboardError::Validation("bad".to_string()).code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(DashboardError::InvalidNoiseFactor(1.5).code(), "VALIDATION_ERROR");
        assert_eq!(
            DashboardError::MissingParameter("timeRange".to_string()).code(),
            "MISSING_PARAMETER"
        );
        assert_eq!(
            DashboardError::Storage("disk full".to_string()).code(),
            "STORAGE_ERROR"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            DashboardError::MissingParameter("timeRange".to_string()).status_code(),
            400
        );
        assert_eq!(DashboardError::Validation("bad".to_string()).status_code(), 500);
        assert_eq!(DashboardError::Storage("gone".to_string()).status_code(), 500);
    }

    #[test]
    fn test_error_messages() {
        let err = DashboardError::MissingParameter("timeRange".to_string());
        assert_eq!(err.to_string(), "Missing required parameter: timeRange");

        let err = DashboardError::InvalidNoiseFactor(2.0);
        assert!(err.to_string().contains("must be between 0.0 and 1.0"));
    }
}
