use thiserror::Error;

/// Main error type for the trip planner
#[derive(Error, Debug)]
pub enum TravelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Calendar authorization error: {0}")]
    Auth(String),

    #[error("Calendar API error: {0}")]
    Api(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TravelError>;

impl TravelError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TravelError::Generation(_) | TravelError::RateLimit { .. } | TravelError::Timeout(_)
        )
    }

    /// True for failures of the external text service, which are tolerated per section
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            TravelError::Generation(_) | TravelError::RateLimit { .. } | TravelError::Timeout(_)
        )
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            TravelError::Config(_) => "CONFIG_ERROR",
            TravelError::InvalidParameter(_) => "INVALID_PARAMETER",
            TravelError::Generation(_) => "GENERATION_ERROR",
            TravelError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            TravelError::Timeout(_) => "TIMEOUT_ERROR",
            TravelError::Auth(_) => "AUTH_ERROR",
            TravelError::Api(_) => "API_ERROR",
            TravelError::Export(_) => "EXPORT_ERROR",
            TravelError::Serialization(_) => "SERIALIZATION_ERROR",
            TravelError::Io(_) => "IO_ERROR",
        }
    }

    /// Short message suitable for showing to the person using the planner.
    ///
    /// Raw service payloads stay in the logs; only invalid-parameter and
    /// configuration messages are passed through because they describe user input.
    pub fn user_message(&self) -> String {
        match self {
            TravelError::Config(msg) => format!("Configuration problem: {}", msg),
            TravelError::InvalidParameter(msg) => msg.clone(),
            TravelError::Generation(_) => {
                "The travel model could not generate a response. Please try again.".to_string()
            }
            TravelError::RateLimit { retry_after } => format!(
                "The travel model is busy. Please try again in {} seconds.",
                retry_after
            ),
            TravelError::Timeout(_) => "The travel model took too long to respond.".to_string(),
            TravelError::Auth(_) => {
                "Calendar access is not authorized. Run the authorization flow again.".to_string()
            }
            TravelError::Api(_) => "The calendar service rejected the request.".to_string(),
            TravelError::Export(msg) => format!("Could not export the plan: {}", msg),
            TravelError::Serialization(_) => "Could not read the service response.".to_string(),
            TravelError::Io(err) => format!("File error: {}", err),
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        })
    }
}
