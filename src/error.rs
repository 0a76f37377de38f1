//! Error types for Crosscast

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrosscastError>;

#[derive(Error, Debug)]
pub enum CrosscastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failure classification for publish-time errors. Callers switch on the
/// variant: `Authentication` should deauthenticate the platform, `RateLimit`
/// should back off before any manual retry. Serializes as a tagged value so
/// persisted results keep the classification.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}

impl PlatformError {
    /// True when the caller should drop the platform's session.
    pub fn is_authentication(&self) -> bool {
        matches!(self, PlatformError::Authentication(_))
    }

    /// True when the caller should back off before trying again.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, PlatformError::RateLimit(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting_invalid_input() {
        let error = CrosscastError::InvalidInput("Content cannot be empty".to_string());
        let message = format!("{}", error);
        assert_eq!(message, "Invalid input: Content cannot be empty");
    }

    #[test]
    fn test_error_message_formatting_authentication() {
        let platform_error = PlatformError::Authentication("Token rejected".to_string());
        let error = CrosscastError::Platform(platform_error);
        let message = format!("{}", error);
        assert_eq!(message, "Platform error: Authentication failed: Token rejected");
    }

    #[test]
    fn test_error_message_formatting_posting() {
        let platform_error = PlatformError::Posting("Record creation rejected".to_string());
        let error = CrosscastError::Platform(platform_error);
        let message = format!("{}", error);
        assert_eq!(message, "Platform error: Posting failed: Record creation rejected");
    }

    #[test]
    fn test_error_message_formatting_config() {
        let config_error = ConfigError::Invalid("defaults.platforms is empty".to_string());
        let error = CrosscastError::Config(config_error);
        let message = format!("{}", error);
        assert_eq!(
            message,
            "Configuration error: Invalid configuration: defaults.platforms is empty"
        );
    }

    #[test]
    fn test_platform_error_variants() {
        let auth = PlatformError::Authentication("test auth".to_string());
        assert_eq!(format!("{}", auth), "Authentication failed: test auth");

        let validation = PlatformError::Validation("test validation".to_string());
        assert_eq!(
            format!("{}", validation),
            "Content validation failed: test validation"
        );

        let posting = PlatformError::Posting("test posting".to_string());
        assert_eq!(format!("{}", posting), "Posting failed: test posting");

        let network = PlatformError::Network("test network".to_string());
        assert_eq!(format!("{}", network), "Network error: test network");

        let rate_limit = PlatformError::RateLimit("test rate".to_string());
        assert_eq!(format!("{}", rate_limit), "Rate limit exceeded: test rate");
    }

    #[test]
    fn test_error_conversion_from_config_error() {
        let config_error = ConfigError::NotFound("/tmp/missing.toml".to_string());
        let crosscast_error: CrosscastError = config_error.into();

        match crosscast_error {
            CrosscastError::Config(_) => {
                // Success - correct conversion
            }
            _ => panic!("Expected CrosscastError::Config"),
        }
    }

    #[test]
    fn test_error_conversion_from_platform_error() {
        let platform_error = PlatformError::Posting("test".to_string());
        let crosscast_error: CrosscastError = platform_error.into();

        match crosscast_error {
            CrosscastError::Platform(_) => {
                // Success - correct conversion
            }
            _ => panic!("Expected CrosscastError::Platform"),
        }
    }

    #[test]
    fn test_platform_error_clone() {
        let original = PlatformError::Network("Connection failed".to_string());
        let cloned = original.clone();

        assert_eq!(format!("{}", original), format!("{}", cloned));
    }

    #[test]
    fn test_authentication_detection() {
        assert!(PlatformError::Authentication("expired".to_string()).is_authentication());
        assert!(!PlatformError::Posting("rejected".to_string()).is_authentication());
        assert!(!PlatformError::Network("refused".to_string()).is_authentication());
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(PlatformError::RateLimit("429".to_string()).is_rate_limit());
        assert!(!PlatformError::Validation("too long".to_string()).is_rate_limit());
    }

    #[test]
    fn test_platform_error_serializes_with_kind_tag() {
        let error = PlatformError::RateLimit("Too many requests".to_string());
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["kind"], "rate_limit");
        assert_eq!(json["message"], "Too many requests");
    }

    #[test]
    fn test_platform_error_round_trips_through_json() {
        let original = PlatformError::Authentication("Session expired".to_string());
        let json = serde_json::to_string(&original).unwrap();
        let restored: PlatformError = serde_json::from_str(&json).unwrap();

        assert_eq!(original, restored);
    }

    #[test]
    fn test_error_debug_output() {
        let error = CrosscastError::Platform(PlatformError::Posting("Failed to post".to_string()));

        let debug_output = format!("{:?}", error);
        assert!(debug_output.contains("Platform"));
        assert!(debug_output.contains("Posting"));
    }

    #[test]
    fn test_config_error_read_error_formatting() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let config_error = ConfigError::ReadError(io_error);
        let message = format!("{}", config_error);
        assert!(message.contains("Failed to read config file"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<String> {
            Ok("success".to_string())
        }

        fn returns_err() -> Result<String> {
            Err(CrosscastError::InvalidInput("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
