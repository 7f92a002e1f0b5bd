//! Service configuration, loaded from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub gemini_api_key: String,
    /// When unset the service falls back to the beep-tone mock synthesizer.
    pub eleven_api_key: Option<String>,
    pub reply_model: String,
    pub static_dir: PathBuf,
    pub reply_timeout: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;

        let eleven_api_key = std::env::var("ELEVEN_API_KEY").ok();

        let reply_model = std::env::var("REPLY_MODEL")
            .unwrap_or_else(|_| resq_core::reply::DEFAULT_GEMINI_MODEL.to_string());

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./static"));

        let reply_timeout = match std::env::var("REPLY_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    ConfigError::InvalidValue(
                        "REPLY_TIMEOUT_SECS".to_string(),
                        format!("'{raw}' is not a number of seconds"),
                    )
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => resq_core::turn::DEFAULT_REPLY_TIMEOUT,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            gemini_api_key,
            eleven_api_key,
            reply_model,
            static_dir,
            reply_timeout,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("ELEVEN_API_KEY");
            env::remove_var("REPLY_MODEL");
            env::remove_var("STATIC_DIR");
            env::remove_var("REPLY_TIMEOUT_SECS");
            env::remove_var("RUST_LOG");
        }
    }

    #[test]
    #[serial]
    fn minimal_env_uses_defaults() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:5000");
        assert_eq!(config.gemini_api_key, "test-gemini-key");
        assert_eq!(config.eleven_api_key, None);
        assert_eq!(config.reply_model, "gemini-2.5-flash-lite");
        assert_eq!(config.static_dir, PathBuf::from("./static"));
        assert_eq!(config.reply_timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn custom_values_override_defaults() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("GEMINI_API_KEY", "custom-gemini-key");
            env::set_var("ELEVEN_API_KEY", "custom-eleven-key");
            env::set_var("REPLY_MODEL", "gemini-2.5-pro");
            env::set_var("STATIC_DIR", "/tmp/audio");
            env::set_var("REPLY_TIMEOUT_SECS", "5");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.eleven_api_key, Some("custom-eleven-key".to_string()));
        assert_eq!(config.reply_model, "gemini-2.5-pro");
        assert_eq!(config.static_dir, PathBuf::from("/tmp/audio"));
        assert_eq!(config.reply_timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn missing_gemini_key_is_an_error() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(var) => assert_eq!(var, "GEMINI_API_KEY"),
            _ => panic!("Expected MissingVar for GEMINI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn invalid_bind_address_is_an_error() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn invalid_timeout_is_an_error() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
            env::set_var("REPLY_TIMEOUT_SECS", "soon");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "REPLY_TIMEOUT_SECS"),
            _ => panic!("Expected InvalidValue for REPLY_TIMEOUT_SECS"),
        }
    }
}
