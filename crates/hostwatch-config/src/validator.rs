//! Configuration validation.

use url::Url;

use crate::error::ConfigError;
use crate::schema::Config;

/// Intervals shorter than this are accepted but flagged.
const MIN_RECOMMENDED_INTERVAL_SECS: u64 = 10;

/// Longest accepted payment lookback window (one day).
pub const MAX_LOOKBACK_SECS: u64 = 86_400;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Collapse the errors into a single fatal [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        if self.is_valid() {
            return Ok(self.warnings);
        }
        let details = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigError::Rejected(details))
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_telegram(config, &mut result);
        Self::validate_monitor(config, &mut result);
        Self::validate_services(config, &mut result);
        Self::validate_payments(config, &mut result);
        Self::validate_health(config, &mut result);

        Ok(result)
    }

    /// Parse a health base URL, requiring an http(s) scheme and a host.
    pub fn parse_base_url(raw: &str) -> Result<Url, String> {
        let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("unsupported scheme '{}'", url.scheme()));
        }
        if url.host_str().is_none() {
            return Err("missing host".to_string());
        }
        Ok(url)
    }

    fn validate_telegram(config: &Config, result: &mut ValidationResult) {
        if config.telegram.bot_token.trim().is_empty() {
            result.add_error(ValidationError::new(
                "telegram.bot_token",
                "Telegram bot token is not configured",
            ));
        }

        if config.telegram.chat_id.trim().is_empty() {
            result.add_error(ValidationError::new(
                "telegram.chat_id",
                "Telegram chat ID is not configured",
            ));
        }

        if Self::parse_base_url(&config.telegram.api_base).is_err() {
            result.add_error(ValidationError::new(
                "telegram.api_base",
                "api_base must be an http:// or https:// URL",
            ));
        }

        if config.telegram.request_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "telegram.request_timeout_secs",
                "request_timeout_secs must be greater than 0",
            ));
        }
    }

    fn validate_monitor(config: &Config, result: &mut ValidationResult) {
        if config.monitor.check_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "monitor.check_interval_secs",
                "check_interval_secs must be greater than 0",
            ));
        } else if config.monitor.check_interval_secs < MIN_RECOMMENDED_INTERVAL_SECS {
            result.add_warning(ValidationWarning::new(
                "monitor.check_interval_secs",
                format!(
                    "check_interval_secs is very low (<{}), probes may overlap the payment lookback window",
                    MIN_RECOMMENDED_INTERVAL_SECS
                ),
            ));
        }

        if config.monitor.command_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "monitor.command_timeout_secs",
                "command_timeout_secs must be greater than 0",
            ));
        }
    }

    fn validate_services(config: &Config, result: &mut ValidationResult) {
        if config.services.units.iter().any(|unit| unit.trim().is_empty()) {
            result.add_warning(ValidationWarning::new(
                "services.units",
                "Empty unit names are ignored",
            ));
        }

        if config.services.unique_units().len() < config.services.units.len() {
            result.add_warning(ValidationWarning::new(
                "services.units",
                "Duplicate unit names are watched once",
            ));
        }
    }

    fn validate_payments(config: &Config, result: &mut ValidationResult) {
        if !config.payments.enabled {
            return;
        }

        if config.payments.unit.trim().is_empty() {
            result.add_error(ValidationError::new(
                "payments.unit",
                "Payment log unit cannot be empty",
            ));
        }

        if config.payments.lookback_secs == 0 {
            result.add_error(ValidationError::new(
                "payments.lookback_secs",
                "lookback_secs must be greater than 0",
            ));
        } else if config.payments.lookback_secs > MAX_LOOKBACK_SECS {
            result.add_error(ValidationError::new(
                "payments.lookback_secs",
                format!("lookback_secs must be at most {}", MAX_LOOKBACK_SECS),
            ));
        }

        if let Err(e) = regex::Regex::new(&config.payments.pattern) {
            result.add_error(ValidationError::new(
                "payments.pattern",
                format!("Pattern does not compile: {}", e),
            ));
        }
    }

    fn validate_health(config: &Config, result: &mut ValidationResult) {
        if config.health.timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "health.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }

        match config.health.base_url() {
            None => {
                if config.health.api_key().is_some() {
                    result.add_warning(ValidationWarning::new(
                        "health.api_key",
                        "API key is set but base_url is not, health checks are disabled",
                    ));
                }
            }
            Some(raw) => {
                if let Err(reason) = Self::parse_base_url(raw) {
                    result.add_warning(ValidationWarning::new(
                        "health.base_url",
                        format!("Malformed base_url ({}), health checks are disabled", reason),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
