//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Validation is a pure function returning all errors, not just the first,
//! and runs before a config is accepted into the system.

use crate::config::schema::CustodianConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. "chains.ethereum.rpc_url".
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &CustodianConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.chains.is_empty() {
        errors.push(ValidationError {
            field: "chains".to_string(),
            message: "at least one chain must be configured".to_string(),
        });
    }

    for (name, chain) in &config.chains {
        if chain.rpc_url.parse::<url::Url>().is_err() {
            errors.push(ValidationError {
                field: format!("chains.{name}.rpc_url"),
                message: format!("'{}' is not a valid URL", chain.rpc_url),
            });
        }
        if chain.poll_interval_secs == 0 {
            errors.push(ValidationError {
                field: format!("chains.{name}.poll_interval_secs"),
                message: "poll interval must be non-zero".to_string(),
            });
        }
        if chain.rpc_timeout_secs == 0 {
            errors.push(ValidationError {
                field: format!("chains.{name}.rpc_timeout_secs"),
                message: "RPC timeout must be non-zero".to_string(),
            });
        }
    }

    if config.withdrawal.interval_secs == 0 {
        errors.push(ValidationError {
            field: "withdrawal.interval_secs".to_string(),
            message: "drain interval must be non-zero".to_string(),
        });
    }
    if config.withdrawal.batch_size == 0 {
        errors.push(ValidationError {
            field: "withdrawal.batch_size".to_string(),
            message: "batch size must be non-zero".to_string(),
        });
    }

    let key = config.custody.resolved_master_key();
    if key.is_empty() {
        errors.push(ValidationError {
            field: "custody.master_key".to_string(),
            message: "master key is required (config field or CUSTODIAN_MASTER_KEY)".to_string(),
        });
    } else if key.len() != 64 || hex::decode(&key).is_err() {
        errors.push(ValidationError {
            field: "custody.master_key".to_string(),
            message: "master key must be 32 bytes, hex encoded (64 hex chars)".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ChainConfig;

    fn valid_config() -> CustodianConfig {
        let mut config = CustodianConfig::default();
        config
            .chains
            .insert("ethereum".to_string(), ChainConfig::default());
        config.custody.master_key = "11".repeat(32);
        config
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn empty_chains_rejected() {
        let mut config = valid_config();
        config.chains.clear();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "chains"));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = valid_config();
        config.chains.get_mut("ethereum").unwrap().poll_interval_secs = 0;
        config.withdrawal.batch_size = 0;
        config.custody.master_key = "not-hex".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn short_master_key_rejected() {
        let mut config = valid_config();
        config.custody.master_key = "abcd".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "custody.master_key"));
    }
}
