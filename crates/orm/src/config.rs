//! Model configuration
//!
//! Settings shared by every model bound to a [`Context`](crate::Context):
//! hook naming, table prefixing, trash behaviour and the default page size.

use std::env;

/// Configuration error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

impl ConfigError {
    fn invalid(field: &str, value: impl ToString, expected: &str) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }
}

/// Model layer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Leading segment of every event hook name (`{prefix}/{object_type}/{event}`)
    pub hook_prefix: String,
    /// Prefix prepended to table names by the SQL builder
    pub table_prefix: String,
    /// Days trashed posts are kept; 0 disables the trash entirely
    pub empty_trash_days: u32,
    /// Default number of items per page
    pub per_page: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hook_prefix: "wp".to_string(),
            table_prefix: "wp_".to_string(),
            empty_trash_days: 30,
            per_page: 15,
        }
    }
}

impl ModelConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(prefix) = lookup("WP_MODEL_HOOK_PREFIX") {
            config.hook_prefix = prefix;
        }

        if let Some(prefix) = lookup("WP_TABLE_PREFIX") {
            config.table_prefix = prefix;
        }

        if let Some(days) = lookup("EMPTY_TRASH_DAYS") {
            config.empty_trash_days = days
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("empty_trash_days", &days, "a non-negative integer"))?;
        }

        if let Some(per_page) = lookup("WP_MODEL_PER_PAGE") {
            config.per_page = per_page
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("per_page", &per_page, "a positive integer"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hook_prefix.is_empty() {
            return Err(ConfigError::invalid("hook_prefix", "", "a non-empty string"));
        }

        if !self
            .table_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::invalid(
                "table_prefix",
                &self.table_prefix,
                "only ASCII letters, digits and underscores",
            ));
        }

        if self.per_page == 0 {
            return Err(ConfigError::invalid("per_page", 0, "a positive integer"));
        }

        Ok(())
    }

    /// Whether non-forced post deletes go to the trash
    pub fn trash_enabled(&self) -> bool {
        self.empty_trash_days > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.hook_prefix, "wp");
        assert_eq!(config.table_prefix, "wp_");
        assert_eq!(config.per_page, 15);
        assert!(config.trash_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ModelConfig::from_lookup(lookup(&[
            ("WP_TABLE_PREFIX", "wptests_"),
            ("EMPTY_TRASH_DAYS", "0"),
            ("WP_MODEL_PER_PAGE", "20"),
        ]))
        .unwrap();

        assert_eq!(config.table_prefix, "wptests_");
        assert!(!config.trash_enabled());
        assert_eq!(config.per_page, 20);
        assert_eq!(config.hook_prefix, "wp");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = ModelConfig::from_lookup(lookup(&[("EMPTY_TRASH_DAYS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "empty_trash_days"));

        let err = ModelConfig::from_lookup(lookup(&[("WP_TABLE_PREFIX", "wp-")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "table_prefix"));

        let err = ModelConfig::from_lookup(lookup(&[("WP_MODEL_PER_PAGE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "per_page"));
    }
}
