//! Authorizer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use authorizer_core::{ArityPolicy, MAX_ARITY};
use authorizer_perms::ChangeProcessor;

use crate::error::{AuthError, Result};

/// Configuration for the Authorizer.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use authorizer::{ArityPolicy, AuthorizerConfig};
///
/// let config = AuthorizerConfig::from_json(r#"{ "arity_policy": "exact" }"#).unwrap();
/// assert_eq!(config.arity_policy, ArityPolicy::Exact);
/// assert!(config.validate_conditions);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorizerConfig {
    /// How argument counts must relate to condition counts.
    pub arity_policy: ArityPolicy,
    /// Whether grants are checked against their operation's parameters.
    pub validate_conditions: bool,
    /// Largest condition list a grant may carry.
    pub max_conditions: usize,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            arity_policy: ArityPolicy::default(),
            validate_conditions: true,
            max_conditions: MAX_ARITY,
        }
    }
}

impl AuthorizerConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AuthError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), ?config, "loaded authorizer config");
        Ok(config)
    }

    /// Check the values are usable.
    ///
    /// A condition list longer than the largest packing arity could never be
    /// satisfied.
    pub fn validate(&self) -> Result<()> {
        if self.max_conditions == 0 || self.max_conditions > MAX_ARITY {
            return Err(AuthError::Config(format!(
                "max_conditions must be between 1 and {MAX_ARITY}, got {}",
                self.max_conditions
            )));
        }
        Ok(())
    }

    /// The change processor this configuration describes.
    pub fn processor(&self) -> ChangeProcessor {
        ChangeProcessor::new(self.validate_conditions, self.max_conditions)
    }
}
