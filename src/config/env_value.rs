// ABOUTME: Credential values given literally or read from environment variables.
// ABOUTME: Keeps secrets out of the config file while allowing a default.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;

/// A config value that may come from the environment.
///
/// ```yaml
/// username: deployer                 # literal
/// password: { env: STAGING_PASSWORD } # from the environment
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default.clone().ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }
}

// Literal values are usually credentials; never print them.
impl fmt::Debug for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(_) => f.write_str("Literal(<redacted>)"),
            EnvValue::FromEnv { var, .. } => f.debug_struct("FromEnv").field("var", var).finish(),
        }
    }
}
