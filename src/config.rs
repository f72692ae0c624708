use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};
use thiserror::Error;

use crate::tokenizer::token::DEFAULT_DIRECTIVE_PREFIX;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to open config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub compiler: CompilerConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Character introducing a directive line (`@clean`).
    #[serde(default = "default_directive_prefix")]
    pub directive_prefix: char,

    /// Maximum nesting of `@import` chains.
    #[serde(default = "default_max_import_depth")]
    pub max_import_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            directive_prefix: default_directive_prefix(),
            max_import_depth: default_max_import_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Message of a `required` violation when neither spec nor rule sets one.
    #[serde(default = "default_required_message")]
    pub required_message: String,

    /// Escape every String value in cleaned output, as `@escape` does.
    #[serde(default)]
    pub escape_all: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            required_message: default_required_message(),
            escape_all: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = self.compiler.directive_prefix;
        if prefix.is_alphanumeric() || prefix.is_whitespace() || matches!(prefix, '{' | '}' | '"' | '\'' | '/') {
            return Err(ConfigError::Invalid(format!(
                "directive prefix `{}` clashes with DSL syntax",
                prefix
            )));
        }
        if self.compiler.max_import_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_import_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config: Config = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}

pub fn from_str(s: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(s)?;
    config.validate()?;
    Ok(config)
}

fn default_directive_prefix() -> char {
    DEFAULT_DIRECTIVE_PREFIX
}
fn default_max_import_depth() -> usize {
    64
}
fn default_required_message() -> String {
    "A value is required".to_string()
}
