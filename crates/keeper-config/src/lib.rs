//! Configuration for the limit-keeper service.
//!
//! TOML configuration with `${VAR}` environment substitution, loaded once at
//! startup. The keeper identity and the AMM contract addresses configured
//! here are immutable for the lifetime of the engine.

use std::env;
use std::path::Path;

use alloy_primitives::Address;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("file not found: {0}")]
	FileNotFound(String),

	#[error("parse error: {0}")]
	ParseError(String),

	#[error("validation error: {0}")]
	ValidationError(String),

	#[error("environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("io error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KeeperConfig {
	pub engine: EngineSection,
	pub chain: ChainSection,
	#[serde(default)]
	pub service: ServiceSection,
}

/// Engine construction parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
	/// Principal allowed to trigger execution.
	pub keeper: Address,
	/// Seconds added to the current time as the swap deadline.
	#[serde(default = "default_deadline_margin")]
	pub deadline_margin_secs: u64,
}

/// On-chain backend parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSection {
	/// JSON-RPC endpoint URL.
	pub rpc_url: String,
	/// Private key of the engine's custody account.
	pub private_key: String,
	/// Periphery quoter contract address.
	pub quoter: Address,
	/// Swap router contract address.
	pub router: Address,
}

/// Keeper loop parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
	/// Interval between upkeep scans.
	#[serde(default = "default_poll_interval")]
	pub poll_interval_ms: u64,
}

impl Default for ServiceSection {
	fn default() -> Self {
		Self {
			poll_interval_ms: default_poll_interval(),
		}
	}
}

fn default_deadline_margin() -> u64 {
	60
}

fn default_poll_interval() -> u64 {
	5_000
}

/// Configuration loader with environment variable substitution.
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub async fn load(&self) -> Result<KeeperConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("no configuration file specified".to_string())
		})?;
		let config = self.load_from_file(file_path).await?;
		validate_config(&config)?;
		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<KeeperConfig, ConfigError> {
		let content = tokio::fs::read_to_string(file_path).await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				ConfigError::FileNotFound(file_path.to_string())
			} else {
				ConfigError::IoError(e)
			}
		})?;

		let substituted = substitute_env_vars(&content)?;

		toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))
	}
}

/// Replaces `${VAR_NAME}` patterns with the named environment variables.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
	let mut result = content.to_string();

	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];
		let value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
		result = result.replace(full_match, &value);
	}

	Ok(result)
}

fn validate_config(config: &KeeperConfig) -> Result<(), ConfigError> {
	if config.engine.keeper == Address::ZERO {
		return Err(ConfigError::ValidationError(
			"engine.keeper must not be the zero address".to_string(),
		));
	}
	if config.chain.rpc_url.is_empty() {
		return Err(ConfigError::ValidationError(
			"chain.rpc_url must not be empty".to_string(),
		));
	}
	if config.service.poll_interval_ms == 0 {
		return Err(ConfigError::ValidationError(
			"service.poll_interval_ms must be positive".to_string(),
		));
	}
	Ok(())
}
