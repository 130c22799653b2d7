//! Server configuration management

use std::path::{Path, PathBuf};

use mcpguard_auth::OriginPolicy;
use mcpguard_auth::scope::{SCOPE_PROMPTS, SCOPE_READ, SCOPE_TOOLS};
use serde::{Deserialize, Serialize};

/// Prefix of environment variable overrides (`MCPGUARD_AUTH__ISSUER=...`)
pub const ENV_PREFIX: &str = "MCPGUARD";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_address: String,
    /// Externally visible base URL, used in metadata documents
    pub base_url: String,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
    /// Token validation settings
    pub auth: AuthSettings,
    /// Origin guard policy
    pub origin: OriginPolicy,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Token validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// PEM file holding the issuer's RSA public key
    pub public_key_path: PathBuf,
    /// Key id published in the JWK set
    pub key_id: String,
    /// Expected `iss` claim
    pub issuer: String,
    /// Accepted `aud` values
    pub audiences: Vec<String>,
    /// Expected `azp` claim, unchecked when unset
    pub authorized_party: Option<String>,
    /// Authorization server advertised in resource metadata; defaults to the base URL
    pub authorization_server: Option<String>,
    /// Issuer's authorization endpoint, omitted from metadata when unset
    pub authorization_endpoint: Option<String>,
    /// Issuer's token endpoint, omitted from metadata when unset
    pub token_endpoint: Option<String>,
    /// Scopes listed in discovery documents
    pub scopes_supported: Vec<String>,
    /// Clock skew tolerance for `exp`, in seconds
    pub leeway_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub structured: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9000".to_string(),
            base_url: "http://localhost:9000".to_string(),
            max_body_bytes: 1024 * 1024,
            auth: AuthSettings::default(),
            origin: OriginPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            public_key_path: PathBuf::from("public_key.pem"),
            key_id: "mcp-key-1".to_string(),
            issuer: "mcp-simple-auth".to_string(),
            audiences: vec!["mcp-server".to_string()],
            authorized_party: None,
            authorization_server: None,
            authorization_endpoint: None,
            token_endpoint: None,
            scopes_supported: vec![
                SCOPE_READ.to_string(),
                SCOPE_TOOLS.to_string(),
                SCOPE_PROMPTS.to_string(),
            ],
            leeway_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            structured: false,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// Semantically invalid configuration
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ServerConfig {
    /// Load configuration from a file (TOML, YAML, or JSON).
    ///
    /// Environment variables with the `MCPGUARD_` prefix override file
    /// settings; nested keys use `__`, e.g. `MCPGUARD_AUTH__ISSUER`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, has an unknown extension, or
    /// does not describe a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        use config::{File, FileFormat};

        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => return Err(ConfigError::UnsupportedFormat),
        };
        let path = path.to_str().ok_or(ConfigError::UnsupportedFormat)?;

        let config = config::Config::builder()
            .add_source(File::new(path, format))
            // Environment variables override file settings
            .add_source(environment())
            .build()?;
        Self::finish(config)
    }

    /// Load from an optional file, falling back to defaults plus environment
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_file`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let config = config::Config::builder()
                    .add_source(environment())
                    .build()?;
                Self::finish(config)
            }
        }
    }

    fn finish(config: config::Config) -> Result<Self, ConfigError> {
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.audiences.iter().all(|a| a.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "auth.audiences must contain at least one value".to_string(),
            ));
        }
        if self.auth.issuer.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.issuer must not be empty".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("max_body_bytes must be positive".to_string()));
        }
        Ok(())
    }
}

/// Keys whose environment values are comma-separated lists
const LIST_KEYS: [&str; 3] = [
    "auth.audiences",
    "auth.scopes_supported",
    "origin.allowed_origins",
];

fn environment() -> config::Environment {
    LIST_KEYS.into_iter().fold(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(","),
        config::Environment::with_list_parse_key,
    )
}
