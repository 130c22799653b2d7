//! Command line interface

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use crate::config::ServerConfig;
use crate::transport::{AppState, serve};

/// Command line arguments; each flag overrides the matching configuration key
#[derive(Parser, Debug)]
#[command(
    name = "mcpguard",
    version,
    about = "OAuth-protected MCP server over JSON-RPC/HTTP",
    long_about = "Serves MCP tools and prompts over JSON-RPC 2.0 on POST /mcp.\n\
                  Every request must carry an RS256 bearer token issued by the configured\n\
                  issuer; scopes in the token decide which tools and prompts are reachable.\n\n\
                  Settings come from (lowest to highest precedence): built-in defaults,\n\
                  the --config file, MCPGUARD_* environment variables, command line flags."
)]
pub struct Cli {
    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(long, short = 'c', env = "MCPGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:9000
    #[arg(long)]
    pub bind: Option<String>,

    /// Externally visible base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// PEM file with the issuer's RSA public key
    #[arg(long)]
    pub public_key: Option<PathBuf>,

    /// Expected token issuer
    #[arg(long)]
    pub issuer: Option<String>,

    /// Accepted token audience (repeatable)
    #[arg(long = "audience")]
    pub audiences: Vec<String>,

    /// Expected authorized party (azp claim)
    #[arg(long)]
    pub authorized_party: Option<String>,

    /// Log level or filter directive
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(bind) = &self.bind {
            config.bind_address.clone_from(bind);
        }
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(path) = &self.public_key {
            config.auth.public_key_path.clone_from(path);
        }
        if let Some(issuer) = &self.issuer {
            config.auth.issuer.clone_from(issuer);
        }
        if !self.audiences.is_empty() {
            config.auth.audiences.clone_from(&self.audiences);
        }
        if let Some(party) = &self.authorized_party {
            config.auth.authorized_party = Some(party.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if self.json_logs {
            config.logging.structured = true;
        }
    }
}

/// Parse arguments, load configuration and serve until shutdown
///
/// # Errors
///
/// Any startup failure: configuration, logging, key loading or binding.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        ServerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate()?;

    config
        .logging
        .init()
        .context("Failed to initialize logging")?;

    let state = AppState::from_config(&config)?;
    serve(Arc::new(state), &config.bind_address).await?;
    Ok(())
}
