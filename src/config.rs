//! Configuration for Agora
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Agora - conversation backend for persona agents
#[derive(Parser, Debug, Clone)]
#[command(name = "agora")]
#[command(about = "HTTP backend for persons, conversations and messages over MongoDB")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "agora")]
    pub mongodb_db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Base URL of the upstream model catalog (OpenAI-compatible listing)
    #[arg(long, env = "MODEL_CATALOG_URL", default_value = "https://api.openai.com/v1")]
    pub model_catalog_url: String,

    /// API key sent to the model catalog
    #[arg(long, env = "MODEL_CATALOG_API_KEY")]
    pub model_catalog_api_key: Option<String>,

    /// Access token for a bootstrap admin person, created at startup
    /// when no live admin exists yet
    #[arg(long, env = "BOOTSTRAP_ADMIN_TOKEN")]
    pub bootstrap_admin_token: Option<String>,
}

impl Args {
    /// Validate configuration before startup
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.mongodb_db.is_empty() {
            return Err("MONGODB_DB must not be empty".to_string());
        }

        if self.model_catalog_url.is_empty() {
            return Err("MODEL_CATALOG_URL must not be empty".to_string());
        }

        if let Some(token) = &self.bootstrap_admin_token {
            if token.len() < 16 {
                return Err("BOOTSTRAP_ADMIN_TOKEN must be at least 16 characters".to_string());
            }
        }

        Ok(())
    }

    /// Catalog base URL without a trailing slash
    pub fn catalog_base_url(&self) -> &str {
        self.model_catalog_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["agora"])
    }

    #[test]
    fn test_defaults_are_valid() {
        let args = base_args();
        assert!(args.validate().is_ok());
        assert_eq!(args.mongodb_db, "agora");
    }

    #[test]
    fn test_empty_db_rejected() {
        let mut args = base_args();
        args.mongodb_db = String::new();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_short_bootstrap_token_rejected() {
        let mut args = base_args();
        args.bootstrap_admin_token = Some("short".to_string());
        assert!(args.validate().is_err());

        args.bootstrap_admin_token = Some("long-enough-bootstrap-token".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_catalog_base_url_trims_slash() {
        let mut args = base_args();
        args.model_catalog_url = "https://api.openai.com/v1/".to_string();
        assert_eq!(args.catalog_base_url(), "https://api.openai.com/v1");
    }
}
