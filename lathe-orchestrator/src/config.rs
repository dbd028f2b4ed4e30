//! Orchestrator configuration
//!
//! Every parameter comes from the environment (a `.env` file is loaded
//! first when present). Only malformed values are errors; anything unset
//! falls back to its default.

use lathe_core::domain::permission::Capability;
use lathe_core::domain::user::{SealedToken, User};
use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// PostgreSQL connection string; `None` selects the in-memory store
    pub database_url: Option<String>,

    /// Base URL of the GitHub REST API
    pub scm_api_url: String,

    /// Timeout of a single SCM request
    pub scm_timeout: Duration,

    /// Badge redirect target with `{{status}}` and `{{color}}` placeholders
    pub badge_template: String,

    /// Header carrying the username authenticated upstream
    pub username_header: String,

    /// Scheme used when building absolute Location headers
    pub public_protocol: String,

    /// Base URI handed to new builds
    pub api_uri: String,

    /// Capability required to update a pipeline
    pub pipeline_update_capability: Capability,

    /// Users and SCM tokens provisioned into the store at startup
    pub users: Vec<User>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            scm_api_url: "https://api.github.com".to_string(),
            scm_timeout: Duration::from_secs(10),
            badge_template: "{{status}}/{{color}}".to_string(),
            username_header: "x-lathe-username".to_string(),
            public_protocol: "http".to_string(),
            api_uri: "http://localhost:8080".to_string(),
            pipeline_update_capability: Capability::Admin,
            users: Vec::new(),
        }
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Recognized variables:
    /// - ORCHESTRATOR_BIND_ADDR (default: 0.0.0.0:8080)
    /// - DATABASE_URL (optional)
    /// - SCM_API_URL (default: https://api.github.com)
    /// - SCM_TIMEOUT (seconds, default: 10)
    /// - BADGE_TEMPLATE (default: {{status}}/{{color}})
    /// - AUTH_USERNAME_HEADER (default: x-lathe-username)
    /// - PUBLIC_PROTOCOL (default: http)
    /// - API_URI (default: http://localhost:8080)
    /// - PIPELINE_UPDATE_CAPABILITY (push | admin, default: admin)
    /// - LATHE_USERS (optional, `name:token` pairs separated by commas)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let scm_timeout = match lookup("SCM_TIMEOUT") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| anyhow::anyhow!("SCM_TIMEOUT must be a number of seconds, got '{}'", raw))?,
            None => defaults.scm_timeout,
        };

        let pipeline_update_capability = match lookup("PIPELINE_UPDATE_CAPABILITY") {
            Some(raw) => match raw.parse::<Capability>() {
                Ok(capability @ (Capability::Push | Capability::Admin)) => capability,
                _ => anyhow::bail!("PIPELINE_UPDATE_CAPABILITY must be 'push' or 'admin', got '{}'", raw),
            },
            None => defaults.pipeline_update_capability,
        };

        let users = match lookup("LATHE_USERS") {
            Some(raw) => parse_users(&raw)?,
            None => defaults.users,
        };

        Ok(Self {
            bind_addr: lookup("ORCHESTRATOR_BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            scm_api_url: lookup("SCM_API_URL").unwrap_or(defaults.scm_api_url),
            scm_timeout,
            badge_template: lookup("BADGE_TEMPLATE").unwrap_or(defaults.badge_template),
            username_header: lookup("AUTH_USERNAME_HEADER")
                .map(|h| h.to_ascii_lowercase())
                .unwrap_or(defaults.username_header),
            public_protocol: lookup("PUBLIC_PROTOCOL").unwrap_or(defaults.public_protocol),
            api_uri: lookup("API_URI").unwrap_or(defaults.api_uri),
            pipeline_update_capability,
            users,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        for (name, url) in [("scm_api_url", &self.scm_api_url), ("api_uri", &self.api_uri)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.scm_timeout.is_zero() {
            anyhow::bail!("scm_timeout must be greater than 0");
        }

        // Rendered badges become a Location header
        if !self.badge_template.chars().all(|c| c.is_ascii_graphic()) {
            anyhow::bail!("badge_template must be printable ASCII without spaces");
        }

        if self.username_header.is_empty() {
            anyhow::bail!("username_header cannot be empty");
        }

        if !matches!(self.public_protocol.as_str(), "http" | "https") {
            anyhow::bail!("public_protocol must be http or https");
        }

        Ok(())
    }
}

/// Parse `name:token[,name:token...]`
fn parse_users(raw: &str) -> anyhow::Result<Vec<User>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((name, token)) if !name.trim().is_empty() && !token.trim().is_empty() => {
                Ok(User::new(name.trim(), SealedToken::new(token.trim())))
            }
            _ => anyhow::bail!("LATHE_USERS entries must look like name:token"),
        })
        .collect()
}
