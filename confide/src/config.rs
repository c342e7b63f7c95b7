//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The configuration file path defaults to `config.yaml` but can
//! be specified via `-f` flag or the `CONFIDE_CONFIG` environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources
//! override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `CONFIDE_` override
//!    YAML values; use double underscores for nesting
//!    (e.g. `CONFIDE_AUTH__SESSION__COOKIE_NAME`)
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port`
//! - **Database**: `database.url`, `database.pool` - SQLite connection settings
//! - **Security**: `secret_key` - signs session cookies (required)
//! - **Authentication**: `auth.password`, `auth.session`, `auth.provider`

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "CONFIDE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have sensible defaults defined in the `Default` implementation,
/// except `secret_key`, which must be supplied.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Shortcut for `database.url`, settable as CONFIDE_DATABASE_URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Secret key for signing session cookies (required)
    pub secret_key: Option<String>,
    /// Authentication configuration
    pub auth: AuthConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection string (e.g. "sqlite:confide.db")
    pub url: String,
    /// Connection pool settings
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:confide.db".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

/// Connection pool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Password validation and hashing rules
    pub password: PasswordConfig,
    /// Session cookie configuration
    pub session: SessionConfig,
    /// Federated login provider
    pub provider: OAuthProviderConfig,
}

/// Password validation rules and Argon2 parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// Argon2 memory cost in KiB (default: 19456 KiB = 19 MB)
    pub argon2_memory_kib: u32,
    /// Argon2 iterations (default: 2)
    pub argon2_iterations: u32,
    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 64,
            // Secure defaults for production (Argon2id RFC recommendations)
            argon2_memory_kib: 19456, // 19 MB
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Session timeout duration
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Cookie name for the session token
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(24 * 60 * 60), // 24 hours
            cookie_name: "confide_session".to_string(),
            cookie_secure: true,
            // Lax so the cookie survives the provider's top-level redirect
            cookie_same_site: "lax".to_string(),
        }
    }
}

/// Federated login provider configuration.
///
/// Credentials should be set via environment variables:
/// `CONFIDE_AUTH__PROVIDER__CLIENT_ID` and
/// `CONFIDE_AUTH__PROVIDER__CLIENT_SECRET`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OAuthProviderConfig {
    /// Enable federated login
    pub enabled: bool,
    /// OAuth client id issued by the provider
    pub client_id: String,
    /// OAuth client secret issued by the provider
    pub client_secret: String,
    /// Provider authorization endpoint
    pub authorize_url: Url,
    /// Provider token endpoint
    pub token_url: Url,
    /// Provider profile (userinfo) endpoint
    pub profile_url: Url,
    /// Callback URL registered with the provider
    pub redirect_url: Url,
    /// Scopes requested during authorization
    pub scopes: Vec<String>,
    /// Timeout for requests to the provider
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for OAuthProviderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            client_id: String::new(),
            client_secret: String::new(),
            authorize_url: Url::parse("https://accounts.example.com/o/oauth2/auth").unwrap(),
            token_url: Url::parse("https://accounts.example.com/o/oauth2/token").unwrap(),
            profile_url: Url::parse("https://accounts.example.com/o/oauth2/userinfo").unwrap(),
            redirect_url: Url::parse("http://localhost:3000/auth/provider/callback").unwrap(),
            scopes: vec!["email".to_string(), "profile".to_string()],
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            database: DatabaseConfig::default(),
            secret_key: None,
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // DATABASE_URL (or CONFIDE_DATABASE_URL via figment) wins over the file
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        } else if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(figment::Error::from)?;
        Ok(config)
    }

    fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("CONFIDE_").split("__"))
    }

    /// Reject configurations that cannot possibly serve requests correctly.
    pub fn validate(&self) -> Result<(), String> {
        match self.secret_key.as_deref() {
            None | Some("") => return Err("secret_key is required (it signs session cookies)".to_string()),
            Some(_) => {}
        }
        if self.auth.provider.enabled && (self.auth.provider.client_id.is_empty() || self.auth.provider.client_secret.is_empty()) {
            return Err("auth.provider is enabled but client_id/client_secret are not set".to_string());
        }
        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_for(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_need_a_secret_key() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let config = Config {
            secret_key: Some("a-key".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_enabled_provider_needs_credentials() {
        let mut config = Config {
            secret_key: Some("a-key".to_string()),
            ..Config::default()
        };
        config.auth.provider.enabled = true;
        assert!(config.validate().is_err());

        config.auth.provider.client_id = "id".to_string();
        config.auth.provider.client_secret = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_with_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
                port: 8080
                secret_key: from-the-file
                auth:
                  session:
                    cookie_name: from_the_file
                    timeout: 2h
                "#,
            )?;
            jail.set_env("CONFIDE_PORT", "9090");
            jail.set_env("CONFIDE_AUTH__SESSION__COOKIE_NAME", "from_the_env");

            let config = Config::load(&args_for("config.yaml")).expect("config should load");
            assert_eq!(config.port, 9090);
            assert_eq!(config.secret_key.as_deref(), Some("from-the-file"));
            assert_eq!(config.auth.session.cookie_name, "from_the_env");
            assert_eq!(config.auth.session.timeout, Duration::from_secs(2 * 60 * 60));
            Ok(())
        });
    }

    #[test]
    fn test_database_url_env_wins() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "secret_key: k\ndatabase:\n  url: sqlite:file.db\n")?;
            jail.set_env("DATABASE_URL", "sqlite::memory:");

            let config = Config::load(&args_for("config.yaml")).expect("config should load");
            assert_eq!(config.database.url, "sqlite::memory:");
            Ok(())
        });
    }
}
