//! Type-Safe Configuration with Validation
//!
//! Loads every setting from the environment (optionally seeded from a `.env`
//! file) and validates it once at startup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid port number
    #[error("Invalid port for {0}: must be between 1 and 65535")]
    InvalidPort(String),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError { name: String, reason: String },
}

/// Process operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Serve lookups until a shutdown signal arrives
    Server,
    /// Resolve `SEARCH` against a running server and exit
    Client,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "client" => Ok(Self::Client),
            other => Err(format!("unknown mode '{other}', expected server or client")),
        }
    }
}

/// Which RPC the caller mode uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    /// One `GetCodeByNumber` call per number
    Unary,
    /// One `StreamingGetCodeByNumber` call for the whole batch
    Streaming,
}

impl FromStr for CallType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unary" => Ok(Self::Unary),
            "streaming" => Ok(Self::Streaming),
            other => Err(format!("unknown call type '{other}', expected unary or streaming")),
        }
    }
}

/// Paths to PEM-encoded TLS material for one side of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    /// Certificate chain presented to the peer
    pub cert: PathBuf,
    /// Private key for `cert`
    pub key: PathBuf,
    /// Trusted issuer bundle used to verify the peer
    pub ca_cert: PathBuf,
}

/// Server-side settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port (1-65535)
    pub port: u16,
    /// Expected bearer token
    pub auth_token: String,
    /// Server identity and client trust root
    pub tls: TlsPaths,
    /// How long startup waits for the accept loop to fail
    pub startup_grace: Duration,
}

/// Caller-side settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Target host
    pub host: String,
    /// Target port (1-65535)
    pub port: u16,
    /// Bearer token attached to every call
    pub auth_token: String,
    /// Client identity and server trust root
    pub tls: TlsPaths,
    /// Name the server certificate must be issued for
    pub tls_domain: String,
}

impl ClientConfig {
    /// The `https://` endpoint of the target server.
    pub fn endpoint(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}

/// Service configuration with validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Operating mode
    pub mode: Mode,
    /// Server settings
    pub server: ServerConfig,
    /// Caller settings
    pub client: ClientConfig,
    /// CSV file loaded into the prefix table at startup
    pub data_file: PathBuf,
    /// Numbers to resolve in caller mode, comma-separated
    pub search: String,
    /// RPC used in caller mode
    pub call_type: CallType,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let auth_token = env::var("AUTH_TOKEN").unwrap_or_default();
        let ca_cert = parse_path_env("TLS_CA_CERT", "./data/x509/ca-cert.pem");

        let config = Self {
            mode: parse_env("MODE", Mode::Server)?,
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env("PORT", 50051)?,
                auth_token: auth_token.clone(),
                tls: TlsPaths {
                    cert: parse_path_env("TLS_SERVER_CERT", "./data/x509/server-cert.pem"),
                    key: parse_path_env("TLS_SERVER_KEY", "./data/x509/server-key.pem"),
                    ca_cert: ca_cert.clone(),
                },
                startup_grace: Duration::from_millis(parse_env("STARTUP_GRACE_MS", 1000)?),
            },
            client: ClientConfig {
                host: env::var("GRPC_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: parse_env("GRPC_PORT", 50051)?,
                auth_token,
                tls: TlsPaths {
                    cert: parse_path_env("TLS_CLIENT_CERT", "./data/x509/client-cert.pem"),
                    key: parse_path_env("TLS_CLIENT_KEY", "./data/x509/client-key.pem"),
                    ca_cert,
                },
                tls_domain: env::var("TLS_DOMAIN").unwrap_or_else(|_| "localhost".to_string()),
            },
            data_file: parse_path_env("DATA_FILE", "./data/test_data.csv"),
            search: env::var("SEARCH").unwrap_or_default(),
            call_type: parse_env("CALL_TYPE", CallType::Unary)?,
            shutdown_timeout_seconds: parse_env("SHUTDOWN_TIMEOUT", 30)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort("PORT".to_string()));
        }
        if self.client.port == 0 {
            return Err(ConfigError::InvalidPort("GRPC_PORT".to_string()));
        }
        if self.server.auth_token.is_empty() {
            return Err(ConfigError::MissingRequired("AUTH_TOKEN".to_string()));
        }
        if self.client.tls_domain.is_empty() {
            return Err(ConfigError::MissingRequired("TLS_DOMAIN".to_string()));
        }
        if self.shutdown_timeout_seconds == 0 {
            return Err(ConfigError::ParseError {
                name: "SHUTDOWN_TIMEOUT".to_string(),
                reason: "timeout must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

/// Parse an environment variable with a default value.
fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a filesystem path environment variable with a default value.
fn parse_path_env(name: &str, default: &str) -> PathBuf {
    PathBuf::from(env::var(name).unwrap_or_else(|_| default.to_string()))
}
