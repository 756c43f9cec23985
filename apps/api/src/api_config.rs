//! Environment-driven configuration, read once at process start.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use snapsweep_core::AppError;
use snapsweep_domain::{DEFAULT_RETENTION_DAYS, EmailAddress};
use tracing_subscriber::EnvFilter;

/// How the management-plane bearer token is acquired.
#[derive(Debug, Clone)]
pub enum CredentialProviderConfig {
    /// System-assigned managed identity via the instance metadata service.
    Imds,
    /// Pre-acquired token from the environment, for local runs.
    Static { token: String },
}

/// How the cleanup report is delivered.
#[derive(Debug, Clone)]
pub enum EmailProviderConfig {
    /// Log the report instead of sending it.
    Console,
    /// Communication-services email REST API.
    Acs {
        connection_string: String,
        from_address: EmailAddress,
    },
}

/// Settings shared by every cleanup trigger.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub arm_endpoint: String,
    pub retention_days: i64,
    pub report_to: EmailAddress,
    pub credential_provider: CredentialProviderConfig,
    pub email_provider: EmailProviderConfig,
}

impl CleanupConfig {
    pub fn load() -> Result<Self, AppError> {
        let arm_endpoint = env::var("ARM_ENDPOINT")
            .unwrap_or_else(|_| "https://management.azure.com".to_owned())
            .trim_end_matches('/')
            .to_owned();

        let retention_days = match env::var("CLEANUP_RETENTION_DAYS") {
            Ok(value) => value.parse::<i64>().map_err(|error| {
                AppError::Configuration(format!(
                    "invalid CLEANUP_RETENTION_DAYS value '{value}': {error}"
                ))
            })?,
            Err(_) => DEFAULT_RETENTION_DAYS,
        };

        let report_to = EmailAddress::new(required_env("REPORT_TO_ADDRESS")?)
            .map_err(|error| AppError::Configuration(format!("invalid REPORT_TO_ADDRESS: {error}")))?;

        let credential_provider = match env::var("CREDENTIAL_PROVIDER")
            .unwrap_or_else(|_| "imds".to_owned())
            .as_str()
        {
            "imds" => CredentialProviderConfig::Imds,
            "static" => CredentialProviderConfig::Static {
                token: required_non_empty_env("ARM_ACCESS_TOKEN")?,
            },
            other => {
                return Err(AppError::Configuration(format!(
                    "CREDENTIAL_PROVIDER must be either 'imds' or 'static', got '{other}'"
                )));
            }
        };

        let email_provider = match env::var("EMAIL_PROVIDER")
            .unwrap_or_else(|_| "console".to_owned())
            .as_str()
        {
            "console" => EmailProviderConfig::Console,
            "acs" => EmailProviderConfig::Acs {
                connection_string: required_non_empty_env("ACS_CONNECTION_STRING")?,
                from_address: EmailAddress::new(required_non_empty_env("REPORT_FROM_ADDRESS")?)
                    .map_err(|error| {
                        AppError::Configuration(format!("invalid REPORT_FROM_ADDRESS: {error}"))
                    })?,
            },
            other => {
                return Err(AppError::Configuration(format!(
                    "EMAIL_PROVIDER must be either 'console' or 'acs', got '{other}'"
                )));
            }
        };

        Ok(Self {
            arm_endpoint,
            retention_days,
            report_to,
            credential_provider,
            email_provider,
        })
    }
}

/// Configuration for the HTTP trigger process.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub cleanup: CleanupConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        Ok(Self {
            api_host,
            api_port,
            cleanup: CleanupConfig::load()?,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Configuration(format!("{name} must not be empty")));
    }
    Ok(value)
}
