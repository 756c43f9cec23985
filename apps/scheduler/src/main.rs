//! Snapsweep scheduled trigger runtime. Fires one cleanup run per day at a
//! fixed UTC wall-clock time.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use snapsweep_application::{
    AccessToken, CleanupService, EmailService, ResourceManagerApi, TokenCredential,
};
use snapsweep_core::{AppError, AppResult};
use snapsweep_domain::{DEFAULT_RETENTION_DAYS, EmailAddress, RetentionPolicy};
use snapsweep_infrastructure::{
    AcsEmailConfig, AcsEmailService, AzureResourceClient, ConsoleEmailService, ImdsTokenCredential,
    StaticTokenCredential,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
enum CredentialProviderConfig {
    Imds,
    Static { token: String },
}

#[derive(Debug, Clone)]
enum EmailProviderConfig {
    Console,
    Acs {
        connection_string: String,
        from_address: EmailAddress,
    },
}

#[derive(Debug, Clone)]
struct SchedulerConfig {
    run_at: NaiveTime,
    run_on_start: bool,
    arm_endpoint: String,
    retention_days: i64,
    report_to: EmailAddress,
    credential_provider: CredentialProviderConfig,
    email_provider: EmailProviderConfig,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = SchedulerConfig::load()?;
    let cleanup_service = build_cleanup_service(&config)?;

    info!(
        run_at = %config.run_at,
        run_on_start = config.run_on_start,
        "snapsweep-scheduler started"
    );

    if config.run_on_start {
        execute_run(&cleanup_service).await;
    }

    loop {
        let delay = until_next_run(Utc::now(), config.run_at);
        info!(sleep_seconds = delay.as_secs(), "sleeping until next scheduled run");
        tokio::time::sleep(delay).await;
        execute_run(&cleanup_service).await;
    }
}

/// Runs one sweep. A failed run is logged and the schedule continues; the
/// next day's run re-derives the snapshot universe from the live API.
async fn execute_run(cleanup_service: &CleanupService) {
    match cleanup_service.run().await {
        Ok(outcome) => info!(
            run_id = %outcome.run_id,
            scanned_subscriptions = outcome.scanned_subscriptions,
            scanned_snapshots = outcome.scanned_snapshots,
            deleted = outcome.deleted.len(),
            failed_deletions = outcome.failed_deletions,
            "scheduled cleanup run finished"
        ),
        Err(error) => warn!(error = %error, "scheduled cleanup run failed"),
    }
}

/// Time to sleep from `now` until the next occurrence of `run_at` (UTC).
fn until_next_run(now: DateTime<Utc>, run_at: NaiveTime) -> Duration {
    let today = now.date_naive().and_time(run_at).and_utc();
    let next = if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    };

    (next - now).to_std().unwrap_or(Duration::ZERO)
}

fn build_cleanup_service(config: &SchedulerConfig) -> AppResult<CleanupService> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let credential: Arc<dyn TokenCredential> = match &config.credential_provider {
        CredentialProviderConfig::Imds => Arc::new(ImdsTokenCredential::new(http_client.clone())),
        CredentialProviderConfig::Static { token } => {
            Arc::new(StaticTokenCredential::new(AccessToken::new(token.clone())?))
        }
    };

    let resource_api: Arc<dyn ResourceManagerApi> = Arc::new(AzureResourceClient::new(
        http_client.clone(),
        config.arm_endpoint.clone(),
    ));

    let email_service: Arc<dyn EmailService> = match &config.email_provider {
        EmailProviderConfig::Console => Arc::new(ConsoleEmailService::new()),
        EmailProviderConfig::Acs {
            connection_string,
            from_address,
        } => Arc::new(AcsEmailService::new(
            http_client,
            AcsEmailConfig::from_connection_string(connection_string)?,
            from_address.clone(),
        )),
    };

    Ok(CleanupService::new(
        credential,
        resource_api,
        email_service,
        RetentionPolicy::new(config.retention_days)?,
        config.report_to.clone(),
    ))
}

impl SchedulerConfig {
    fn load() -> AppResult<Self> {
        let run_at = match env::var("CLEANUP_RUN_AT") {
            Ok(value) => parse_run_at(&value)?,
            Err(_) => NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
        };
        let run_on_start = env::var("CLEANUP_RUN_ON_START")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

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
            run_at,
            run_on_start,
            arm_endpoint,
            retention_days,
            report_to,
            credential_provider,
            email_provider,
        })
    }
}

fn parse_run_at(value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|error| {
        AppError::Configuration(format!(
            "invalid CLEANUP_RUN_AT value '{value}', expected HH:MM: {error}"
        ))
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> AppResult<String> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Configuration(format!("{name} must not be empty")));
    }
    Ok(value)
}
