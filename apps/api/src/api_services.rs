//! Wires infrastructure adapters into the cleanup service.

use std::sync::Arc;
use std::time::Duration;

use snapsweep_application::{
    AccessToken, CleanupService, EmailService, ResourceManagerApi, TokenCredential,
};
use snapsweep_core::{AppError, AppResult};
use snapsweep_domain::RetentionPolicy;
use snapsweep_infrastructure::{
    AcsEmailConfig, AcsEmailService, AzureResourceClient, ConsoleEmailService, ImdsTokenCredential,
    StaticTokenCredential,
};

use crate::api_config::{CleanupConfig, CredentialProviderConfig, EmailProviderConfig};

pub fn build_cleanup_service(config: &CleanupConfig) -> AppResult<CleanupService> {
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
