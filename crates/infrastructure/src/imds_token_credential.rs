//! Managed-identity credential backed by the instance metadata service.

use async_trait::async_trait;
use serde::Deserialize;

use snapsweep_application::{AccessToken, TokenCredential};
use snapsweep_core::{AppError, AppResult};

const IMDS_ENDPOINT: &str = "http://169.254.169.254";
const IMDS_TOKEN_PATH: &str = "/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";

/// Acquires bearer tokens for the system-assigned managed identity via the
/// instance metadata service. Only works on hosts that expose IMDS.
pub struct ImdsTokenCredential {
    http_client: reqwest::Client,
    endpoint: String,
}

impl ImdsTokenCredential {
    /// Creates a credential against the well-known IMDS endpoint.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self::with_endpoint(http_client, IMDS_ENDPOINT)
    }

    /// Creates a credential against a custom metadata endpoint.
    #[must_use]
    pub fn with_endpoint(http_client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImdsTokenResponse {
    access_token: String,
}

#[async_trait]
impl TokenCredential for ImdsTokenCredential {
    async fn management_token(&self) -> AppResult<AccessToken> {
        let url = format!(
            "{}{IMDS_TOKEN_PATH}?api-version={IMDS_API_VERSION}&resource={MANAGEMENT_RESOURCE}",
            self.endpoint
        );

        let response = self
            .http_client
            .get(&url)
            .header("Metadata", "true")
            .send()
            .await
            .map_err(|error| {
                AppError::Transport(format!("failed to reach metadata service: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<ImdsTokenResponse>().await.map_err(|error| {
            AppError::Deserialization(format!("invalid metadata token response: {error}"))
        })?;

        AccessToken::new(body.access_token)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use snapsweep_application::TokenCredential;
    use snapsweep_core::{AppError, AppResult};

    use super::ImdsTokenCredential;

    #[tokio::test]
    async fn requests_token_with_metadata_header() -> AppResult<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata/identity/oauth2/token"))
            .and(query_param("api-version", "2018-02-01"))
            .and(query_param("resource", "https://management.azure.com/"))
            .and(header("Metadata", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "arm-token",
                "expires_on": "1758000000",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = ImdsTokenCredential::with_endpoint(reqwest::Client::new(), server.uri());
        let token = credential.management_token().await?;

        assert_eq!(token.as_str(), "arm-token");
        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_is_an_upstream_error() -> AppResult<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata/identity/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("no identity"))
            .mount(&server)
            .await;

        let credential = ImdsTokenCredential::with_endpoint(reqwest::Client::new(), server.uri());
        let result = credential.management_token().await;

        assert!(matches!(result, Err(AppError::Upstream { status: 400, .. })));
        Ok(())
    }
}
