//! Communication-services email adapter with HMAC request signing.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::info;
use url::Url;

use snapsweep_application::EmailService;
use snapsweep_core::{AppError, AppResult};
use snapsweep_domain::EmailAddress;

const EMAIL_SEND_API_VERSION: &str = "2023-03-31";

type HmacSha256 = Hmac<Sha256>;

/// Connection settings for a communication-services resource.
#[derive(Debug, Clone)]
pub struct AcsEmailConfig {
    endpoint: String,
    access_key: String,
}

impl AcsEmailConfig {
    /// Parses a connection string of the form
    /// `endpoint=https://<resource>.communication.azure.com/;accesskey=<base64>`.
    pub fn from_connection_string(raw: &str) -> AppResult<Self> {
        let mut endpoint = None;
        let mut access_key = None;

        for part in raw.split(';') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value.trim().trim_end_matches('/').to_owned()),
                "accesskey" => access_key = Some(value.trim().to_owned()),
                _ => {}
            }
        }

        let endpoint = endpoint.filter(|value| !value.is_empty()).ok_or_else(|| {
            AppError::Configuration(
                "email connection string is missing an 'endpoint' part".to_owned(),
            )
        })?;
        let access_key = access_key.filter(|value| !value.is_empty()).ok_or_else(|| {
            AppError::Configuration(
                "email connection string is missing an 'accesskey' part".to_owned(),
            )
        })?;

        Ok(Self {
            endpoint,
            access_key,
        })
    }

    /// Returns the resource endpoint without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    fn authority(&self) -> AppResult<String> {
        let url = Url::parse(&self.endpoint).map_err(|error| {
            AppError::Configuration(format!(
                "invalid email endpoint '{}': {error}",
                self.endpoint
            ))
        })?;
        let host = url.host_str().ok_or_else(|| {
            AppError::Configuration(format!("email endpoint '{}' has no host", self.endpoint))
        })?;

        Ok(match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        })
    }
}

/// Production email delivery via the communication-services REST API.
///
/// Each request is signed with the resource access key: the body hash goes
/// into `x-ms-content-sha256` and an HMAC-SHA256 over method, path and the
/// signed headers into `Authorization`.
pub struct AcsEmailService {
    http_client: reqwest::Client,
    config: AcsEmailConfig,
    from_address: EmailAddress,
}

impl AcsEmailService {
    /// Creates a new email service for the given resource and sender.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        config: AcsEmailConfig,
        from_address: EmailAddress,
    ) -> Self {
        Self {
            http_client,
            config,
            from_address,
        }
    }

    fn sign(&self, string_to_sign: &str) -> AppResult<String> {
        let key = BASE64.decode(&self.config.access_key).map_err(|error| {
            AppError::Configuration(format!("email access key is not valid base64: {error}"))
        })?;
        let mut mac = HmacSha256::new_from_slice(&key).map_err(|error| {
            AppError::Internal(format!("failed to initialize request signer: {error}"))
        })?;
        mac.update(string_to_sign.as_bytes());

        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct SendReceipt {
    id: Option<String>,
    status: Option<String>,
}

#[async_trait]
impl EmailService for AcsEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()> {
        let message = serde_json::json!({
            "senderAddress": self.from_address.as_str(),
            "recipients": { "to": [ { "address": to } ] },
            "content": {
                "subject": subject,
                "plainText": text_body,
                "html": html_body.map_or_else(
                    || format!("<html><body><h1>{text_body}</h1></body></html>"),
                    str::to_owned,
                ),
            },
        });
        let body = serde_json::to_vec(&message).map_err(|error| {
            AppError::Internal(format!("failed to encode email payload: {error}"))
        })?;

        let path_and_query = format!("/emails:send?api-version={EMAIL_SEND_API_VERSION}");
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let content_hash = content_sha256(&body);
        let string_to_sign = format!(
            "POST\n{path_and_query}\n{date};{};{content_hash}",
            self.config.authority()?
        );
        let signature = self.sign(&string_to_sign)?;

        let response = self
            .http_client
            .post(format!("{}{path_and_query}", self.config.endpoint))
            .header("x-ms-date", date)
            .header("x-ms-content-sha256", content_hash)
            .header(
                header::AUTHORIZATION,
                format!(
                    "HMAC-SHA256 SignedHeaders=x-ms-date;host;x-ms-content-sha256&Signature={signature}"
                ),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|error| {
                AppError::Delivery(format!("failed to reach email service: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(AppError::Delivery(format!(
                "email send rejected with status {}: {message}",
                status.as_u16()
            )));
        }

        let receipt = response.json::<SendReceipt>().await.unwrap_or_default();
        info!(
            operation_id = receipt.id.as_deref().unwrap_or("unknown"),
            status = receipt.status.as_deref().unwrap_or("unknown"),
            "email send accepted"
        );

        Ok(())
    }
}

fn content_sha256(body: &[u8]) -> String {
    BASE64.encode(Sha256::digest(body))
}

#[cfg(test)]
mod tests;
