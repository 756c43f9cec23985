//! Resource-management API client over HTTPS.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use snapsweep_application::{AccessToken, ResourceManagerApi};
use snapsweep_core::{AppError, AppResult};
use snapsweep_domain::{Snapshot, SnapshotId, Subscription, SubscriptionId};

const SUBSCRIPTIONS_API_VERSION: &str = "2020-01-01";
const SNAPSHOTS_API_VERSION: &str = "2021-04-01";

/// Reqwest-based adapter for the management-plane REST API.
///
/// Listing calls follow `nextLink` continuation URLs until the collection
/// is exhausted, so collections larger than one page are fully scanned.
pub struct AzureResourceClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl AzureResourceClient {
    /// Creates a client against the given management endpoint,
    /// e.g. `https://management.azure.com`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
        }
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        first_page_url: String,
    ) -> AppResult<Vec<T>> {
        let mut items = Vec::new();
        let mut next_url = Some(first_page_url);

        while let Some(url) = next_url {
            let response = self
                .http_client
                .get(&url)
                .bearer_auth(token.as_str())
                .send()
                .await
                .map_err(|error| AppError::Transport(format!("failed to reach {url}: {error}")))?;

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

            let page = response.json::<ResourceCollection<T>>().await.map_err(|error| {
                AppError::Deserialization(format!("invalid listing response from {url}: {error}"))
            })?;

            debug!(
                url = url.as_str(),
                items = page.value.len(),
                has_next = page.next_link.is_some(),
                "fetched resource collection page"
            );

            items.extend(page.value);
            next_url = page.next_link;
        }

        Ok(items)
    }
}

#[async_trait]
impl ResourceManagerApi for AzureResourceClient {
    async fn list_subscriptions(&self, token: &AccessToken) -> AppResult<Vec<Subscription>> {
        let url = format!(
            "{}/subscriptions?api-version={SUBSCRIPTIONS_API_VERSION}",
            self.endpoint
        );
        let pages = self.get_collection::<SubscriptionDto>(token, url).await?;
        pages
            .into_iter()
            .map(SubscriptionDto::try_into_subscription)
            .collect()
    }

    async fn list_snapshots(
        &self,
        token: &AccessToken,
        subscription_id: &SubscriptionId,
    ) -> AppResult<Vec<Snapshot>> {
        let url = format!(
            "{}/subscriptions/{}/providers/Microsoft.Compute/snapshots?api-version={SNAPSHOTS_API_VERSION}",
            self.endpoint,
            subscription_id.as_str()
        );
        let pages = self.get_collection::<SnapshotDto>(token, url).await?;
        pages
            .into_iter()
            .map(SnapshotDto::try_into_snapshot)
            .collect()
    }

    async fn delete_snapshot(&self, token: &AccessToken, snapshot_id: &SnapshotId) -> bool {
        let url = format!(
            "{}/{}?api-version={SNAPSHOTS_API_VERSION}",
            self.endpoint,
            snapshot_id.as_str().trim_start_matches('/')
        );

        match self
            .http_client
            .delete(&url)
            .bearer_auth(token.as_str())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(
                    snapshot = %snapshot_id,
                    status = response.status().as_u16(),
                    "snapshot delete rejected by upstream"
                );
                false
            }
            Err(error) => {
                warn!(
                    snapshot = %snapshot_id,
                    error = %error,
                    "snapshot delete transport failure"
                );
                false
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResourceCollection<T> {
    value: Vec<T>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionDto {
    subscription_id: String,
    display_name: Option<String>,
}

impl SubscriptionDto {
    fn try_into_subscription(self) -> AppResult<Subscription> {
        Ok(Subscription {
            id: SubscriptionId::new(self.subscription_id)?,
            display_name: self.display_name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotDto {
    id: String,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    properties: Option<SnapshotPropertiesDto>,
}

impl SnapshotDto {
    fn try_into_snapshot(self) -> AppResult<Snapshot> {
        Ok(Snapshot {
            id: SnapshotId::new(self.id)?,
            tags: self.tags,
            time_created: self
                .properties
                .and_then(|properties| properties.time_created),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotPropertiesDto {
    #[serde(rename = "timeCreated", default, deserialize_with = "lenient_datetime")]
    time_created: Option<DateTime<Utc>>,
}

/// Decodes a creation timestamp without failing the whole listing: absent,
/// non-string, or unparsable values become `None` so the retention filter
/// can keep the snapshot.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|value| value.parse::<DateTime<Utc>>().ok()))
}
