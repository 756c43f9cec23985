//! Fixed-token credential for local runs and tests.

use async_trait::async_trait;

use snapsweep_application::{AccessToken, TokenCredential};
use snapsweep_core::AppResult;

/// Credential that hands out a pre-acquired token, e.g. from
/// `az account get-access-token` during local development.
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    /// Creates a credential wrapping the given token.
    #[must_use]
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn management_token(&self) -> AppResult<AccessToken> {
        Ok(self.token.clone())
    }
}
