//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod acs_email_service;
mod azure_resource_client;
mod console_email_service;
mod imds_token_credential;
mod static_token_credential;

pub use acs_email_service::{AcsEmailConfig, AcsEmailService};
pub use azure_resource_client::AzureResourceClient;
pub use console_email_service::ConsoleEmailService;
pub use imds_token_credential::ImdsTokenCredential;
pub use static_token_credential::StaticTokenCredential;
