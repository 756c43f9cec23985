//! Application services and ports.

#![forbid(unsafe_code)]

mod cleanup_ports;
mod cleanup_service;

pub use cleanup_ports::{AccessToken, EmailService, ResourceManagerApi, TokenCredential};
pub use cleanup_service::{CleanupOutcome, CleanupService};
