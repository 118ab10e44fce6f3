// src/fetch/mod.rs

pub mod session;
#[cfg(test)]
pub(crate) mod test_server;

pub use session::{CredentialsError, Session, StatusPage};

use anyhow::Result;
use reqwest::Client;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client with the cookie store the device login depends on.
pub fn build_client() -> Result<Client> {
    Ok(Client::builder()
        .cookie_store(true)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}
