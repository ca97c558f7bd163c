//! Account detail fetching
//!
//! Accounts can disappear between being listed and being fetched (deleted,
//! banned, renamed); the API then answers the detail request with a 404,
//! which reaches the caller as a `RemoteRequest` error with status 404.

use crate::crawler::client::RateLimitedClient;
use crate::crawler::clock::Clock;
use crate::crawler::transport::Transport;
use crate::storage::AccountRecord;
use crate::{GhMinerError, Result};

/// Fetches `/users/{username}` and flattens it into an `AccountRecord`
///
/// # Returns
///
/// * `Ok(AccountRecord)` - The account's metadata
/// * `Err(GhMinerError::RemoteRequest { status_code: 404, .. })` - No such account
/// * `Err(GhMinerError)` - Any other failure, unrecoverable at this level
pub async fn fetch_account<T: Transport, C: Clock>(
    client: &RateLimitedClient<T, C>,
    username: &str,
) -> Result<AccountRecord> {
    let path = format!("/users/{}", username);
    let value = client.get_json(&path).await?;

    serde_json::from_value(value).map_err(|source| GhMinerError::Decode {
        url: client.url_for(&path),
        source,
    })
}
