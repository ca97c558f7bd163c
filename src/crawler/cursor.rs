//! Pagination over the `/users` listing
//!
//! The listing is keyed by a `since` id: each page holds the accounts whose
//! id is greater than `since`, in ascending id order. The ids themselves
//! are not used from the listing; only logins are taken from it.

use crate::crawler::client::RateLimitedClient;
use crate::crawler::clock::Clock;
use crate::crawler::transport::Transport;
use crate::{GhMinerError, Result};
use serde::Deserialize;

/// The `since` position of the crawl
///
/// Moves upward only, and only when the coordinator hands it the id of an
/// account that was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    position: i64,
    ceiling: i64,
}

impl PageCursor {
    pub fn new(start: i64, ceiling: i64) -> Self {
        Self {
            position: start,
            ceiling,
        }
    }

    /// Highest account id fully processed
    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn ceiling(&self) -> i64 {
        self.ceiling
    }

    /// Returns true once the cursor has reached the configured ceiling
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.ceiling
    }

    /// Moves the cursor to `id` if that is forward progress
    ///
    /// # Returns
    ///
    /// * `true` - The cursor moved
    /// * `false` - `id` is not beyond the current position; nothing changed
    pub fn advance_to(&mut self, id: i64) -> bool {
        if id > self.position {
            self.position = id;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListedAccount {
    #[serde(default)]
    login: Option<String>,
}

/// API path of the listing page that follows `since_id`
pub fn listing_path(since_id: i64, per_page: u32) -> String {
    format!("/users?per_page={}&since={}", per_page, since_id)
}

/// Lists up to `per_page` usernames of accounts created after `since_id`
///
/// The upstream order is preserved. An empty result means the listing has
/// nothing beyond `since_id`.
pub async fn list_usernames<T: Transport, C: Clock>(
    client: &RateLimitedClient<T, C>,
    since_id: i64,
    per_page: u32,
) -> Result<Vec<String>> {
    let path = listing_path(since_id, per_page);
    let value = client.get_json(&path).await?;

    let listed: Vec<ListedAccount> =
        serde_json::from_value(value).map_err(|source| GhMinerError::Decode {
            url: client.url_for(&path),
            source,
        })?;

    let usernames = listed
        .into_iter()
        .filter_map(|entry| {
            if entry.login.is_none() {
                tracing::debug!("Listing after #{} contained an entry without login", since_id);
            }
            entry.login
        })
        .collect();

    Ok(usernames)
}
