//! Advertiser block-list snapshot
//!
//! Usernames listed here are excluded from the primary pair at admission time
//! and again when stored intervals are reprocessed. The list is persisted in
//! the `advertiser_blocklist` table:
//!
//! ```sql
//! SELECT username FROM advertiser_blocklist
//! WHERE expires_at IS NULL OR expires_at > ?
//! ```
//!
//! Expiration handling:
//! - `expires_at = NULL`: Permanently blocked
//! - `expires_at > now`: Temporarily blocked
//! - `expires_at <= now`: Block has expired

use crate::error::StoreError;
use std::collections::HashSet;

/// Point-in-time set of blocked advertiser usernames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blocklist {
    usernames: HashSet<String>,
}

impl Blocklist {
    pub fn new<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            usernames: usernames.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.usernames.contains(username)
    }

    pub fn len(&self) -> usize {
        self.usernames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usernames.is_empty()
    }
}

/// Source of the active block-list
pub trait BlocklistProvider {
    /// Usernames blocked at `now` (unix seconds)
    fn active_blocklist(&self, now: i64) -> Result<Blocklist, StoreError>;
}
