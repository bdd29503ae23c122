use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use crate::mastodon;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub author: String,
    pub created_at: Option<DateTime<Utc>>,
    pub media: Vec<MediaAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub url: String,
    pub description: Option<String>,
    pub author: String,
}

pub trait PostFetcher: Send + Sync {
    /// Media-bearing posts of an account, at most `limit`, newest first.
    fn fetch_media_posts(&self, account_id: &str, limit: u32) -> Result<Vec<Post>>;
}

pub struct MastodonPostFetcher {
    client: Arc<mastodon::Client>,
}

impl MastodonPostFetcher {
    pub fn new(client: Arc<mastodon::Client>) -> Self {
        Self { client }
    }
}

impl PostFetcher for MastodonPostFetcher {
    fn fetch_media_posts(&self, account_id: &str, limit: u32) -> Result<Vec<Post>> {
        let statuses = self
            .client
            .account_statuses(account_id, limit, true)
            .with_context(|| format!("fetch media posts for account {account_id}"))?;
        Ok(statuses
            .into_iter()
            .map(mastodon::Status::into_post)
            .collect())
    }
}

/// In-memory fetcher keyed by account id; records every call it serves.
#[derive(Default)]
pub struct MockPostFetcher {
    posts: HashMap<String, Vec<Post>>,
    failing: Vec<String>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl MockPostFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(mut self, account_id: &str, posts: Vec<Post>) -> Self {
        self.posts.insert(account_id.to_string(), posts);
        self
    }

    pub fn failing_for(mut self, account_id: &str) -> Self {
        self.failing.push(account_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().clone()
    }
}

impl PostFetcher for MockPostFetcher {
    fn fetch_media_posts(&self, account_id: &str, limit: u32) -> Result<Vec<Post>> {
        self.calls.lock().push((account_id.to_string(), limit));
        if self.failing.iter().any(|id| id == account_id) {
            return Err(anyhow!("mock: network unreachable for {account_id}"));
        }
        let mut posts = self.posts.get(account_id).cloned().unwrap_or_default();
        posts.truncate(limit as usize);
        Ok(posts)
    }
}

/// Builds `count` single-image posts for `account_id`, for tests and demos.
pub fn sample_posts(account_id: &str, count: usize) -> Vec<Post> {
    (0..count)
        .map(|i| Post {
            id: format!("{account_id}-{i}"),
            author: format!("{account_id} author"),
            created_at: Utc
                .timestamp_opt(1_672_574_400 - 3_600 * i as i64, 0)
                .single(),
            media: vec![MediaAttachment {
                url: format!("https://media.example/{account_id}/{i}.png"),
                description: Some(format!("picture {i} of {account_id}")),
                author: format!("{account_id} author"),
            }],
        })
        .collect()
}
