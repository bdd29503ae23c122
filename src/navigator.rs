use anyhow::Result;

use crate::data::{Post, PostFetcher};

#[derive(Debug, thiserror::Error)]
pub enum NavigatorError {
    #[error("no accounts configured")]
    NoAccounts,
}

/// How a pending post change moves the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStep {
    First,
    Next,
}

/// Which account and which of its posts is on screen.
#[derive(Debug)]
pub struct Navigator {
    accounts: Vec<String>,
    max_requested_posts: u32,
    account_index: Option<usize>,
    post_index: Option<usize>,
    posts: Vec<Post>,
}

impl Navigator {
    pub fn new(accounts: Vec<String>, max_requested_posts: u32) -> Result<Self, NavigatorError> {
        if accounts.is_empty() {
            return Err(NavigatorError::NoAccounts);
        }
        Ok(Self {
            accounts,
            max_requested_posts,
            account_index: None,
            post_index: None,
            posts: Vec::new(),
        })
    }

    /// Moves to the next account (wrapping) and refetches its posts.
    ///
    /// The index advances even when the fetch fails; the post list is then
    /// empty and the error is handed back to the caller.
    pub fn advance_account(&mut self, fetcher: &dyn PostFetcher) -> Result<usize> {
        let next = match self.account_index {
            Some(index) => (index + 1) % self.accounts.len(),
            None => 0,
        };
        self.account_index = Some(next);
        self.post_index = None;
        self.posts.clear();

        self.posts = fetcher.fetch_media_posts(&self.accounts[next], self.max_requested_posts)?;
        Ok(next)
    }

    /// Applies a post step. Returns `None` when the account has no posts.
    pub fn advance_post(&mut self, step: PostStep) -> Option<&Post> {
        if self.posts.is_empty() {
            self.post_index = None;
            return None;
        }
        let next = match (step, self.post_index) {
            (PostStep::Next, Some(index)) => (index + 1) % self.posts.len(),
            _ => 0,
        };
        self.post_index = Some(next);
        self.posts.get(next)
    }

    pub fn account_index(&self) -> Option<usize> {
        self.account_index
    }

    pub fn post_index(&self) -> Option<usize> {
        self.post_index
    }

    pub fn current_account(&self) -> Option<&str> {
        self.account_index
            .and_then(|index| self.accounts.get(index))
            .map(String::as_str)
    }

    pub fn current_post(&self) -> Option<&Post> {
        self.post_index.and_then(|index| self.posts.get(index))
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }
}
