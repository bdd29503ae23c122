use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::data::{MediaAttachment, Post};

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub access_token: String,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    access_token: String,
    base_url: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("mastodon client user agent required");
        }
        let base_url = Url::parse(config.api_base_url.trim())
            .with_context(|| format!("parse api base url {:?}", config.api_base_url))?;

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(Duration::from_secs(20)))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            access_token: config.access_token,
            base_url,
        })
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Latest statuses of an account, newest first.
    pub fn account_statuses(
        &self,
        account_id: &str,
        limit: u32,
        only_media: bool,
    ) -> Result<Vec<Status>> {
        let url = self.statuses_url(account_id, limit, only_media)?;

        let mut request = self.http.get(url).header(USER_AGENT, &self.user_agent);
        if !self.access_token.is_empty() {
            request = request.header(AUTHORIZATION, format!("Bearer {}", self.access_token));
        }
        let response = request.send().context("mastodon: request statuses")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(anyhow!(
                "mastodon: statuses request failed: {} - {}",
                status,
                body
            ));
        }

        response.json().context("mastodon: decode statuses")
    }

    fn statuses_url(&self, account_id: &str, limit: u32, only_media: bool) -> Result<Url> {
        if account_id.trim().is_empty() {
            bail!("mastodon: account id required");
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("mastodon: api base url {} cannot hold a path", self.base_url))?
            .pop_if_empty()
            .extend(["api", "v1", "accounts", account_id.trim(), "statuses"]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("only_media", if only_media { "true" } else { "false" });
        Ok(url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub account: Account,
    #[serde(default)]
    pub media_attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    #[serde(rename = "type", default)]
    pub media_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Status {
    pub fn into_post(self) -> Post {
        let author = if self.account.display_name.trim().is_empty() {
            self.account.username.clone()
        } else {
            self.account.display_name.clone()
        };

        let media = self
            .media_attachments
            .into_iter()
            .filter_map(|attachment| {
                let url = attachment.preview_url.or(attachment.url)?;
                Some(MediaAttachment {
                    url,
                    description: attachment.description,
                    author: author.clone(),
                })
            })
            .collect();

        Post {
            id: self.id,
            author,
            created_at: self.created_at,
            media,
        }
    }
}
