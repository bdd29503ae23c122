use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use image::DynamicImage;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media: url required")]
    MissingUrl,
    #[error("media: download {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("media: request {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("media: decode {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },
}

pub trait ImageSource: Send + Sync {
    fn load(&self, url: &str) -> Result<DynamicImage, MediaError>;
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<Client>,
}

pub struct HttpImageSource {
    client: Client,
    user_agent: String,
}

impl HttpImageSource {
    pub fn new(cfg: Config) -> Result<Self> {
        let client = if let Some(client) = cfg.http_client {
            client
        } else {
            Client::builder()
                .timeout(cfg.timeout.unwrap_or(Duration::from_secs(30)))
                .build()
                .context("media: build http client")?
        };
        Ok(Self {
            client,
            user_agent: cfg.user_agent,
        })
    }
}

impl ImageSource for HttpImageSource {
    fn load(&self, url: &str) -> Result<DynamicImage, MediaError> {
        if url.trim().is_empty() {
            return Err(MediaError::MissingUrl);
        }

        let transport = |source: reqwest::Error| MediaError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(MediaError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let bytes = response.bytes().map_err(transport)?;
        image::load_from_memory(&bytes).map_err(|source| MediaError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Loads the local image shown in place of media that could not be fetched.
pub fn load_placeholder(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("media: open placeholder {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{closed_port, http_client, png_bytes, serve_once};
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn local_source() -> HttpImageSource {
        HttpImageSource::new(Config {
            user_agent: "inkpost-test".into(),
            http_client: Some(http_client()),
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn empty_url_is_rejected_before_any_request() {
        let source = HttpImageSource::new(Config {
            user_agent: "inkpost-test".into(),
            ..Config::default()
        })
        .unwrap();
        assert!(matches!(source.load("  "), Err(MediaError::MissingUrl)));
    }

    #[test]
    fn placeholder_round_trips_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("404slide.png");
        RgbImage::from_pixel(8, 4, Rgb([10, 20, 30])).save(&path).unwrap();

        let placeholder = load_placeholder(&path).unwrap();
        assert_eq!((placeholder.width(), placeholder.height()), (8, 4));
        assert!(load_placeholder(&dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn downloaded_png_is_decoded() {
        let (base, seen) = serve_once(200, png_bytes(6, 3));
        let image = local_source().load(&format!("{base}/media/a.png")).unwrap();
        assert_eq!((image.width(), image.height()), (6, 3));
        assert_eq!(seen.recv().unwrap().url, "/media/a.png");
    }

    #[test]
    fn not_found_is_a_status_error() {
        let (base, _seen) = serve_once(404, b"gone".to_vec());
        let url = format!("{base}/media/missing.png");
        match local_source().load(&url) {
            Err(MediaError::Status { url: failed, status }) => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert_eq!(failed, url);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        let (base, _seen) = serve_once(200, b"definitely not an image".to_vec());
        let result = local_source().load(&format!("{base}/media/garbage.png"));
        assert!(matches!(result, Err(MediaError::Decode { .. })), "{result:?}");
    }

    #[test]
    fn refused_connection_is_a_transport_error() {
        let result = local_source().load(&format!("{}/media/a.png", closed_port()));
        assert!(matches!(result, Err(MediaError::Transport { .. })), "{result:?}");
    }
}
