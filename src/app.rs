use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use image::DynamicImage;
use log::{debug, error, info, warn};

use crate::buttons;
use crate::compose::{self, Composer, Layout};
use crate::config::{self, Config};
use crate::data::{self, Post, PostFetcher};
use crate::display::{Display, PngDisplay};
use crate::font::Typeface;
use crate::mastodon;
use crate::media::{self, ImageSource};
use crate::navigator::Navigator;
use crate::triggers::TriggerFlags;

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub config_file: Option<std::path::PathBuf>,
    /// Run a single tick and return instead of looping forever.
    pub once: bool,
}

/// What one pass of the loop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Skipped,
    Shown {
        account: usize,
        post: usize,
        placeholder: bool,
    },
}

pub struct App {
    navigator: Navigator,
    flags: Arc<TriggerFlags>,
    fetcher: Arc<dyn PostFetcher>,
    images: Arc<dyn ImageSource>,
    composer: Composer,
    display: Box<dyn Display>,
    placeholder: DynamicImage,
    placeholder_caption: String,
    poll_interval: Duration,
}

pub struct Parts {
    pub navigator: Navigator,
    pub flags: Arc<TriggerFlags>,
    pub fetcher: Arc<dyn PostFetcher>,
    pub images: Arc<dyn ImageSource>,
    pub composer: Composer,
    pub display: Box<dyn Display>,
    pub placeholder: DynamicImage,
    pub placeholder_caption: String,
    pub poll_interval: Duration,
}

impl App {
    pub fn new(parts: Parts) -> Self {
        Self {
            navigator: parts.navigator,
            flags: parts.flags,
            fetcher: parts.fetcher,
            images: parts.images,
            composer: parts.composer,
            display: parts.display,
            placeholder: parts.placeholder,
            placeholder_caption: parts.placeholder_caption,
            poll_interval: parts.poll_interval,
        }
    }

    pub fn flags(&self) -> Arc<TriggerFlags> {
        self.flags.clone()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// One loop pass: account change, then post change, then at most one frame.
    pub fn tick(&mut self) -> Tick {
        let mut stepped = false;

        if self.flags.take_account_change() {
            stepped = true;
            info!("Account change triggered");
            match self.navigator.advance_account(self.fetcher.as_ref()) {
                Ok(index) => info!(
                    "Loaded {} posts for account {} ({})",
                    self.navigator.posts().len(),
                    index,
                    self.navigator.current_account().unwrap_or_default()
                ),
                Err(err) => warn!("Fetching posts failed: {err:#}"),
            }
            self.flags.raise_first_post();
        }

        if let Some(step) = self.flags.take_post_change() {
            stepped = true;
            debug!("Post change triggered: {step:?}");
            self.navigator.advance_post(step);
        }

        if !stepped {
            return Tick::Idle;
        }

        let (Some(account), Some(post_index), Some(post)) = (
            self.navigator.account_index(),
            self.navigator.post_index(),
            self.navigator.current_post().cloned(),
        ) else {
            info!("No media posts to show; keeping the current frame");
            return Tick::Skipped;
        };

        match post.created_at {
            Some(at) => info!(
                "Showing post {post_index} from account {account} (posted {})",
                at.format("%Y-%m-%d %H:%M")
            ),
            None => info!("Showing post {post_index} from account {account}"),
        }
        match self.show_post(&post) {
            Some(placeholder) => Tick::Shown {
                account,
                post: post_index,
                placeholder,
            },
            None => Tick::Skipped,
        }
    }

    /// Composes and displays the post's first attachment. Returns whether the
    /// placeholder image stood in for it, or `None` if nothing was shown.
    fn show_post(&mut self, post: &Post) -> Option<bool> {
        let Some(attachment) = post.media.first() else {
            warn!("Post {} has no media attachment", post.id);
            return None;
        };

        let caption = compose::caption_text(
            attachment.description.as_deref(),
            &attachment.author,
            &self.placeholder_caption,
        );

        let (frame, placeholder) = match self.images.load(&attachment.url) {
            Ok(image) => (self.composer.compose(&image, &caption), false),
            Err(err) => {
                warn!("{err}; using placeholder image");
                (self.composer.compose(&self.placeholder, &caption), true)
            }
        };

        if let Err(err) = self.display.show(&frame) {
            error!("Display update failed: {err:#}");
            return None;
        }
        Some(placeholder)
    }

    pub fn run_forever(&mut self) -> ! {
        loop {
            self.tick();
            thread::sleep(self.poll_interval);
        }
    }
}

pub fn run(options: Options) -> Result<()> {
    let cfg = config::load(config::LoadOptions {
        config_file: options.config_file.clone(),
        env_prefix: None,
    })
    .context("load config")?;
    config::validate(&cfg)?;

    let mut app = build(&cfg)?;

    if cfg.runtime.stdin_buttons {
        info!("Reading button presses from stdin (a = next account, b = next post)");
        buttons::spawn_line_reader(io::BufReader::new(io::stdin()), app.flags());
    }

    if options.once {
        let outcome = app.tick();
        info!("Single run finished: {outcome:?}");
        return Ok(());
    }
    app.run_forever()
}

fn build(cfg: &Config) -> Result<App> {
    let client = mastodon::Client::new(mastodon::ClientConfig {
        api_base_url: cfg.mastodon.api_base_url.clone(),
        access_token: cfg.mastodon.access_token.clone(),
        user_agent: cfg.mastodon.user_agent.clone(),
        timeout: Some(cfg.mastodon.timeout),
        http_client: None,
    })
    .context("create mastodon client")?;
    let client = Arc::new(client);

    let images = media::HttpImageSource::new(media::Config {
        user_agent: cfg.mastodon.user_agent.clone(),
        timeout: Some(cfg.mastodon.timeout),
        http_client: Some(client.http().clone()),
    })?;

    let face = Typeface::load(&cfg.layout.font_path)?;
    let placeholder = media::load_placeholder(&cfg.layout.placeholder_image)?;

    let mut composer = Composer::new(Layout::from_config(cfg), Arc::new(face));
    if let Some(path) = &cfg.layout.foreground_image {
        let foreground = image::open(path)
            .with_context(|| format!("open foreground image {}", path.display()))?
            .to_rgba8();
        composer = composer.with_foreground(foreground);
    }

    let display = PngDisplay::new(&cfg.display.output, cfg.display.width, cfg.display.height);
    info!(
        "Screen resolution: {}x{}, writing frames to {}",
        cfg.display.width,
        cfg.display.height,
        display.path().display()
    );

    Ok(App::new(Parts {
        navigator: Navigator::new(cfg.accounts.clone(), cfg.runtime.max_requested_posts)?,
        flags: Arc::new(TriggerFlags::armed()),
        fetcher: Arc::new(data::MastodonPostFetcher::new(client)),
        images: Arc::new(images),
        composer,
        display: Box::new(display),
        placeholder,
        placeholder_caption: cfg.layout.placeholder_caption.clone(),
        poll_interval: cfg.runtime.poll_interval,
    }))
}
