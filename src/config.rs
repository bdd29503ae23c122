use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_ENV_PREFIX: &str = "INKPOST";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub mastodon: MastodonConfig,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MastodonConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for MastodonConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            access_token: String::new(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://mastodon.social".into()
}

fn default_user_agent() -> String {
    format!("inkpost/{}", crate::VERSION)
}

fn default_timeout() -> Duration {
    Duration::from_secs(20)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    #[serde(default = "default_display_width")]
    pub width: u32,
    #[serde(default = "default_display_height")]
    pub height: u32,
    #[serde(default = "default_display_output")]
    pub output: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_display_width(),
            height: default_display_height(),
            output: default_display_output(),
        }
    }
}

fn default_display_width() -> u32 {
    600
}

fn default_display_height() -> u32 {
    448
}

fn default_display_output() -> PathBuf {
    PathBuf::from("frame.png")
}

/// Rectangle on the display, in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Background {
    Solid { color: [u8; 3] },
    Gradient { from: [u8; 3], to: [u8; 3] },
    RandomGradient,
}

impl Default for Background {
    fn default() -> Self {
        Background::Solid {
            color: [255, 255, 255],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    /// Side of the square thumbnail; the display width when unset.
    #[serde(default)]
    pub thumb_width: Option<u32>,
    #[serde(default)]
    pub thumb_x: i32,
    #[serde(default)]
    pub thumb_y: i32,
    #[serde(default = "default_caption_box")]
    pub caption: Rect,
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,
    #[serde(default = "default_font_size_max")]
    pub font_size_max: u32,
    #[serde(default = "default_font_size_min")]
    pub font_size_min: u32,
    #[serde(default = "default_line_spacing")]
    pub line_spacing: u32,
    #[serde(default)]
    pub text_color: [u8; 3],
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub foreground_image: Option<PathBuf>,
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: PathBuf,
    #[serde(default = "default_placeholder_caption")]
    pub placeholder_caption: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            thumb_width: None,
            thumb_x: 0,
            thumb_y: 0,
            caption: default_caption_box(),
            font_path: default_font_path(),
            font_size_max: default_font_size_max(),
            font_size_min: default_font_size_min(),
            line_spacing: default_line_spacing(),
            text_color: [0, 0, 0],
            background: Background::default(),
            foreground_image: None,
            placeholder_image: default_placeholder_image(),
            placeholder_caption: default_placeholder_caption(),
        }
    }
}

fn default_caption_box() -> Rect {
    Rect {
        x: 245,
        y: 77,
        width: 340,
        height: 110,
    }
}

fn default_font_path() -> PathBuf {
    PathBuf::from("fonts/DejaVuSans.ttf")
}

fn default_font_size_max() -> u32 {
    20
}

fn default_font_size_min() -> u32 {
    2
}

fn default_line_spacing() -> u32 {
    4
}

fn default_placeholder_image() -> PathBuf {
    PathBuf::from("img/404slide.png")
}

fn default_placeholder_caption() -> String {
    "Here could be a beautiful ALT description. Maybe next time?".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(default = "default_max_requested_posts")]
    pub max_requested_posts: u32,
    #[serde(default = "default_stdin_buttons")]
    pub stdin_buttons: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            max_requested_posts: default_max_requested_posts(),
            stdin_buttons: default_stdin_buttons(),
        }
    }
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_max_requested_posts() -> u32 {
    20
}

fn default_stdin_buttons() -> bool {
    true
}

impl Config {
    /// Thumbnail side length, defaulting to the full display width.
    pub fn thumb_width(&self) -> u32 {
        self.layout.thumb_width.unwrap_or(self.display.width)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        ensure!(path.exists(), "config file {} not found", path.display());
        let from_file = read_config_file(path)?;
        cfg = merge_config(cfg, from_file);
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.mastodon.api_base_url.is_empty() {
        base.mastodon.api_base_url = other.mastodon.api_base_url;
    }
    if !other.mastodon.access_token.is_empty() {
        base.mastodon.access_token = other.mastodon.access_token;
    }
    if !other.mastodon.user_agent.is_empty() {
        base.mastodon.user_agent = other.mastodon.user_agent;
    }
    base.mastodon.timeout = other.mastodon.timeout;

    if !other.accounts.is_empty() {
        base.accounts = other.accounts;
    }

    base.display = other.display;
    base.layout = other.layout;
    base.runtime = other.runtime;

    base
}

fn apply_env(cfg: &mut Config, prefix: &str) {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    for (key, value) in map {
        apply_env_value(cfg, &key, value);
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "mastodon.api_base_url" => cfg.mastodon.api_base_url = value,
        "mastodon.access_token" => cfg.mastodon.access_token = value,
        "mastodon.user_agent" => cfg.mastodon.user_agent = value,
        "mastodon.timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.mastodon.timeout = duration;
            }
        }
        "accounts" => {
            cfg.accounts = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        "display.output" => cfg.display.output = PathBuf::from(value),
        "layout.font_path" => cfg.layout.font_path = PathBuf::from(value),
        "layout.placeholder_image" => cfg.layout.placeholder_image = PathBuf::from(value),
        "layout.foreground_image" => cfg.layout.foreground_image = Some(PathBuf::from(value)),
        "runtime.poll_interval" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.runtime.poll_interval = duration;
            }
        }
        "runtime.max_requested_posts" => {
            if let Ok(parsed) = value.parse::<u32>() {
                cfg.runtime.max_requested_posts = parsed;
            }
        }
        "runtime.stdin_buttons" => {
            cfg.runtime.stdin_buttons = matches!(value.as_str(), "1" | "true" | "TRUE" | "True");
        }
        _ => {}
    }
}

/// Checks the invariants the rest of the program relies on.
pub fn validate(cfg: &Config) -> Result<()> {
    ensure!(
        !cfg.accounts.is_empty(),
        "config: at least one account id is required"
    );
    ensure!(
        cfg.display.width > 0 && cfg.display.height > 0,
        "config: display resolution must be non-zero"
    );
    ensure!(cfg.thumb_width() > 0, "config: layout.thumb_width must be non-zero");
    ensure!(
        cfg.layout.caption.width > 0 && cfg.layout.caption.height > 0,
        "config: layout.caption box must be non-zero"
    );
    ensure!(
        cfg.layout.font_size_min > 0 && cfg.layout.font_size_min <= cfg.layout.font_size_max,
        "config: font size range {}..={} is empty",
        cfg.layout.font_size_min,
        cfg.layout.font_size_max
    );
    ensure!(
        cfg.runtime.max_requested_posts > 0,
        "config: runtime.max_requested_posts must be non-zero"
    );
    Ok(())
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("inkpost").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn load_file(path: PathBuf) -> Config {
        load(LoadOptions {
            config_file: Some(path),
            env_prefix: Some("INKPOST_TEST_UNSET".into()),
        })
        .unwrap()
    }

    #[test]
    fn defaults_match_frame_layout() {
        let cfg = Config::default();
        assert_eq!(cfg.layout.font_size_max, 20);
        assert_eq!(cfg.layout.font_size_min, 2);
        assert_eq!(cfg.runtime.poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.runtime.max_requested_posts, 20);
        assert_eq!(cfg.thumb_width(), cfg.display.width);
    }

    #[test]
    fn reads_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
mastodon:
  api_base_url: https://fosstodon.org
  access_token: secret
  timeout: 5s
accounts: ["a1", "a2"]
layout:
  thumb_width: 200
  thumb_x: 110
  thumb_y: 125
  background:
    kind: gradient
    from: [255, 0, 0]
    to: [0, 0, 255]
runtime:
  poll_interval: 250ms
"#,
        )
        .unwrap();

        let cfg = load_file(path);
        assert_eq!(cfg.mastodon.api_base_url, "https://fosstodon.org");
        assert_eq!(cfg.mastodon.timeout, Duration::from_secs(5));
        assert_eq!(cfg.accounts, vec!["a1".to_string(), "a2".to_string()]);
        assert_eq!(cfg.thumb_width(), 200);
        assert_eq!(
            cfg.layout.background,
            Background::Gradient {
                from: [255, 0, 0],
                to: [0, 0, 255]
            }
        );
        assert_eq!(cfg.layout.caption, default_caption_box());
        assert_eq!(cfg.runtime.poll_interval, Duration::from_millis(250));
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn example_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.example.yaml");
        let cfg = load_file(path);
        assert_eq!(cfg.accounts.len(), 2);
        assert_eq!(cfg.thumb_width(), 600);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = load(LoadOptions {
            config_file: Some(dir.path().join("nope.yaml")),
            env_prefix: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn env_overrides() {
        env::set_var("INKPOST_ENVTEST_ACCOUNTS", "x, y ,z");
        env::set_var("INKPOST_ENVTEST_RUNTIME__POLL_INTERVAL", "3s");
        let mut cfg = Config::default();
        apply_env(&mut cfg, "INKPOST_ENVTEST");
        env::remove_var("INKPOST_ENVTEST_ACCOUNTS");
        env::remove_var("INKPOST_ENVTEST_RUNTIME__POLL_INTERVAL");
        assert_eq!(cfg.accounts, vec!["x", "y", "z"]);
        assert_eq!(cfg.runtime.poll_interval, Duration::from_secs(3));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cfg = Config::default();
        assert!(validate(&cfg).is_err());

        let mut cfg = Config {
            accounts: vec!["a1".into()],
            ..Config::default()
        };
        assert!(validate(&cfg).is_ok());
        cfg.layout.font_size_min = 30;
        assert!(validate(&cfg).is_err());
    }
}
