#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod buttons;
pub mod compose;
pub mod config;
pub mod data;
pub mod display;
pub mod font;
pub mod layout;
pub mod mastodon;
pub mod media;
pub mod navigator;
pub mod triggers;

#[cfg(test)]
mod testing;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
