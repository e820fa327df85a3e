//! Komikku - scraping backend for a manga/manhwa reader.
//!
//! This library provides:
//! - Image URL recovery from MangaReader-theme chapter pages
//! - Series listing, detail and search scraping
//! - A JSON HTTP API with Telegram error alerts

pub mod alert;
pub mod config;
pub mod console;
pub mod error;
pub mod scrapers;
pub mod server;
pub mod validator;

// Re-export commonly used types
pub use config::Config;
pub use console::Console;
pub use error::{AlertError, ConfigError, ScraperError};
pub use scrapers::{MangaReaderScraper, Scraper};
pub use validator::ImageAllowList;
