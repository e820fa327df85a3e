//! Allow-list check for chapter image URLs.

use crate::config::ImageConfig;

/// Immutable table of host/path substrings that identify chapter images.
///
/// Matching is plain substring containment, not host matching: an entry such
/// as `wp.com` accepts any URL containing that text anywhere. Entries must be
/// curated with that in mind.
#[derive(Debug, Clone)]
pub struct ImageAllowList {
    entries: Vec<String>,
}

impl ImageAllowList {
    /// Builds an allow-list, dropping blank entries.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|e| {
                let e: String = e.into();
                e.trim().to_string()
            })
            .filter(|e| !e.is_empty())
            .collect();

        Self { entries }
    }

    /// Builds the allow-list from configuration.
    pub fn from_config(config: &ImageConfig) -> Self {
        Self::new(config.allowed_hosts.iter().cloned())
    }

    /// Returns true if `candidate` contains any allow-listed entry.
    pub fn is_valid_image_url(&self, candidate: &str) -> bool {
        self.entries.iter().any(|entry| candidate.contains(entry.as_str()))
    }

    /// Returns the entries in configuration order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Default for ImageAllowList {
    fn default() -> Self {
        Self::from_config(&ImageConfig::default())
    }
}
