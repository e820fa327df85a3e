//! Console output formatting with ANSI color support.
//!
//! Provides styled terminal output with automatic TTY detection
//! and respect for the NO_COLOR environment variable.

use crate::scrapers::{ScrapedImageSet, SeriesCard, SeriesDetail};
use std::io::{self, IsTerminal};

/// ANSI style codes for terminal formatting.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Style {
    /// Returns the ANSI escape code for this style.
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Dim => "2",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
            Style::Gray => "90",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Console output handler with color support detection.
#[derive(Debug)]
pub struct Console {
    colors_enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Creates a new Console instance, detecting color support.
    ///
    /// Colors are disabled if `NO_COLOR` is set or stdout is not a terminal.
    pub fn new() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal();

        Self { colors_enabled }
    }

    /// Creates a Console with colors explicitly enabled or disabled.
    pub fn with_colors(enabled: bool) -> Self {
        Self {
            colors_enabled: enabled,
        }
    }

    /// Applies ANSI styles to text if colors are enabled.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors_enabled || styles.is_empty() {
            return text.to_string();
        }

        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    /// Creates a colored label like `[INFO]`.
    pub fn label(&self, label: &str, color: Style) -> String {
        let styled = self.style(label, &[color, Style::Bold]);
        format!("[{}]", styled)
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", self.label("INFO", Style::Blue), message);
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", self.label("OK", Style::Green), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", self.label("WARN", Style::Yellow), message);
    }

    pub fn step(&self, message: &str) {
        println!("{} {}", self.label("STEP", Style::Cyan), message);
    }

    /// Prints a section header in magenta bold.
    pub fn section(&self, message: &str) {
        println!();
        println!("{}", self.style(message, &[Style::Magenta, Style::Bold]));
    }

    /// Returns text styled as muted (dim gray).
    pub fn muted(&self, text: &str) -> String {
        self.style(text, &[Style::Gray, Style::Dim])
    }

    /// Formats a count with styling.
    pub fn count(&self, n: usize) -> String {
        self.style(&n.to_string(), &[Style::Green, Style::Bold])
    }

    /// Formats a numbered list, one entry per line.
    pub fn numbered(&self, items: &[String]) -> String {
        let width = items.len().to_string().len();
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let index = format!("{:>width$}.", i + 1, width = width);
                format!("  {} {}", self.muted(&index), item)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats the result of a page scrape.
    pub fn image_set(&self, set: &ScrapedImageSet) -> String {
        let mut out = Vec::new();
        for (title, items) in [
            ("Links", &set.links),
            ("Domains", &set.domains),
            ("Card URLs", &set.card_urls),
        ] {
            out.push(format!(
                "{} ({})",
                self.style(title, &[Style::Bold]),
                self.count(items.len())
            ));
            if !items.is_empty() {
                out.push(self.numbered(items));
            }
        }
        out.join("\n")
    }

    /// Formats one listing card: title line, then the first-chapter URL.
    pub fn series_card(&self, card: &SeriesCard) -> String {
        format!(
            "{} {} {}\n    {}",
            self.style(&card.title, &[Style::Bold]),
            self.style(&card.latest_chapter, &[Style::Cyan]),
            self.muted(&format!("[{}]", card.status)),
            card.url
        )
    }

    /// Formats a series detail with its chapter count and end points.
    pub fn series_detail(&self, detail: &SeriesDetail) -> String {
        let mut out = vec![self.style(&detail.title, &[Style::Magenta, Style::Bold])];
        if let Some(thumbnail) = &detail.thumbnail {
            out.push(format!("Thumbnail: {}", thumbnail));
        }
        if !detail.description.is_empty() {
            out.push(self.muted(&detail.description));
        }
        out.push(format!("Chapters: {}", self.count(detail.chapters.len())));
        if let Some(first) = detail.first_chapter() {
            out.push(format!("  first:  {} {}", first.title, self.muted(&first.url)));
        }
        if let Some(latest) = detail.latest_chapter() {
            out.push(format!("  latest: {} {}", latest.title, self.muted(&latest.url)));
        }
        out.join("\n")
    }
}
