//! Komikku CLI - manga reader scraping backend.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use komikku::config::Config;
use komikku::console::Console;
use komikku::scrapers::{MangaReaderScraper, Scraper, SeriesQuery};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Scraping backend for MangaReader-theme manga sites.
#[derive(Parser, Debug)]
#[command(name = "komikku")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Interface to bind (overrides config).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config).
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,
    },

    /// Collect image links, hosts and card URLs from a page.
    Scrape { url: String },

    /// List the page images of a chapter.
    Chapter { url: String },

    /// Show a series and its chapter list.
    Series { slug: String },

    /// List one page of series cards.
    List {
        /// Listing type, e.g. `manhwa`.
        kind: String,

        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        order: Option<String>,
    },
}

fn init_tracing(config: &Config) {
    let default = if config.scraping.debug {
        "info,komikku=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    let mut config = load_config(args.config.as_ref())?;
    init_tracing(&config);

    match args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            console.section("Komikku");
            console.info(&format!("Source: {}", config.scraping.base_url));
            if !config.alerts.is_configured() {
                console.warning("Telegram alerts not configured, alerts go to the log");
            }
            komikku::server::serve(&config).await
        }
        command => run_once(command, &config, &console).await,
    }
}

/// Runs a single scrape and prints the result.
async fn run_once(command: Command, config: &Config, console: &Console) -> Result<()> {
    let scraper = MangaReaderScraper::new(config).context("Failed to create scraper")?;
    console.info(&format!("Using {} scraper", scraper.name()));

    match command {
        Command::Scrape { url } => {
            console.step(&format!("Scraping {}", url));
            let data = scraper
                .scrape_page(&url)
                .await
                .context("Failed to scrape page")?;

            if data.is_empty() {
                console.warning("No images found");
            } else {
                console.success(&format!("Found {} images", data.links.len()));
            }
            println!("{}", console.image_set(&data));
        }
        Command::Chapter { url } => {
            console.step(&format!("Fetching chapter {}", url));
            let result = scraper
                .fetch_chapter_images(&url)
                .await
                .context("Failed to fetch chapter")?;

            if result.is_empty() {
                anyhow::bail!("No images found from the specified source");
            }
            console.success(&format!("Found {} pages", console.count(result.images.len())));
            println!("{}", console.numbered(&result.images));
        }
        Command::Series { slug } => {
            console.step(&format!("Fetching series {}", slug));
            let detail = scraper
                .get_series_detail(&slug)
                .await
                .context("Failed to fetch series detail")?;

            console.success("Series found");
            println!("{}", console.series_detail(&detail));
        }
        Command::List {
            kind,
            page,
            status,
            order,
        } => {
            console.step(&format!("Fetching {} listing, page {}", kind, page));
            let mut query = SeriesQuery::new(kind);
            query.page = page;
            query.status = status;
            query.order = order;

            let listing = scraper
                .get_series_list(&query)
                .await
                .context("Failed to fetch series")?;

            console.success(&format!(
                "Page {} of {}, {} series",
                listing.current_page,
                listing.total_pages,
                console.count(listing.series.len())
            ));
            for card in &listing.series {
                println!("{}", console.series_card(card));
            }
        }
        Command::Serve { .. } => anyhow::bail!("serve does not run as a one-shot command"),
    }

    Ok(())
}
