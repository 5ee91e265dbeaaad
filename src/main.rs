//! # Webz News Widget
//!
//! Renders articles from the Webz.io News API Lite into a styled widget
//! inside an HTML page.
//!
//! ## Features
//!
//! - One request per run against `newsApiLite`, query percent-encoded
//! - Article cards with image, title link, date and a tag-stripped snippet
//! - Style overrides from a YAML file or flags; image/snippet toggles
//! - Renders into the built-in page or any host page, selected by CSS-like selector
//!
//! ## Usage
//!
//! ```sh
//! WEBZ_TOKEN=... webz_news_widget -q "rust language" -o ./news.html
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: CLI flags layered over an optional YAML file
//! 2. **Mounting**: load the host page and resolve the container
//! 3. **Rendering**: fetch, decode and build the cards
//! 4. **Output**: write the page back to disk

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use webz_news_widget::api::{WebzClient, validate_base_url};
use webz_news_widget::cli::Cli;
use webz_news_widget::config;
use webz_news_widget::dom::Document;
use webz_news_widget::outputs::html;
use webz_news_widget::widget::NewsWidget;

/// Id of the container in the built-in host page.
const DEFAULT_CONTAINER_ID: &str = "news-widget";

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("webz_news_widget starting up");

    let args = Cli::parse();
    debug!(?args.output, ?args.host_page, container = %args.container, "Parsed CLI arguments");

    let base_url = validate_base_url(&args.base_url).map_err(|e| {
        error!(base_url = %args.base_url, error = %e, "Rejected base URL");
        e
    })?;

    let file_config = match &args.config {
        Some(path) => Some(config::load_file_config(path).await?),
        None => None,
    };
    let widget_config = args.widget_config(file_config);

    // ---- Mount ----
    let mut document = match &args.host_page {
        Some(path) => html::read_host_page(path).await?,
        None => Document::with_container(DEFAULT_CONTAINER_ID),
    };

    // ---- Render & output ----
    let client = WebzClient::new(Duration::from_secs(args.timeout_secs))?;
    let widget = NewsWidget::new(client).with_base_url(base_url);
    let outcome =
        html::render_to_file(&widget, &mut document, &widget_config, &args.output).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        ?outcome,
        output = %args.output.display(),
        "Execution complete"
    );

    Ok(())
}
