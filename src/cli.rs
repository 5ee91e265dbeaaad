//! Command-line interface definitions for the news widget renderer.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The token and base URL can also come from environment variables.

use crate::api::DEFAULT_BASE_URL;
use crate::config::{ContainerRef, WidgetConfig, WidgetFileConfig};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the news widget renderer.
///
/// Values given here override the YAML config file.
///
/// # Examples
///
/// ```sh
/// # Render into the built-in page
/// webz_news_widget --token $WEBZ_TOKEN --query "rust language" -o news.html
///
/// # Render into an existing page, without images
/// webz_news_widget -q "climate" --host-page index.html --container "#sidebar .news" --hide-images
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Webz.io News API Lite token
    #[arg(short, long, env = "WEBZ_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// News query
    #[arg(short, long, default_value = "")]
    pub query: String,

    /// Selector of the element to render into
    #[arg(short, long, default_value = "#news-widget")]
    pub container: String,

    /// HTML page to render into (defaults to a blank page holding the container)
    #[arg(long)]
    pub host_page: Option<PathBuf>,

    /// Where to write the rendered page
    #[arg(short, long, default_value = "news_widget.html")]
    pub output: PathBuf,

    /// Optional path to a YAML widget config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Do not render article images
    #[arg(long)]
    pub hide_images: bool,

    /// Do not render article snippets
    #[arg(long)]
    pub hide_text: bool,

    /// Widget width (CSS value)
    #[arg(long)]
    pub width: Option<String>,

    /// Widget height (CSS value)
    #[arg(long)]
    pub height: Option<String>,

    /// News API endpoint
    #[arg(long, env = "WEBZ_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,
}

impl Cli {
    /// Build the widget config: defaults, then `file`, then flags.
    pub fn widget_config(&self, file: Option<WidgetFileConfig>) -> WidgetConfig {
        let mut config = WidgetConfig::new(
            self.token.clone(),
            self.query.clone(),
            ContainerRef::Selector(self.container.clone()),
        );
        if let Some(file) = file {
            config.apply_file(file);
        }
        if self.hide_images {
            config.show_image = false;
        }
        if self.hide_text {
            config.show_text = false;
        }
        if let Some(width) = &self.width {
            config.width = width.clone();
        }
        if let Some(height) = &self.height {
            config.height = height.clone();
        }
        config
    }
}
