//! Widget configuration.
//!
//! A [`WidgetConfig`] is read once per render. Its style mapping is
//! resolved up front into [`ResolvedStyles`], so the render code never
//! deals with missing keys.
//!
//! Configuration comes from two places in the command-line program: an
//! optional YAML file ([`WidgetFileConfig`]) and the command line itself,
//! which wins on conflicts.
//!
//! ```yaml
//! showImage: false
//! width: 400px
//! dateFormat: "%d.%m.%Y"
//! styles:
//!   backgroundColor: "#fafafa"
//!   linkColor: "#aa0000"
//! ```

use crate::dom::ElementId;
use crate::utils::DEFAULT_DATE_FORMAT;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const DEFAULT_WIDTH: &str = "100%";
pub const DEFAULT_HEIGHT: &str = "auto";

/// Where the widget mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerRef {
    /// A live element of the target document.
    Element(ElementId),
    /// A selector resolved against the target document.
    Selector(String),
}

impl From<ElementId> for ContainerRef {
    fn from(id: ElementId) -> Self {
        ContainerRef::Element(id)
    }
}

impl From<&str> for ContainerRef {
    fn from(selector: &str) -> Self {
        ContainerRef::Selector(selector.to_string())
    }
}

/// Optional style overrides, keyed as in the embed options
/// (`backgroundColor`, `linkFontSize`, ...).
///
/// Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetStyles {
    pub background_color: Option<String>,
    pub border_color: Option<String>,
    pub font_family: Option<String>,
    pub link_color: Option<String>,
    pub link_font_size: Option<String>,
    pub text_color: Option<String>,
    pub text_font_size: Option<String>,
    pub date_color: Option<String>,
    pub date_font_size: Option<String>,
}

/// Every style value the widget uses, with defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStyles {
    pub background_color: String,
    pub border_color: String,
    pub font_family: String,
    pub link_color: String,
    pub link_font_size: String,
    pub text_color: String,
    pub text_font_size: String,
    pub date_color: String,
    pub date_font_size: String,
}

impl Default for ResolvedStyles {
    fn default() -> Self {
        WidgetStyles::default().resolve()
    }
}

fn pick(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

fn pick_over(over: Option<String>, base: Option<String>) -> Option<String> {
    over.filter(|v| !v.is_empty()).or(base)
}

impl WidgetStyles {
    /// Fill every unset key with its default.
    pub fn resolve(&self) -> ResolvedStyles {
        ResolvedStyles {
            background_color: pick(&self.background_color, "#ffffff"),
            border_color: pick(&self.border_color, "#cccccc"),
            font_family: pick(&self.font_family, "Arial, sans-serif"),
            link_color: pick(&self.link_color, "#0066cc"),
            link_font_size: pick(&self.link_font_size, "16px"),
            text_color: pick(&self.text_color, "#333333"),
            text_font_size: pick(&self.text_font_size, "14px"),
            date_color: pick(&self.date_color, "#999999"),
            date_font_size: pick(&self.date_font_size, "12px"),
        }
    }

    /// Layer `other` on top of `self`; set keys in `other` win.
    pub fn overlay(self, other: WidgetStyles) -> WidgetStyles {
        WidgetStyles {
            background_color: pick_over(other.background_color, self.background_color),
            border_color: pick_over(other.border_color, self.border_color),
            font_family: pick_over(other.font_family, self.font_family),
            link_color: pick_over(other.link_color, self.link_color),
            link_font_size: pick_over(other.link_font_size, self.link_font_size),
            text_color: pick_over(other.text_color, self.text_color),
            text_font_size: pick_over(other.text_font_size, self.text_font_size),
            date_color: pick_over(other.date_color, self.date_color),
            date_font_size: pick_over(other.date_font_size, self.date_font_size),
        }
    }
}

/// Everything one render needs.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// News API Lite token.
    pub token: String,
    /// Search query.
    pub query: String,
    /// Mount point.
    pub container: ContainerRef,
    pub show_image: bool,
    pub show_text: bool,
    pub styles: WidgetStyles,
    pub width: String,
    pub height: String,
    /// chrono format string for the `published` line.
    pub date_format: String,
}

impl WidgetConfig {
    /// A config with every optional setting at its default.
    pub fn new(
        token: impl Into<String>,
        query: impl Into<String>,
        container: impl Into<ContainerRef>,
    ) -> Self {
        Self {
            token: token.into(),
            query: query.into(),
            container: container.into(),
            show_image: true,
            show_text: true,
            styles: WidgetStyles::default(),
            width: DEFAULT_WIDTH.to_string(),
            height: DEFAULT_HEIGHT.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// True when both required fields are non-empty. Whitespace counts.
    pub fn has_required_fields(&self) -> bool {
        !self.token.is_empty() && !self.query.is_empty()
    }

    /// Apply values from a config file.
    pub fn apply_file(&mut self, file: WidgetFileConfig) {
        if let Some(show_image) = file.show_image {
            self.show_image = show_image;
        }
        if let Some(show_text) = file.show_text {
            self.show_text = show_text;
        }
        if let Some(width) = file.width.filter(|w| !w.is_empty()) {
            self.width = width;
        }
        if let Some(height) = file.height.filter(|h| !h.is_empty()) {
            self.height = height;
        }
        if let Some(format) = file.date_format.filter(|f| !f.is_empty()) {
            self.date_format = format;
        }
        self.styles = std::mem::take(&mut self.styles).overlay(file.styles);
    }
}

/// The YAML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetFileConfig {
    pub show_image: Option<bool>,
    pub show_text: Option<bool>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub date_format: Option<String>,
    pub styles: WidgetStyles,
}

/// Load a [`WidgetFileConfig`] from a YAML file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_file_config(path: &Path) -> Result<WidgetFileConfig, Box<dyn Error>> {
    let raw = fs::read_to_string(path).await?;
    let config: WidgetFileConfig = serde_yaml::from_str(&raw)?;
    info!("Loaded widget config file");
    Ok(config)
}
