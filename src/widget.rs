//! The news widget render pipeline.
//!
//! One render walks through these states:
//!
//! ```text
//! Idle → Validating → (Aborted | ContainerResolved) → Loading → (Error | Empty | Rendered)
//! ```
//!
//! The pipeline is split at its single suspension point:
//! 1. [`NewsWidget::prepare`]: validate, resolve the container, style it and
//!    show the loading placeholder. Aborts leave the document untouched.
//! 2. [`NewsSource::fetch`]: the network call, decoded into an [`ArticleList`].
//! 3. [`NewsWidget::settle`]: replace the placeholder with cards, the empty
//!    message or an inline error.
//!
//! [`NewsWidget::render`] chains all three. Failures never come back as an
//! `Err`; they are logged and, once the container is known, rendered.

use crate::api::{DEFAULT_BASE_URL, NewsSource, build_request_url};
use crate::config::{ContainerRef, ResolvedStyles, WidgetConfig};
use crate::dom::{Document, ElementId};
use crate::error::{FetchError, WidgetError};
use crate::models::{Article, ArticleList};
use crate::utils::{
    DEFAULT_DATE_FORMAT, format_published, is_valid_date_format, make_snippet, truncate_for_log,
};
use chrono::Local;
use tracing::{debug, error, info, instrument, warn};

pub const LOADING_TEXT: &str = "Loading news...";
pub const EMPTY_TEXT: &str = "No news found.";
pub const NO_TITLE: &str = "No title available";
pub const NO_DATE: &str = "No date";
pub const IMAGE_ALT_FALLBACK: &str = "Article image";
pub const ATTRIBUTION_URL: &str = "https://webz.io/products/news-api#lite";
pub const ATTRIBUTION_LABEL: &str = "Webz.io News API";

const IMAGE_COLUMN_WIDTH: &str = "100px";
const LINK_REL: &str = "noopener noreferrer";

/// Terminal state of one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Validation or container resolution failed; nothing was touched.
    Aborted(WidgetError),
    /// The fetch failed; the container shows an inline error.
    Error(FetchError),
    /// The response had no posts; the container shows [`EMPTY_TEXT`].
    Empty,
    /// One card per post was rendered, followed by the attribution line.
    Rendered { cards: usize },
}

/// A render parked in the loading state, waiting for its fetch result.
#[derive(Debug, Clone)]
pub struct PendingRender {
    container: ElementId,
    request_url: String,
    show_image: bool,
    show_text: bool,
    styles: ResolvedStyles,
    date_format: String,
}

impl PendingRender {
    /// The resolved container.
    pub fn container(&self) -> ElementId {
        self.container
    }

    /// The URL the fetch step will request.
    pub fn request_url(&self) -> &str {
        &self.request_url
    }
}

/// Renders News API Lite results into a [`Document`].
#[derive(Debug)]
pub struct NewsWidget<S> {
    source: S,
    base_url: String,
}

impl<S: NewsSource> NewsWidget<S> {
    /// A widget querying [`DEFAULT_BASE_URL`] through `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Query another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run a full render against `doc`.
    ///
    /// The exclusive borrow of `doc` lasts until the render settles, so two
    /// renders on one document cannot interleave.
    #[instrument(level = "info", skip_all, fields(query = %config.query))]
    pub async fn render(&self, doc: &mut Document, config: &WidgetConfig) -> RenderOutcome {
        let pending = match self.prepare(doc, config) {
            Ok(pending) => pending,
            Err(e) => return RenderOutcome::Aborted(e),
        };
        let result = self.fetch_articles(&pending.request_url).await;
        self.settle(doc, pending, result)
    }

    /// Validate `config`, resolve and style the container, show the loading
    /// placeholder.
    ///
    /// On error the document is left exactly as it was and the failure has
    /// already been logged.
    pub fn prepare(
        &self,
        doc: &mut Document,
        config: &WidgetConfig,
    ) -> Result<PendingRender, WidgetError> {
        debug!("validating widget config");
        if !config.has_required_fields() {
            let e = WidgetError::MissingRequiredField;
            error!("{}", e);
            return Err(e);
        }

        let Some(container) = resolve_container(doc, &config.container) else {
            let e = WidgetError::ContainerNotFound;
            error!(container = ?config.container, "{}", e);
            return Err(e);
        };

        let styles = config.styles.resolve();
        apply_container_styles(doc, container, config, &styles);
        show_message(doc, container, LOADING_TEXT);

        let date_format = if is_valid_date_format(&config.date_format) {
            config.date_format.clone()
        } else {
            warn!(format = %config.date_format, "Invalid date format; using default");
            DEFAULT_DATE_FORMAT.to_string()
        };

        Ok(PendingRender {
            container,
            request_url: build_request_url(&self.base_url, &config.token, &config.query),
            show_image: config.show_image,
            show_text: config.show_text,
            styles,
            date_format,
        })
    }

    /// Fetch and decode the response for `url`.
    pub async fn fetch_articles(&self, url: &str) -> Result<ArticleList, FetchError> {
        let body = self.source.fetch(url).await?;
        ArticleList::from_body(&body).inspect_err(|e| {
            warn!(
                error = %e,
                body_preview = %truncate_for_log(&body, 300),
                "Response body could not be decoded"
            )
        })
    }

    /// Apply a fetch result to a pending render.
    pub fn settle(
        &self,
        doc: &mut Document,
        pending: PendingRender,
        result: Result<ArticleList, FetchError>,
    ) -> RenderOutcome {
        let container = pending.container;
        match result {
            Err(e) => {
                error!(error = %e, "Error fetching news");
                show_message(doc, container, &format!("Error fetching news: {}", e));
                RenderOutcome::Error(e)
            }
            Ok(ArticleList::Empty) => {
                info!("No news found");
                show_message(doc, container, EMPTY_TEXT);
                RenderOutcome::Empty
            }
            Ok(ArticleList::Posts(posts)) => {
                doc.clear_children(container);
                for article in &posts {
                    let card = build_card(doc, article, &pending);
                    doc.append_child(container, card);
                }
                let footer = build_attribution(doc);
                doc.append_child(container, footer);
                info!(cards = posts.len(), "Rendered news widget");
                RenderOutcome::Rendered { cards: posts.len() }
            }
        }
    }
}

fn resolve_container(doc: &Document, container: &ContainerRef) -> Option<ElementId> {
    match container {
        ContainerRef::Element(id) => doc.contains(*id).then_some(*id),
        ContainerRef::Selector(selector) => doc.query_selector(selector),
    }
}

fn apply_container_styles(
    doc: &mut Document,
    container: ElementId,
    config: &WidgetConfig,
    styles: &ResolvedStyles,
) {
    doc.set_style(container, "box-sizing", "border-box");
    doc.set_style(container, "width", &config.width);
    doc.set_style(container, "height", &config.height);
    doc.set_style(container, "overflow", "auto");
    doc.set_style(container, "background-color", &styles.background_color);
    doc.set_style(
        container,
        "border",
        &format!("1px solid {}", styles.border_color),
    );
    doc.set_style(container, "font-family", &styles.font_family);
    doc.set_style(container, "padding", "10px");
}

/// Replace the container's content with a single `<p>`.
fn show_message(doc: &mut Document, container: ElementId, text: &str) {
    doc.clear_children(container);
    let p = doc.create_element("p");
    doc.append_text(p, text);
    doc.append_child(container, p);
}

fn build_card(doc: &mut Document, article: &Article, pending: &PendingRender) -> ElementId {
    let styles = &pending.styles;
    let card = doc.create_element("div");
    doc.set_style(card, "display", "flex");
    doc.set_style(card, "margin-bottom", "20px");

    if pending.show_image {
        let column = doc.create_element("div");
        doc.set_style(column, "flex", &format!("0 0 {}", IMAGE_COLUMN_WIDTH));
        doc.set_style(column, "margin-right", "10px");

        if let Some(src) = article.main_image() {
            let img = doc.create_element("img");
            doc.set_attr(img, "src", src);
            doc.set_attr(
                img,
                "alt",
                article.title.as_deref().unwrap_or(IMAGE_ALT_FALLBACK),
            );
            doc.set_style(img, "width", IMAGE_COLUMN_WIDTH);
            doc.set_style(img, "height", "auto");
            doc.set_style(img, "object-fit", "cover");
            doc.append_child(column, img);
        }
        doc.append_child(card, column);
    }

    let text_column = doc.create_element("div");
    doc.set_style(text_column, "flex", "1");

    let link = doc.create_element("a");
    doc.set_attr(link, "href", article.url.as_deref().unwrap_or("#"));
    doc.set_attr(link, "target", "_blank");
    doc.set_attr(link, "rel", LINK_REL);
    doc.append_text(link, article.title.as_deref().unwrap_or(NO_TITLE));
    doc.set_style(link, "text-decoration", "none");
    doc.set_style(link, "color", &styles.link_color);
    doc.set_style(link, "font-size", &styles.link_font_size);
    doc.set_style(link, "display", "block");
    doc.set_style(link, "margin-bottom", "5px");
    doc.append_child(text_column, link);

    let date = doc.create_element("div");
    let date_text = match article.published.as_deref() {
        Some(published) => format_published(published, &Local, &pending.date_format),
        None => NO_DATE.to_string(),
    };
    doc.append_text(date, &date_text);
    doc.set_style(date, "color", &styles.date_color);
    doc.set_style(date, "font-size", &styles.date_font_size);
    doc.set_style(date, "margin-bottom", "5px");
    doc.append_child(text_column, date);

    if pending.show_text {
        let snippet = doc.create_element("div");
        doc.append_text(snippet, &make_snippet(article.text.as_deref()));
        doc.set_style(snippet, "color", &styles.text_color);
        doc.set_style(snippet, "font-size", &styles.text_font_size);
        doc.set_style(snippet, "margin-top", "5px");
        doc.append_child(text_column, snippet);
    }

    doc.append_child(card, text_column);
    card
}

fn build_attribution(doc: &mut Document) -> ElementId {
    let footer = doc.create_element("div");
    doc.set_style(footer, "font-size", "12px");
    doc.set_style(footer, "margin-top", "10px");
    doc.set_style(footer, "text-align", "right");
    doc.append_text(footer, "Powered by ");

    let link = doc.create_element("a");
    doc.set_attr(link, "href", ATTRIBUTION_URL);
    doc.set_attr(link, "target", "_blank");
    doc.set_attr(link, "rel", LINK_REL);
    doc.append_text(link, ATTRIBUTION_LABEL);
    doc.append_child(footer, link);
    footer
}
