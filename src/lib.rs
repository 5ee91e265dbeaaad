//! # Webz News Widget
//!
//! Renders articles from the Webz.io News API Lite into a styled widget
//! inside an HTML [`dom::Document`].
//!
//! ```ignore
//! use std::time::Duration;
//! use webz_news_widget::api::WebzClient;
//! use webz_news_widget::config::WidgetConfig;
//! use webz_news_widget::dom::Document;
//! use webz_news_widget::widget::NewsWidget;
//!
//! let mut doc = Document::with_container("news");
//! let widget = NewsWidget::new(WebzClient::new(Duration::from_secs(15))?);
//! let outcome = widget
//!     .render(&mut doc, &WidgetConfig::new(token, "rust language", "#news"))
//!     .await;
//! ```
//!
//! ## Modules
//!
//! - [`widget`]: the render pipeline
//! - [`api`]: the fetch seam and its HTTP implementation
//! - [`dom`]: the element tree the widget mounts into
//! - [`config`], [`models`], [`error`], [`utils`]: supporting types and helpers
//! - [`outputs`]: reading host pages and writing rendered ones

pub mod api;
pub mod cli;
pub mod config;
pub mod dom;
pub mod error;
pub mod models;
pub mod outputs;
pub mod utils;
pub mod widget;
