//! Typed failures for the widget render pipeline.
//!
//! Nothing here is ever surfaced to the caller of [`crate::widget::NewsWidget::render`]
//! as an `Err`. Abort-class errors are only logged; fetch-class errors are
//! logged and rendered inline in the container.

use thiserror::Error;

/// Errors that abort a render before the container is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    /// `token` or `query` was absent or empty.
    #[error("Error: 'token' and 'query' are required fields.")]
    MissingRequiredField,

    /// The container reference did not resolve to an element.
    #[error("Error: container element not found.")]
    ContainerNotFound,
}

/// Failure of the single asynchronous step: the request and the body decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("Network response was not ok ({0})")]
    Status(u16),

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("{0}")]
    Transport(String),

    /// The body was not valid JSON, or a post was `null`.
    #[error("{0}")]
    MalformedJson(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Transport(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::MalformedJson(e.to_string())
    }
}
