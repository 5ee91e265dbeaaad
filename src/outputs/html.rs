//! HTML output for the rendered host page.
//!
//! The whole [`Document`] is serialized, so a host page passed on the
//! command line keeps its surrounding markup and only the container
//! changes.

use crate::api::NewsSource;
use crate::config::WidgetConfig;
use crate::dom::Document;
use crate::utils::ensure_output_dir;
use crate::widget::{NewsWidget, RenderOutcome};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Render into `doc`, then write the page to `output`.
///
/// An aborted render returns its error before anything is created on disk.
/// Every other outcome, inline errors included, is written.
pub async fn render_to_file<S: NewsSource>(
    widget: &NewsWidget<S>,
    doc: &mut Document,
    config: &WidgetConfig,
    output: &Path,
) -> Result<RenderOutcome, Box<dyn Error>> {
    let outcome = widget.render(doc, config).await;
    if let RenderOutcome::Aborted(e) = &outcome {
        return Err(e.clone().into());
    }

    if let Err(e) = ensure_output_dir(output).await {
        error!(
            path = %output.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    write_page(doc, output).await?;
    Ok(outcome)
}

/// Write `doc` to `output`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub async fn write_page(doc: &Document, output: &Path) -> Result<(), Box<dyn Error>> {
    let html = doc.to_html();
    if let Err(e) = fs::write(output, &html).await {
        error!(error = %e, "Failed writing HTML page");
        return Err(e.into());
    }
    info!(bytes = html.len(), "Wrote HTML page");
    Ok(())
}

/// Read a host page from disk.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_host_page(path: &Path) -> Result<Document, Box<dyn Error>> {
    let source = fs::read_to_string(path).await?;
    let doc = Document::parse_html(&source);
    info!(bytes = source.len(), "Loaded host page");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    struct StaticSource(&'static str);

    impl NewsSource for StaticSource {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_aborted_render_leaves_disk_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("out");
        let output = nested.join("page.html");
        let widget = NewsWidget::new(StaticSource(r#"{"posts": [{"title": "a"}]}"#));
        let mut doc = Document::with_container("news-widget");

        let missing_query = WidgetConfig::new("tok", "", "#news-widget");
        assert!(render_to_file(&widget, &mut doc, &missing_query, &output).await.is_err());

        let missing_container = WidgetConfig::new("tok", "rust", "#elsewhere");
        assert!(render_to_file(&widget, &mut doc, &missing_container, &output).await.is_err());

        assert!(!nested.exists());
    }

    #[tokio::test]
    async fn test_render_to_file_creates_dir_and_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("out/page.html");
        let widget = NewsWidget::new(StaticSource(r#"{"posts": [{"title": "a"}]}"#));
        let mut doc = Document::with_container("news-widget");

        let outcome = render_to_file(
            &widget,
            &mut doc,
            &WidgetConfig::new("tok", "rust", "#news-widget"),
            &output,
        )
        .await
        .unwrap();

        assert_eq!(outcome, RenderOutcome::Rendered { cards: 1 });
        let written = tokio::fs::read_to_string(&output).await.unwrap();
        assert!(written.contains(">a</a>"));
    }

    #[tokio::test]
    async fn test_write_then_read_host_page() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("page.html");

        let mut doc = Document::with_container("news-widget");
        let container = doc.query_selector("#news-widget").unwrap();
        doc.append_text(container, "Fish & chips");
        write_page(&doc, &path).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
        assert!(written.contains(r#"<div id="news-widget">Fish &amp; chips</div>"#));

        let reread = read_host_page(&path).await.unwrap();
        let container = reread.query_selector("#news-widget").unwrap();
        assert_eq!(reread.text_content(container), "Fish & chips");
    }

    #[tokio::test]
    async fn test_write_page_into_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing/page.html");
        assert!(write_page(&Document::new(), &path).await.is_err());
    }
}
