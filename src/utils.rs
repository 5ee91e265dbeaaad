//! Text helpers for card content, log previews, and output paths.
//!
//! This module provides the small pieces of display cleanup the widget
//! applies to each post:
//! - Markup removal and snippet truncation for the article body
//! - Locale-style date formatting for the `published` timestamp
//! - Log-safe truncation of response bodies
//! - Output directory validation before writing the rendered page

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::Display;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Maximum snippet length in characters before the ellipsis.
pub const SNIPPET_MAX_CHARS: usize = 180;

/// Fallback body when a post has no `text`.
pub const NO_DESCRIPTION: &str = "No description available";

/// Rendered in place of a `published` value that cannot be parsed.
pub const INVALID_DATE: &str = "Invalid Date";

/// Default `published` format, matching an en-US `toLocaleDateString`.
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

/// Remove anything that looks like a markup tag.
///
/// Pattern-based removal: `<b>x</b>` becomes `x`, a lone `<` or `>` survives,
/// and entities are left as-is. Not a sanitizer; the result must still be
/// escaped before it is written into a page.
pub fn strip_markup(text: &str) -> String {
    TAG_RE.replace_all(text, "").into_owned()
}

/// Build the card snippet from a post body.
///
/// Falls back to [`NO_DESCRIPTION`], strips tags, then keeps at most
/// [`SNIPPET_MAX_CHARS`] characters, appending `...` only when something
/// was cut.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(make_snippet(Some("<i>hi</i>")), "hi");
/// assert_eq!(make_snippet(None), "No description available");
/// ```
pub fn make_snippet(text: Option<&str>) -> String {
    let plain = strip_markup(text.unwrap_or(NO_DESCRIPTION));
    match plain.char_indices().nth(SNIPPET_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &plain[..cut]),
        None => plain,
    }
}

/// Format a `published` timestamp as a date in `tz`.
///
/// Accepted inputs, tried in order:
/// - RFC 3339 (`2024-03-15T12:00:00.000+02:00`, `...Z`)
/// - ISO 8601 with a compact offset (`2024-03-15T12:00:00+0200`)
/// - date-time without offset, read as wall time in `tz`
/// - bare date, read as UTC midnight
///
/// Anything else renders as [`INVALID_DATE`].
pub fn format_published<Tz>(published: &str, tz: &Tz, format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let published = published.trim();

    let parsed = DateTime::parse_from_rfc3339(published)
        .or_else(|_| DateTime::parse_from_str(published, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.with_timezone(tz))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(published, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(published, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(tz))
        });

    match parsed {
        Some(dt) => dt.format(format).to_string(),
        None => {
            debug!(%published, "Unparseable published date");
            INVALID_DATE.to_string()
        }
    }
}

/// Whether `format` is a usable chrono format string.
pub fn is_valid_date_format(format: &str) -> bool {
    !format.is_empty() && StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary after `max` characters,
/// with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
        None => s.to_string(),
    }
}

/// Ensure the directory that will hold `output` exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub async fn ensure_output_dir(output: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let probe_path = dir.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}
