//! Data models for the News API Lite response.
//!
//! This module defines the structures decoded from the API body:
//! - [`Article`]: one post as returned by the API
//! - [`Thread`]: the nested thread object carrying the main image
//! - [`ArticleList`]: the decoded `posts` sequence, or the empty state
//!
//! Posts are read field by field from loose JSON. Every field is optional:
//! a field of the wrong type is dropped, non-empty strings are kept, and
//! truthy numbers and `true` are kept as their text. Empty strings, zero
//! and `false` are folded into `None` so that display fallbacks apply to
//! them the same way they apply to missing fields.

use crate::error::FetchError;
use serde_json::{Map, Value};

/// A single news post.
///
/// Unknown fields in the API payload (there are many) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    /// Headline of the post.
    pub title: Option<String>,
    /// Link to the original article.
    pub url: Option<String>,
    /// Publication timestamp, ISO-8601-ish.
    pub published: Option<String>,
    /// Body text; may contain markup.
    pub text: Option<String>,
    /// Thread metadata.
    pub thread: Option<Thread>,
}

/// Thread metadata attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thread {
    /// URL of the thread's lead image.
    pub main_image: Option<String>,
}

impl Article {
    /// Read one entry of `posts`.
    ///
    /// `null` has no fields to read and is rejected. Any other non-object
    /// entry becomes a post with every field absent.
    pub fn from_value(value: &Value) -> Result<Self, FetchError> {
        match value {
            Value::Null => Err(FetchError::MalformedJson(
                "post is null; expected an object".to_string(),
            )),
            Value::Object(post) => Ok(Article {
                title: text_field(post, "title"),
                url: text_field(post, "url"),
                published: text_field(post, "published"),
                text: text_field(post, "text"),
                thread: match post.get("thread") {
                    Some(Value::Object(thread)) => Some(Thread {
                        main_image: text_field(thread, "main_image"),
                    }),
                    _ => None,
                },
            }),
            _ => Ok(Article::default()),
        }
    }

    /// The post's lead image, if the thread carries one.
    pub fn main_image(&self) -> Option<&str> {
        self.thread
            .as_ref()
            .and_then(|thread| thread.main_image.as_deref())
    }
}

/// Decoded `posts` of a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleList {
    /// `posts` was missing, not a sequence, or empty.
    Empty,
    /// The posts, in the order the API returned them.
    Posts(Vec<Article>),
}

impl ArticleList {
    /// Decode a response body.
    ///
    /// Invalid JSON and `null` posts are errors. A body without a usable
    /// `posts` sequence is the valid [`ArticleList::Empty`] state.
    pub fn from_body(body: &str) -> Result<Self, FetchError> {
        let value: Value = serde_json::from_str(body)?;
        let posts = match value {
            Value::Object(mut map) => match map.remove("posts") {
                Some(Value::Array(posts)) if !posts.is_empty() => posts,
                _ => return Ok(ArticleList::Empty),
            },
            _ => return Ok(ArticleList::Empty),
        };

        let articles = posts
            .iter()
            .map(Article::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ArticleList::Posts(articles))
    }
}

/// Display text of a scalar field, or `None` when it is absent or falsy.
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => number_text(n),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn number_text(n: &serde_json::Number) -> Option<String> {
    if let Some(i) = n.as_i64() {
        return (i != 0).then(|| i.to_string());
    }
    if let Some(u) = n.as_u64() {
        return Some(u.to_string());
    }
    let f = n.as_f64()?;
    if f == 0.0 || f.is_nan() {
        None
    } else if f.fract() == 0.0 && f.abs() < 1e15 {
        Some(format!("{}", f as i64))
    } else {
        Some(f.to_string())
    }
}
