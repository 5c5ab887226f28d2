//! Extraction of the page-global params object from the complete-OAuth HTML.
//!
//! The complete-OAuth endpoint answers with an HTML page whose `<script>`
//! block assigns a JSON object to a page-global variable:
//!
//! ```text
//! var params = {"account":"...","user":{"username":"ALT"},"org":{"url":"https://..."}};
//! ```
//!
//! That object carries the effective username (which can differ from the
//! login name) and the canonical account URL. The grammar this extractor
//! accepts is exactly `var params = {...}` on one line; the page-format
//! contract lives here and nowhere else.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::debug;

/// `user` object inside the page params.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageUser {
    #[serde(default)]
    pub username: Option<String>,
}

/// `org` object inside the page params.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageOrg {
    #[serde(default)]
    pub url: Option<String>,
}

/// The subset of the embedded params object the pipeline consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub user: Option<PageUser>,
    #[serde(default)]
    pub org: Option<PageOrg>,
}

impl PageParams {
    /// Effective username from the page, if present.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.username.as_deref())
    }

    /// Canonical account URL from the page, if present.
    #[must_use]
    pub fn org_url(&self) -> Option<&str> {
        self.org.as_ref().and_then(|o| o.url.as_deref())
    }
}

fn params_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)var params = (\{.*\})").expect("valid regex"))
}

/// Scan `html` for the embedded params object.
///
/// Returns `None` when the page has no params variable or the captured text
/// is not valid JSON; the caller falls back to deriving the context URL from
/// the account URL.
#[must_use]
pub fn extract_page_params(html: &str) -> Option<PageParams> {
    let captures = params_pattern().captures(html)?;
    let raw = captures.get(1)?.as_str();
    match serde_json::from_str::<PageParams>(raw) {
        Ok(params) => Some(params),
        Err(e) => {
            debug!("page params variable found but not parseable: {e}");
            None
        }
    }
}
