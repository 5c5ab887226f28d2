//! The fully-resolved session context.
//!
//! A [`SessionContext`] only ever exists fully populated: the pipeline
//! builds it stage by stage in private state and hands it out once the last
//! stage has succeeded. Downstream entity calls read its tokens and
//! header-construction fields and never mutate it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything subsequent API calls need to authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    // Identity
    pub account_name: String,
    pub account_full_name: String,
    pub account_url: String,
    pub region: String,
    pub organization_id: String,
    pub user_id: String,
    pub user_name: String,
    pub csrf_token: String,

    // Endpoints
    pub main_app_url: String,
    pub app_server_url: String,
    /// Canonical account host (private-link prefix normalized away), used in
    /// the identity header of every authenticated call.
    pub context_url: String,

    // Tokens
    pub client_id: String,
    pub auth_token_master: String,
    pub auth_token_session: String,
    /// Final application session cookie as a `name=value` pair; the artifact
    /// every subsequent API call authenticates with.
    pub auth_token_snowsight: String,

    // Defaults
    #[serde(default)]
    pub default_role: Option<String>,
    #[serde(default)]
    pub default_warehouse: Option<String>,
    pub server_version: String,

    pub saved_at: DateTime<Utc>,
}

impl SessionContext {
    /// `X-Snowflake-Context` header value: `{username}::{contextURL}`.
    #[must_use]
    pub fn context_header(&self) -> String {
        format!("{}::{}", self.user_name, self.context_url)
    }

    /// Referer used on authenticated calls: the main app URL with a
    /// trailing slash.
    #[must_use]
    pub fn referer(&self) -> String {
        format!("{}/", self.main_app_url.trim_end_matches('/'))
    }

    /// Filesystem-safe stem for persisting this context.
    #[must_use]
    pub fn file_stem(&self) -> String {
        fn safe(s: &str) -> String {
            s.chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect()
        }
        format!("context.{}.{}", safe(&self.account_name), safe(&self.user_name))
    }
}

impl std::fmt::Display for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "user {}({})@{}({}), Snowsight at {} served by {}",
            self.user_name,
            self.user_id,
            self.account_full_name,
            self.organization_id,
            self.account_url,
            self.app_server_url
        )
    }
}

/// Strip any `privatelink.` host-prefix fragment (case-insensitive) from an
/// account URL to form the canonical context URL.
///
/// Idempotent: a URL without the fragment passes through unchanged.
#[must_use]
pub fn normalize_private_link(url: &str) -> String {
    const FRAGMENT: &str = "privatelink.";
    let mut out = url.to_string();
    loop {
        let lower = out.to_lowercase();
        let Some(pos) = lower.find(FRAGMENT) else {
            return out;
        };
        out.replace_range(pos..pos + FRAGMENT.len(), "");
    }
}
