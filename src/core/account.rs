//! Account validation against the main application.
//!
//! First pipeline stage: turns an account identifier into the
//! per-deployment API base URL and region.

use tracing::{debug, info};

use crate::core::http::{ApiClient, RequestOptions};
use crate::core::models::ValidateUrlReply;
use crate::error::{Result, SightError};

/// Where a valid account lives.
#[derive(Debug, Clone)]
pub struct AccountEndpoints {
    /// `https://apps-api.c1.<region>...` deployment API host.
    pub app_server_url: String,
    /// `https://<account>.<region>.snowflakecomputing.com` account host.
    pub account_url: String,
    pub region: String,
}

/// Validate `account` against the main application and extract its
/// endpoints.
///
/// # Errors
///
/// `NotFound` when the validation endpoint marks the account invalid,
/// answers with an empty body, or omits a required field.
pub async fn resolve_account(
    client: &ApiClient,
    main_app_url: &str,
    account: &str,
) -> Result<AccountEndpoints> {
    let response = client
        .get(
            main_app_url,
            &format!("v0/validate-snowflake-url?url={account}"),
            &RequestOptions::default(),
        )
        .await?;

    if !response.is_usable() {
        return Err(SightError::NotFound(format!(
            "unable to get account endpoint for account {account} in {main_app_url}"
        )));
    }

    let reply: ValidateUrlReply = serde_json::from_str(&response.body)?;
    if !reply.valid {
        // {"valid":false} - account or region malformed
        return Err(SightError::NotFound(format!(
            "no valid account endpoint for account {account} in {main_app_url}"
        )));
    }

    let endpoints = AccountEndpoints {
        app_server_url: require(reply.app_server_url, account, "appServerUrl")?,
        account_url: require(reply.url, account, "url")?,
        region: require(reply.region, account, "region")?,
    };

    info!(
        account,
        region = %endpoints.region,
        app_server_url = %endpoints.app_server_url,
        "account validated"
    );
    debug!(account_url = %endpoints.account_url, "account host resolved");

    Ok(endpoints)
}

/// The account short name: everything before the first `.` of the full
/// identifier (`sfpscogs_dodievich_sso.west-us-2.azure` ->
/// `sfpscogs_dodievich_sso`).
#[must_use]
pub fn account_short_name(account_full_name: &str) -> &str {
    account_full_name
        .split('.')
        .next()
        .unwrap_or(account_full_name)
}

fn require(value: Option<String>, account: &str, field: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            SightError::NotFound(format!(
                "validation reply for account {account} is missing {field}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_cuts_at_first_dot() {
        assert_eq!(account_short_name("acme.us-east-1"), "acme");
        assert_eq!(account_short_name("plain"), "plain");
        assert_eq!(
            account_short_name("sfpscogs_dodievich_sso.west-us-2.azure"),
            "sfpscogs_dodievich_sso"
        );
    }
}
