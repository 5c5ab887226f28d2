//! Organization and user context from the bootstrap endpoint.
//!
//! Final pipeline stage: one authenticated GET that resolves the ids and
//! CSRF token every entity call needs.

use tracing::info;

use crate::core::http::{ApiClient, RequestOptions};
use crate::core::models::{self, BootstrapReply};
use crate::error::{Result, SightError};

/// What bootstrap resolves.
#[derive(Debug, Clone)]
pub struct BootstrapContext {
    pub organization_id: String,
    pub user_id: String,
    pub csrf_token: String,
    pub default_role: Option<String>,
    pub default_warehouse: Option<String>,
}

/// Fetch and parse the bootstrap reply.
///
/// `context_header` is `{username}::{contextURL}`; `session_cookie` is the
/// `name=value` pair from the token exchange.
///
/// # Errors
///
/// `NotFound` when the reply is empty or missing the user id or both
/// organization-id sources (`Org.id` and `User.defaultOrgId`).
pub async fn bootstrap(
    client: &ApiClient,
    app_server_url: &str,
    main_app_url: &str,
    context_header: &str,
    session_cookie: &str,
    user: &str,
    account: &str,
) -> Result<BootstrapContext> {
    let opts = RequestOptions {
        accept: Some("application/json".into()),
        context: Some(context_header.to_string()),
        referer: Some(format!("{}/", main_app_url.trim_end_matches('/'))),
        cookies: vec![session_cookie.to_string()],
        ..RequestOptions::default()
    };
    let response = client.get(app_server_url, "bootstrap", &opts).await?;

    if !response.is_usable() {
        return Err(SightError::NotFound(format!(
            "invalid response from getting organization context for user {user}@{account}"
        )));
    }

    let reply: BootstrapReply = serde_json::from_str(&response.body)?;
    parse_bootstrap(&reply, user, account)
}

/// Pull the ids and defaults out of a parsed reply.
///
/// Split from the network call so the fallback rules stay testable.
pub(crate) fn parse_bootstrap(
    reply: &BootstrapReply,
    user: &str,
    account: &str,
) -> Result<BootstrapContext> {
    let user_obj = reply.user.as_ref();
    let user_id = models::id_to_string(user_obj.and_then(|u| u.id.as_ref()));

    // Org.id is sometimes absent; fall back to the user's default org.
    let organization_id = models::id_to_string(reply.org.as_ref().and_then(|o| o.id.as_ref()))
        .or_else(|| {
            user_obj
                .and_then(|u| u.default_org_id.clone())
                .filter(|id| !id.is_empty())
        });

    let (Some(user_id), Some(organization_id)) = (user_id, organization_id) else {
        return Err(SightError::NotFound(format!(
            "unable to parse organization and user context for user {user}@{account}"
        )));
    };

    let csrf_token = reply
        .page_params
        .as_ref()
        .and_then(|p| p.csrf_token.clone())
        .unwrap_or_default();

    let settings = user_obj.and_then(|u| u.settings.as_ref());
    let context = BootstrapContext {
        organization_id,
        user_id,
        csrf_token,
        default_role: settings.and_then(|s| s.default_role.clone()),
        default_warehouse: settings.and_then(|s| s.default_warehouse.clone()),
    };

    info!(
        user,
        account,
        user_id = %context.user_id,
        organization_id = %context.organization_id,
        "organization and user context resolved"
    );

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(raw: &str) -> BootstrapReply {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn org_id_falls_back_to_default_org_id() {
        let parsed = parse_bootstrap(
            &reply(r#"{"User":{"id":7,"defaultOrgId":"org-9"},"PageParams":{"csrfToken":"c"}}"#),
            "JDOE",
            "acme",
        )
        .unwrap();
        assert_eq!(parsed.organization_id, "org-9");
        assert_eq!(parsed.user_id, "7");
        assert_eq!(parsed.csrf_token, "c");
    }

    #[test]
    fn missing_both_org_sources_is_fatal() {
        let err = parse_bootstrap(
            &reply(r#"{"User":{"id":7},"PageParams":{"csrfToken":"c"}}"#),
            "JDOE",
            "acme",
        )
        .unwrap_err();
        assert!(matches!(err, SightError::NotFound(_)));
    }

    #[test]
    fn missing_user_id_is_fatal() {
        let err = parse_bootstrap(
            &reply(r#"{"Org":{"id":"org-9"}}"#),
            "JDOE",
            "acme",
        )
        .unwrap_err();
        assert!(matches!(err, SightError::NotFound(_)));
    }

    #[test]
    fn defaults_come_from_user_settings() {
        let parsed = parse_bootstrap(
            &reply(
                r#"{"User":{"id":7,"settings":{"defaultRole":"SYSADMIN","defaultWarehouse":"WH"}},"Org":{"id":"o"}}"#,
            ),
            "JDOE",
            "acme",
        )
        .unwrap();
        assert_eq!(parsed.default_role.as_deref(), Some("SYSADMIN"));
        assert_eq!(parsed.default_warehouse.as_deref(), Some("WH"));
    }
}
