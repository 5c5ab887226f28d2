//! Typed reply shapes for the Snowsight endpoints.
//!
//! One record per endpoint reply, validated at the boundary; field names are
//! part of the wire contract and must stay byte-for-byte as the service
//! emits them. Missing or mistyped fields surface as `NotFound` or
//! `InvalidCredential` in the stage that consumes them instead of nulls
//! propagating downstream.

use serde::Deserialize;
use serde_json::Value;

/// Reply of `GET v0/validate-snowflake-url?url={account}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateUrlReply {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default, rename = "appServerUrl")]
    pub app_server_url: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Envelope shared by the login-shaped endpoints
/// (`session/v1/login-request`, `session/authenticate-request`,
/// `session/authenticator-request`, `oauth/authorization-request`).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerReply<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ServerReply<T> {
    /// Server-supplied failure message, or a placeholder when absent.
    #[must_use]
    pub fn message_or_default(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "no message".to_string())
    }

    /// Server-supplied failure code, or a placeholder when absent.
    #[must_use]
    pub fn code_or_default(&self) -> String {
        self.code.clone().unwrap_or_else(|| "no code".to_string())
    }
}

/// `data` of a successful `session/v1/login-request` or
/// `session/authenticate-request`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginData {
    #[serde(default, rename = "masterToken")]
    pub master_token: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "serverVersion")]
    pub server_version: Option<String>,
}

/// `data` of a successful `session/authenticator-request`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthenticatorData {
    #[serde(default, rename = "ssoUrl")]
    pub sso_url: Option<String>,
    #[serde(default, rename = "proofKey")]
    pub proof_key: Option<String>,
    #[serde(default, rename = "tokenUrl")]
    pub token_url: Option<String>,
}

/// `data` of an `oauth/authorization-request` reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeData {
    #[serde(default, rename = "redirectUrl")]
    pub redirect_url: Option<String>,
    #[serde(default, rename = "nextAction")]
    pub next_action: Option<String>,
}

/// Reply of the authenticated `GET bootstrap`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapReply {
    #[serde(default, rename = "User")]
    pub user: Option<BootstrapUser>,
    #[serde(default, rename = "Org")]
    pub org: Option<BootstrapOrg>,
    #[serde(default, rename = "PageParams")]
    pub page_params: Option<BootstrapPageParams>,
    #[serde(default, rename = "BuildVersion")]
    pub build_version: Option<String>,
}

/// `User` object from bootstrap. The id arrives as a JSON number on most
/// deployments, but nothing guarantees it, so it is kept loose and rendered
/// through [`id_to_string`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapUser {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, rename = "defaultOrgId")]
    pub default_org_id: Option<String>,
    #[serde(default)]
    pub settings: Option<BootstrapUserSettings>,
}

/// `User.settings` from bootstrap.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapUserSettings {
    #[serde(default, rename = "defaultRole")]
    pub default_role: Option<String>,
    #[serde(default, rename = "defaultWarehouse")]
    pub default_warehouse: Option<String>,
}

/// `Org` object from bootstrap.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapOrg {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub settings: Option<BootstrapOrgSettings>,
}

/// `Org.settings` from bootstrap; `paramConfigs` is the filter list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapOrgSettings {
    #[serde(default, rename = "paramConfigs")]
    pub param_configs: Option<Vec<Value>>,
}

/// `PageParams` object from bootstrap.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapPageParams {
    #[serde(default, rename = "csrfToken")]
    pub csrf_token: Option<String>,
}

/// Render a loosely-typed id (JSON number or string) as a non-empty string.
#[must_use]
pub fn id_to_string(id: Option<&Value>) -> Option<String> {
    match id? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_reply_parses_success_shape() {
        let raw = r#"{"success":true,"data":{"masterToken":"M1","token":"S1","serverVersion":"8.4.1"}}"#;
        let reply: ServerReply<LoginData> = serde_json::from_str(raw).unwrap();
        assert!(reply.success);
        let data = reply.data.unwrap();
        assert_eq!(data.master_token.as_deref(), Some("M1"));
        assert_eq!(data.token.as_deref(), Some("S1"));
        assert_eq!(data.server_version.as_deref(), Some("8.4.1"));
    }

    #[test]
    fn login_reply_parses_rejection_shape() {
        let raw = r#"{"data":{"nextAction":"RETRY_LOGIN"},"code":"390100","message":"Incorrect username or password was specified.","success":false,"headers":null}"#;
        let reply: ServerReply<LoginData> = serde_json::from_str(raw).unwrap();
        assert!(!reply.success);
        assert_eq!(reply.code_or_default(), "390100");
    }

    #[test]
    fn bootstrap_ids_accept_numbers_and_strings() {
        let raw = r#"{"User":{"id":12345,"defaultOrgId":"org-77"},"Org":{"id":"org-77"},"PageParams":{"csrfToken":"c"}}"#;
        let reply: BootstrapReply = serde_json::from_str(raw).unwrap();
        assert_eq!(
            id_to_string(reply.user.as_ref().and_then(|u| u.id.as_ref())),
            Some("12345".to_string())
        );
        assert_eq!(
            id_to_string(reply.org.as_ref().and_then(|o| o.id.as_ref())),
            Some("org-77".to_string())
        );
    }
}
