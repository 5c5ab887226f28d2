//! Primary authentication against the account's classic login endpoint.
//!
//! Two interchangeable strategies, selected once at pipeline entry and never
//! mixed within one session: username/password, and browser SSO through the
//! loopback listener. Both yield the same master/session token pair; the
//! OAuth-flavored second login feeds the token exchange chain.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, info};

use crate::core::http::{ApiClient, RequestOptions};
use crate::core::listener;
use crate::core::models::{AuthenticatorData, LoginData, ServerReply};
use crate::core::oauth::{self, OAuthHandshake};
use crate::error::{Result, SightError};

/// A plaintext password that never appears in logs or `Debug` output.
///
/// The inner value is read only at the moment a request body is built.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(value: String) -> Self {
        Self(value)
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(****)")
    }
}

/// How the user proves who they are. Chosen once by the caller.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Username/password login.
    Password(Secret),
    /// Browser-based single sign-on through the loopback listener.
    BrowserSso {
        /// Bound wait for the browser callback; `None` blocks indefinitely.
        timeout: Option<Duration>,
    },
}

/// Token pair from the classic login endpoint.
#[derive(Debug, Clone)]
pub struct ClassicTokens {
    pub master_token: String,
    pub session_token: String,
    pub server_version: String,
}

/// Run the selected strategy against `session/v1/login-request`.
///
/// # Errors
///
/// `InvalidCredential` when the server rejects the login or omits a token;
/// `ProtocolViolation`/`SsoTimeout` from the SSO rendezvous.
pub async fn classic_login(
    client: &ApiClient,
    account_url: &str,
    account_name: &str,
    login_name: &str,
    credentials: &Credentials,
) -> Result<ClassicTokens> {
    let body = match credentials {
        Credentials::Password(secret) => {
            debug!(user = login_name, "classic login with password");
            json!({
                "data": {
                    "ACCOUNT_NAME": account_name,
                    "LOGIN_NAME": login_name,
                    "PASSWORD": secret.expose(),
                }
            })
            .to_string()
        }
        Credentials::BrowserSso { timeout } => {
            let (token, proof_key) =
                sso_browser_token(client, account_url, account_name, login_name, *timeout).await?;
            json!({
                "data": {
                    "ACCOUNT_NAME": account_name,
                    "LOGIN_NAME": login_name,
                    "AUTHENTICATOR": "EXTERNALBROWSER",
                    "TOKEN": token,
                    "PROOF_KEY": proof_key,
                }
            })
            .to_string()
        }
    };

    let response = client
        .post(
            account_url,
            "session/v1/login-request",
            body,
            "application/json",
            &RequestOptions {
                accept: Some("application/json".into()),
                ..RequestOptions::default()
            },
        )
        .await?;

    let data = parse_login_reply(&response.body, login_name, account_name)?;
    let master_token = require_token(data.master_token, "master", login_name, account_name)?;
    let session_token = require_token(data.token, "session", login_name, account_name)?;

    info!(user = login_name, account = account_name, "classic login succeeded");

    Ok(ClassicTokens {
        master_token,
        session_token,
        server_version: data.server_version.unwrap_or_default(),
    })
}

/// OAuth-flavored login: same credentials, `session/authenticate-request`
/// endpoint, yields the OAuth-scoped master token the exchange chain
/// consumes.
///
/// Only the password strategy calls this; the SSO strategy reuses the
/// classic master token instead of repeating the browser dance.
///
/// # Errors
///
/// `InvalidCredential` on rejection or a missing master token.
pub async fn oauth_login_master_token(
    client: &ApiClient,
    account_url: &str,
    main_app_url: &str,
    account_name: &str,
    login_name: &str,
    secret: &Secret,
    handshake: &OAuthHandshake,
) -> Result<String> {
    let state = oauth::exchange_state(handshake, account_url, main_app_url);
    let body = json!({
        "data": {
            "ACCOUNT_NAME": account_name.to_uppercase(),
            "LOGIN_NAME": login_name,
            "clientId": handshake.client_id,
            "responseType": "code",
            "state": state,
            "PASSWORD": secret.expose(),
        }
    })
    .to_string();

    let response = client
        .post(
            account_url,
            "session/authenticate-request",
            body,
            "application/json",
            &RequestOptions {
                accept: Some("application/json".into()),
                ..RequestOptions::default()
            },
        )
        .await?;

    let data = parse_login_reply(&response.body, login_name, account_name)?;
    require_token(data.master_token, "master", login_name, account_name)
}

/// Ask the account for its identity-provider URL, run the loopback
/// rendezvous, and hand back the SAML-style token plus proof key.
async fn sso_browser_token(
    client: &ApiClient,
    account_url: &str,
    account_name: &str,
    login_name: &str,
    timeout: Option<Duration>,
) -> Result<(String, String)> {
    let port = listener::pick_unused_port()?;
    debug!(port, "requesting SSO login link");

    let body = json!({
        "data": {
            "ACCOUNT_NAME": account_name,
            "LOGIN_NAME": login_name,
            "AUTHENTICATOR": "EXTERNALBROWSER",
            "BROWSER_MODE_REDIRECT_PORT": port,
        }
    })
    .to_string();

    let response = client
        .post(
            account_url,
            "session/authenticator-request",
            body,
            "application/json",
            &RequestOptions::default(),
        )
        .await?;

    if response.body.is_empty() {
        return Err(invalid_credential(
            login_name,
            account_name,
            "invalid response on getting SSO login link",
            "no code",
        ));
    }
    let reply: ServerReply<AuthenticatorData> = serde_json::from_str(&response.body)?;
    if !reply.success {
        return Err(invalid_credential(
            login_name,
            account_name,
            &reply.message_or_default(),
            &reply.code_or_default(),
        ));
    }
    let data = reply.data.unwrap_or_default();
    let idp_url = data.sso_url.filter(|u| !u.is_empty()).ok_or_else(|| {
        invalid_credential(login_name, account_name, "authenticator reply had no ssoUrl", "no code")
    })?;
    let proof_key = data.proof_key.unwrap_or_default();

    // The rendezvous blocks on the external browser; keep it off the runtime.
    let token = tokio::task::spawn_blocking(move || {
        listener::run_sso_callback(&idp_url, port, timeout)
    })
    .await
    .map_err(|e| SightError::Other(anyhow::anyhow!("SSO listener task failed: {e}")))??;

    if token.is_empty() {
        return Err(invalid_credential(
            login_name,
            account_name,
            "unable to get SSO SAML response token",
            "no code",
        ));
    }

    Ok((token, proof_key))
}

fn parse_login_reply(body: &str, user: &str, account: &str) -> Result<LoginData> {
    if body.is_empty() {
        return Err(invalid_credential(
            user,
            account,
            "invalid response on authenticate user request",
            "no code",
        ));
    }
    let reply: ServerReply<LoginData> = serde_json::from_str(body)?;
    if !reply.success {
        return Err(invalid_credential(
            user,
            account,
            &reply.message_or_default(),
            &reply.code_or_default(),
        ));
    }
    Ok(reply.data.unwrap_or_default())
}

fn require_token(token: Option<String>, kind: &str, user: &str, account: &str) -> Result<String> {
    token.filter(|t| !t.is_empty()).ok_or_else(|| {
        invalid_credential(
            user,
            account,
            &format!("no {kind} token on authenticate user request"),
            "no code",
        )
    })
}

fn invalid_credential(user: &str, account: &str, message: &str, code: &str) -> SightError {
    SightError::InvalidCredential {
        user: user.to_string(),
        account: account.to_string(),
        message: message.to_string(),
        code: code.to_string(),
    }
}
