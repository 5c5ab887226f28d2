//! OAuth handshake with the deployment: client-id discovery and the
//! master-token -> authorization-code -> session-cookie exchange chain.
//!
//! The start-OAuth step is the one place the transport's final-URL capture
//! matters: the deployment answers with a redirect chain whose last URL
//! carries the client id as a query parameter. The nonce cookie set on that
//! same response binds the start step to the complete step.

use reqwest::Url;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::cookie::{self, Cookie, OAUTH_NONCE_COOKIE_PREFIX, SESSION_COOKIE_PREFIX};
use crate::core::http::{ApiClient, RequestOptions};
use crate::core::models::{AuthorizeData, ServerReply};
use crate::core::page::{self, PageParams};
use crate::error::{Result, SightError};

/// Server reply signature for a rejected consent request.
const INVALID_CONSENT_CODE: &str = "390302";
const INVALID_CONSENT_MESSAGE: &str = "Invalid consent request.";

/// Ephemeral state threaded from client-id discovery through the exchange
/// chain. Never persisted; secret values only travel where the protocol
/// requires them.
#[derive(Debug, Clone)]
pub struct OAuthHandshake {
    pub client_id: String,
    pub nonce_cookie: Cookie,
    /// Client-chosen CSRF seed, carried through every state blob of one run.
    pub csrf_seed: String,
    /// Browser-window id stand-in, fresh per run.
    pub window_id: String,
}

/// What the exchange chain hands back to the pipeline.
#[derive(Debug)]
pub struct SessionHandoff {
    /// The final application session cookie (`user-...`).
    pub session_cookie: Cookie,
    /// Params scraped from the complete-OAuth page, when present.
    pub page_params: Option<PageParams>,
}

/// Fresh 8-hex-char CSRF seed, the shape the web client uses.
#[must_use]
pub fn new_csrf_seed() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Discover the deployment's OAuth client id and nonce cookie.
///
/// # Errors
///
/// `NotFound` when the final redirect URL carries no `client_id` or the
/// response set no cookies (the deployment did not start a handshake).
pub async fn discover_client_id(
    client: &ApiClient,
    main_app_url: &str,
    app_server_url: &str,
    account_url: &str,
    account: &str,
) -> Result<OAuthHandshake> {
    let csrf_seed = new_csrf_seed();
    let window_id = Uuid::new_v4().to_string();
    let state = start_state(&csrf_seed, account_url, main_app_url, &window_id);

    // The double `&&` before `state` is what the service itself sends; keep it.
    let path = format!(
        "start-oauth/snowflake?accountUrl={}&&state={}",
        urlencoding::encode(account_url),
        urlencoding::encode(&state)
    );

    let response = client
        .get(app_server_url, &path, &RequestOptions::default())
        .await?;

    let final_url = Url::parse(&response.final_url)
        .map_err(|e| SightError::Network(format!("unparseable final OAuth URL: {e}")))?;
    let client_id = final_url
        .query_pairs()
        .find(|(k, _)| k == "client_id")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            SightError::NotFound(format!(
                "unable to parse URL with client ID for account {account}"
            ))
        })?;

    if response.cookies.is_empty() {
        return Err(SightError::NotFound(format!(
            "deployment did not start an OAuth handshake for account {account}"
        )));
    }
    let nonce_cookie = cookie::find_by_prefix(&response.cookies, OAUTH_NONCE_COOKIE_PREFIX)?;

    info!(account, "OAuth client id discovered");
    debug!(final_url = %response.final_url, nonce = %nonce_cookie.name, "start-oauth redirect resolved");

    Ok(OAuthHandshake {
        client_id,
        nonce_cookie,
        csrf_seed,
        window_id,
    })
}

/// Convert an OAuth-scoped master token into the final application session
/// cookie, plus whatever the complete-OAuth page reveals about the
/// effective user.
///
/// # Errors
///
/// `InvalidCredential` on the invalid-consent signature or a missing
/// session cookie; `NotFound` when the authorization redirect is absent.
pub async fn exchange_for_session(
    client: &ApiClient,
    account_url: &str,
    app_server_url: &str,
    main_app_url: &str,
    handshake: &OAuthHandshake,
    oauth_master_token: &str,
    user: &str,
    account: &str,
) -> Result<SessionHandoff> {
    // Step 1: master token -> authorization redirect with the code.
    let state = exchange_state(handshake, account_url, main_app_url);
    let body = json!({
        "masterToken": oauth_master_token,
        "clientId": handshake.client_id,
        "responseType": "code",
        "state": state,
    })
    .to_string();

    let opts = RequestOptions {
        accept: Some("application/json".into()),
        csrf_token: Some(handshake.csrf_seed.clone()),
        ..RequestOptions::default()
    };
    let response = client
        .post(account_url, "oauth/authorization-request", body, "application/json", &opts)
        .await?;

    if response.body.is_empty() {
        return Err(invalid_credential(
            user,
            account,
            "empty reply on validating master OAuth token",
            "no code",
        ));
    }

    let reply: ServerReply<AuthorizeData> = serde_json::from_str(&response.body)?;
    let consent_rejected = reply
        .code
        .as_deref()
        .is_some_and(|c| c.eq_ignore_ascii_case(INVALID_CONSENT_CODE))
        || reply
            .message
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case(INVALID_CONSENT_MESSAGE));
    if consent_rejected {
        return Err(invalid_credential(
            user,
            account,
            &reply.message_or_default(),
            &reply.code_or_default(),
        ));
    }

    let redirect_url = reply
        .data
        .and_then(|d| d.redirect_url)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            SightError::NotFound(format!(
                "unable to parse URL with OAuth token for user {user}@{account}"
            ))
        })?;

    let code = Url::parse(&redirect_url)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "code")
                .map(|(_, v)| v.into_owned())
        })
        .ok_or_else(|| {
            SightError::NotFound(format!(
                "no authorization code in OAuth redirect for user {user}@{account}"
            ))
        })?;
    debug!("authorization code extracted from redirect");

    // Step 2: code -> session cookie, presenting the nonce from start-oauth.
    let path = format!(
        "complete-oauth/snowflake?code={}&state={}",
        urlencoding::encode(&code),
        urlencoding::encode(&state)
    );
    let opts = RequestOptions {
        referer: Some(format!("{}/", main_app_url.trim_end_matches('/'))),
        cookies: vec![handshake.nonce_cookie.header_pair()],
        ..RequestOptions::default()
    };
    let response = client.get(app_server_url, &path, &opts).await?;

    if !response.status.is_success() || response.body.is_empty() {
        return Err(invalid_credential(
            user,
            account,
            "invalid response from completing redirect OAuth token",
            "no code",
        ));
    }

    let session_cookie = cookie::find_by_prefix(&response.cookies, SESSION_COOKIE_PREFIX)
        .map_err(|_| {
            invalid_credential(
                user,
                account,
                "complete-OAuth reply carried no session cookie",
                "no code",
            )
        })?;

    // Step 3: scrape the page for the effective username / context URL.
    let page_params = page::extract_page_params(&response.body);

    info!(user, account, "session cookie acquired");

    Ok(SessionHandoff {
        session_cookie,
        page_params,
    })
}

/// State blob for start-oauth: csrf seed, account URL, window id, browser
/// URL.
fn start_state(csrf_seed: &str, account_url: &str, main_app_url: &str, window_id: &str) -> String {
    json!({
        "csrf": csrf_seed,
        "url": account_url,
        "windowId": window_id,
        "browserUrl": format!("{}/", main_app_url.trim_end_matches('/')),
    })
    .to_string()
}

/// State blob for the exchange steps; additionally binds the OAuth nonce.
pub(crate) fn exchange_state(
    handshake: &OAuthHandshake,
    account_url: &str,
    main_app_url: &str,
) -> String {
    json!({
        "csrf": handshake.csrf_seed,
        "url": account_url,
        "windowId": handshake.window_id,
        "browserUrl": format!("{}/", main_app_url.trim_end_matches('/')),
        "oauthNonce": handshake.nonce_cookie.value,
    })
    .to_string()
}

fn invalid_credential(user: &str, account: &str, message: &str, code: &str) -> SightError {
    SightError::InvalidCredential {
        user: user.to_string(),
        account: account.to_string(),
        message: message.to_string(),
        code: code.to_string(),
    }
}
