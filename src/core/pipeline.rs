//! The authentication pipeline.
//!
//! Six sequential stages, each a hard input dependency of the next:
//! account resolution, OAuth client-id discovery, primary authentication
//! (password or browser SSO), the token exchange chain, and the bootstrap
//! call. Any failure aborts the whole run; a [`SessionContext`] is only
//! ever handed out fully populated.
//!
//! Independent runs for different accounts are safe to execute in parallel:
//! every run owns its cookie state and, for SSO, its own listener port.

use chrono::Utc;
use tracing::{info, warn};

use crate::core::account::{self, AccountEndpoints};
use crate::core::bootstrap;
use crate::core::http::ApiClient;
use crate::core::login::{self, ClassicTokens, Credentials};
use crate::core::oauth::{self, SessionHandoff};
use crate::core::session::{self, SessionContext};
use crate::error::Result;

/// Default main application host.
pub const DEFAULT_MAIN_APP_URL: &str = "https://app.snowflake.com";

/// Inputs to one authentication run.
#[derive(Debug)]
pub struct AuthenticateParams {
    /// Account identifier, optionally region-qualified
    /// (`acme` or `acme.us-east-1.azure`).
    pub account: String,
    /// Login name; can differ from the effective username.
    pub login_name: String,
    pub main_app_url: String,
    pub credentials: Credentials,
}

/// Run the full pipeline and produce a usable session.
///
/// # Errors
///
/// Any stage failure propagates as its typed error and aborts construction;
/// no partially-built context ever escapes.
pub async fn authenticate(client: &ApiClient, params: AuthenticateParams) -> Result<SessionContext> {
    let AuthenticateParams {
        account,
        login_name,
        main_app_url,
        credentials,
    } = params;
    let account_name = account::account_short_name(&account).to_string();

    // Stage 1: account and region validation.
    let endpoints: AccountEndpoints =
        account::resolve_account(client, &main_app_url, &account).await?;
    info!(
        account = %account_name,
        region = %endpoints.region,
        "account '{account_name}' is served by '{}'",
        endpoints.app_server_url
    );

    // Stage 2: deployment OAuth client id + nonce cookie.
    let handshake = oauth::discover_client_id(
        client,
        &main_app_url,
        &endpoints.app_server_url,
        &endpoints.account_url,
        &account_name,
    )
    .await?;

    // Stage 3: classic login, by the selected strategy.
    info!(user = %login_name, account = %account_name, "authenticating to classic UI");
    let classic: ClassicTokens = login::classic_login(
        client,
        &endpoints.account_url,
        &account_name,
        &login_name,
        &credentials,
    )
    .await?;

    // The exchange chain needs an OAuth-scoped master token. Password logins
    // perform the second, OAuth-flavored login; SSO reuses the classic
    // master token rather than repeating the browser dance.
    let oauth_master = match &credentials {
        Credentials::Password(secret) => {
            login::oauth_login_master_token(
                client,
                &endpoints.account_url,
                &main_app_url,
                &account_name,
                &login_name,
                secret,
                &handshake,
            )
            .await?
        }
        Credentials::BrowserSso { .. } => classic.master_token.clone(),
    };

    // Stage 4: master token -> authorization code -> session cookie.
    info!(user = %login_name, account = %account_name, "authenticating to Snowsight");
    let handoff: SessionHandoff = oauth::exchange_for_session(
        client,
        &endpoints.account_url,
        &endpoints.app_server_url,
        &main_app_url,
        &handshake,
        &oauth_master,
        &login_name,
        &account_name,
    )
    .await?;

    // Some accounts have a login name distinct from the effective username;
    // the complete-OAuth page is authoritative when they differ.
    let mut user_name = login_name.clone();
    let mut context_url = String::new();
    if let Some(params) = &handoff.page_params {
        if let Some(effective) = params.username() {
            if !effective.eq_ignore_ascii_case(&login_name) {
                info!(effective, "page reports a different effective username");
                user_name = effective.to_string();
            }
        }
        if let Some(url) = params.org_url() {
            context_url = url.to_string();
        }
    }
    if context_url.is_empty() {
        context_url = session::normalize_private_link(&endpoints.account_url);
        warn!(%context_url, "no context URL on the completion page; derived from the account URL");
    }

    // Stage 5: organization / user ids, CSRF token, defaults.
    let context_header = format!("{user_name}::{context_url}");
    let session_cookie = handoff.session_cookie.header_pair();
    let boot = bootstrap::bootstrap(
        client,
        &endpoints.app_server_url,
        &main_app_url,
        &context_header,
        &session_cookie,
        &user_name,
        &account_name,
    )
    .await?;

    let context = SessionContext {
        account_name: account_name.clone(),
        account_full_name: account,
        account_url: endpoints.account_url,
        region: endpoints.region,
        organization_id: boot.organization_id,
        user_id: boot.user_id,
        user_name,
        csrf_token: boot.csrf_token,
        main_app_url,
        app_server_url: endpoints.app_server_url,
        context_url,
        client_id: handshake.client_id,
        auth_token_master: classic.master_token,
        auth_token_session: classic.session_token,
        auth_token_snowsight: session_cookie,
        default_role: boot.default_role,
        default_warehouse: boot.default_warehouse,
        server_version: classic.server_version,
        saved_at: Utc::now(),
    };

    info!(
        "successfully authenticated {} ({}) in account {} ({})",
        context.user_name, context.user_id, context.account_name, context.organization_id
    );

    Ok(context)
}
