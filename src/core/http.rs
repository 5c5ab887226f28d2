//! HTTP transport for the Snowsight APIs.
//!
//! Every call is stateless: a fresh cookie jar per call, with the caller
//! threading tokens through explicitly. GET chases redirects by hand so the
//! final resolved URL and every `Set-Cookie` seen along the chain are
//! surfaced to the caller (client-id discovery reads the final URL, not the
//! body). POST never follows redirects: a 3xx reply to a POST is itself
//! meaningful in the OAuth handshake.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, LOCATION, SET_COOKIE};
use reqwest::{Client, ClientBuilder, Method, StatusCode, Url};
use tracing::{debug, error};

use crate::error::{Result, SightError};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Redirect-chain hop bound for GET.
const MAX_REDIRECTS: usize = 10;

/// Optional per-request headers.
///
/// All fields are off by default; each pipeline stage sets exactly the ones
/// its endpoint requires.
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    /// `Accept` header; defaults to `*/*`.
    pub accept: Option<String>,
    /// `X-Snowflake-Context` identity header (`{username}::{contextURL}`).
    pub context: Option<String>,
    /// `Referer` header.
    pub referer: Option<String>,
    /// Classic-UI session token, sent as
    /// `Authorization: Basic Snowflake Token="..."`.
    pub classic_ui_token: Option<String>,
    /// `X-CSRF-Token` header.
    pub csrf_token: Option<String>,
    /// `x-snowflake-role` override header.
    pub role: Option<String>,
    /// `name=value` pairs joined into the `Cookie` header.
    pub cookies: Vec<String>,
}

impl RequestOptions {
    /// Options with a single cookie attached.
    #[must_use]
    pub fn with_cookie(pair: impl Into<String>) -> Self {
        Self {
            cookies: vec![pair.into()],
            ..Self::default()
        }
    }
}

/// What a call surfaces back to the pipeline.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Final response body.
    pub body: String,
    /// URL the request ended up at after any redirects.
    pub final_url: String,
    /// Raw `Set-Cookie` headers observed across the whole redirect chain.
    pub cookies: Vec<String>,
    /// Final HTTP status.
    pub status: StatusCode,
}

impl ApiResponse {
    /// True for 2xx replies with a non-empty body.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.status.is_success() && !self.body.is_empty()
    }
}

/// Stateless HTTP client for one deployment conversation.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    timeout: Duration,
}

impl ApiClient {
    /// Build a client.
    ///
    /// `insecure_skip_tls_verify` disables server-certificate validation for
    /// deployments behind customer-operated proxies with untrusted certs.
    ///
    /// # Errors
    ///
    /// Returns error if client construction fails.
    pub fn new(timeout: Duration, insecure_skip_tls_verify: bool) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(format!("sfsight/{}", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(insecure_skip_tls_verify)
            .build()
            .map_err(|e| SightError::Network(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    /// Client with default timeout and full TLS verification.
    ///
    /// # Errors
    ///
    /// Returns error if client construction fails.
    pub fn default_client() -> Result<Self> {
        Self::new(DEFAULT_TIMEOUT, false)
    }

    /// GET, following redirects and accumulating cookies along the chain.
    ///
    /// # Errors
    ///
    /// `Network`/`Timeout` on transport failure; HTTP error statuses are
    /// returned in the `ApiResponse`, not as `Err`.
    pub async fn get(&self, base_url: &str, path: &str, opts: &RequestOptions) -> Result<ApiResponse> {
        let mut url = join_url(base_url, path)?;
        let mut all_cookies: Vec<String> = Vec::new();
        // cookies acquired mid-chain ride along on subsequent hops
        let mut chain_cookies: Vec<String> = opts.cookies.clone();

        for _hop in 0..MAX_REDIRECTS {
            let response = self
                .execute(Method::GET, url.clone(), opts, &chain_cookies, None, None)
                .await?;

            let hop_cookies = set_cookie_headers(response.headers());
            for raw in &hop_cookies {
                if let Some(pair) = raw.split(';').next() {
                    chain_cookies.push(pair.trim().to_string());
                }
            }
            all_cookies.extend(hop_cookies);

            if response.status().is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        SightError::Network(format!("redirect without Location from {url}"))
                    })?;
                url = url
                    .join(location)
                    .map_err(|e| SightError::Network(format!("bad redirect target: {e}")))?;
                debug!(target = %url, "following redirect");
                continue;
            }

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| SightError::Network(e.to_string()))?;
            debug!(%url, %status, body_len = body.len(), "GET complete");
            return Ok(ApiResponse {
                body,
                final_url: url.to_string(),
                cookies: all_cookies,
                status,
            });
        }

        Err(SightError::Network(format!(
            "redirect chain exceeded {MAX_REDIRECTS} hops from {base_url}/{path}"
        )))
    }

    /// POST without following redirects.
    ///
    /// # Errors
    ///
    /// `Network`/`Timeout` on transport failure.
    pub async fn post(
        &self,
        base_url: &str,
        path: &str,
        body: String,
        content_type: &str,
        opts: &RequestOptions,
    ) -> Result<ApiResponse> {
        let url = join_url(base_url, path)?;
        let response = self
            .execute(
                Method::POST,
                url.clone(),
                opts,
                &opts.cookies,
                Some(body),
                Some(content_type),
            )
            .await?;

        let cookies = set_cookie_headers(response.headers());
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SightError::Network(e.to_string()))?;
        debug!(%url, %status, body_len = body.len(), "POST complete");
        Ok(ApiResponse {
            body,
            final_url: url.to_string(),
            cookies,
            status,
        })
    }

    /// DELETE without following redirects.
    ///
    /// # Errors
    ///
    /// `Network`/`Timeout` on transport failure.
    pub async fn delete(&self, base_url: &str, path: &str, opts: &RequestOptions) -> Result<ApiResponse> {
        let url = join_url(base_url, path)?;
        let response = self
            .execute(Method::DELETE, url.clone(), opts, &opts.cookies, None, None)
            .await?;

        let cookies = set_cookie_headers(response.headers());
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SightError::Network(e.to_string()))?;
        Ok(ApiResponse {
            body,
            final_url: url.to_string(),
            cookies,
            status,
        })
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        opts: &RequestOptions,
        cookies: &[String],
        body: Option<String>,
        content_type: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header("Accept", opts.accept.as_deref().unwrap_or("*/*"));

        if let Some(context) = &opts.context {
            request = request.header("X-Snowflake-Context", context);
        }
        if let Some(referer) = &opts.referer {
            request = request.header("Referer", referer);
        }
        if let Some(token) = &opts.classic_ui_token {
            request = request.header(
                "Authorization",
                format!("Basic Snowflake Token=\"{token}\""),
            );
        }
        if let Some(csrf) = &opts.csrf_token {
            request = request.header("X-CSRF-Token", csrf);
        }
        if let Some(role) = &opts.role {
            request = request.header("x-snowflake-role", role);
        }
        if !cookies.is_empty() {
            request = request.header("Cookie", cookies.join("; "));
        }
        if let Some(body) = body {
            let content_type = content_type.unwrap_or("application/json");
            request = request.header("Content-Type", content_type).body(body);
        }

        request.send().await.map_err(|e| {
            // Bodies of login requests contain credentials; log the URL only.
            error!(%method, %url, "request failed: {e}");
            if e.is_timeout() {
                SightError::Timeout(self.timeout.as_secs())
            } else {
                SightError::Network(e.to_string())
            }
        })
    }
}

fn join_url(base_url: &str, path: &str) -> Result<Url> {
    let base = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    let base = Url::parse(&base).map_err(|e| SightError::Network(format!("bad base URL {base_url}: {e}")))?;
    base.join(path)
        .map_err(|e| SightError::Network(format!("bad request path {path}: {e}")))
}

fn set_cookie_headers(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v: &HeaderValue| v.to_str().ok())
        .map(ToString::to_string)
        .collect()
}
