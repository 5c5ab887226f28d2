//! End-to-end authentication pipeline tests against a mock deployment.
//!
//! One wiremock server plays all three hosts (main app, app server, account)
//! so every stage's wire traffic is exercised: validation, client-id
//! discovery through a redirect chain, classic and OAuth password logins,
//! the token exchange, and bootstrap.

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sfsight::SightError;
use sfsight::core::http::ApiClient;
use sfsight::core::login::{Credentials, Secret};
use sfsight::core::pipeline::{AuthenticateParams, authenticate};
use sfsight::core::resolve_account;

fn password_params(server: &MockServer) -> AuthenticateParams {
    AuthenticateParams {
        account: "acme.us-east-1".to_string(),
        login_name: "JDOE".to_string(),
        main_app_url: server.uri(),
        credentials: Credentials::Password(Secret::new("hunter2".to_string())),
    }
}

async fn mount_validate(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v0/validate-snowflake-url"))
        .and(query_param("url", "acme.us-east-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "account": "acme",
            "appServerUrl": server.uri(),
            "region": "us-east-1",
            "url": server.uri(),
        })))
        .mount(server)
        .await;
}

/// start-oauth answers with a redirect whose final URL carries the client id
/// and whose first hop sets the nonce cookie.
async fn mount_start_oauth(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/start-oauth/snowflake"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/oauth-landing?client_id=CID%3D%3D")
                .insert_header(
                    "Set-Cookie",
                    "oauth-nonce-77=n0nce; Path=/; HttpOnly; Secure",
                ),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth-landing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(server)
        .await;
}

async fn mount_logins(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session/v1/login-request"))
        .and(body_string_contains("\"PASSWORD\":\"hunter2\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"masterToken": "M1", "token": "S1", "serverVersion": "8.4.1"},
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/authenticate-request"))
        .and(body_string_contains("\"ACCOUNT_NAME\":\"ACME\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"masterToken": "OM1"},
        })))
        .mount(server)
        .await;
}

async fn mount_exchange(server: &MockServer, page_body: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/authorization-request"))
        .and(body_string_contains("\"masterToken\":\"OM1\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"redirectUrl": "https://acme.example.com/?code=AC123"},
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/complete-oauth/snowflake"))
        .and(query_param("code", "AC123"))
        .and(header("Cookie", "oauth-nonce-77=n0nce"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "user-abc=sess-tok; Path=/; HttpOnly; Secure")
                .set_body_string(page_body.to_string()),
        )
        .mount(server)
        .await;
}

async fn mount_bootstrap(server: &MockServer, expected_context: &str) {
    Mock::given(method("GET"))
        .and(path("/bootstrap"))
        .and(header("X-Snowflake-Context", expected_context))
        .and(header("Cookie", "user-abc=sess-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "User": {
                "id": 42,
                "defaultOrgId": "org-9",
                "settings": {"defaultRole": "SYSADMIN", "defaultWarehouse": "COMPUTE_WH"},
            },
            "Org": {"id": "org-9"},
            "PageParams": {"csrfToken": "csrf-xyz"},
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn password_login_builds_full_session_context() {
    let server = MockServer::start().await;
    mount_validate(&server).await;
    mount_start_oauth(&server).await;
    mount_logins(&server).await;
    // The completion page reports a different effective username and the
    // canonical context URL.
    mount_exchange(
        &server,
        r#"<html><script>var params = {"user":{"username":"ALT_NAME"},"org":{"url":"https://x.snowflakecomputing.com"}}</script></html>"#,
    )
    .await;
    mount_bootstrap(&server, "ALT_NAME::https://x.snowflakecomputing.com").await;

    let client = ApiClient::default_client().unwrap();
    let context = authenticate(&client, password_params(&server)).await.unwrap();

    assert_eq!(context.account_name, "acme");
    assert_eq!(context.account_full_name, "acme.us-east-1");
    assert_eq!(context.region, "us-east-1");
    assert_eq!(context.client_id, "CID==");
    assert_eq!(context.auth_token_master, "M1");
    assert_eq!(context.auth_token_session, "S1");
    assert_eq!(context.server_version, "8.4.1");
    assert_eq!(context.auth_token_snowsight, "user-abc=sess-tok");
    assert_eq!(context.user_name, "ALT_NAME");
    assert_eq!(context.context_url, "https://x.snowflakecomputing.com");
    assert_eq!(context.organization_id, "org-9");
    assert_eq!(context.user_id, "42");
    assert_eq!(context.csrf_token, "csrf-xyz");
    assert_eq!(context.default_role.as_deref(), Some("SYSADMIN"));
    assert_eq!(context.default_warehouse.as_deref(), Some("COMPUTE_WH"));
}

#[tokio::test]
async fn completion_page_without_params_falls_back_to_account_url() {
    let server = MockServer::start().await;
    mount_validate(&server).await;
    mount_start_oauth(&server).await;
    mount_logins(&server).await;
    mount_exchange(&server, "<html>no params here</html>").await;
    let expected_context = format!("JDOE::{}", server.uri());
    mount_bootstrap(&server, &expected_context).await;

    let client = ApiClient::default_client().unwrap();
    let context = authenticate(&client, password_params(&server)).await.unwrap();

    // Login name stands; context URL is derived from the account URL.
    assert_eq!(context.user_name, "JDOE");
    assert_eq!(context.context_url, server.uri());
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/validate-snowflake-url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": false})))
        .mount(&server)
        .await;

    let client = ApiClient::default_client().unwrap();
    let err = resolve_account(&client, &server.uri(), "nosuch")
        .await
        .unwrap_err();
    assert!(matches!(err, SightError::NotFound(_)));
}

#[tokio::test]
async fn rejected_password_surfaces_server_code() {
    let server = MockServer::start().await;
    mount_validate(&server).await;
    mount_start_oauth(&server).await;
    Mock::given(method("POST"))
        .and(path("/session/v1/login-request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "code": "390100",
            "message": "Incorrect username or password was specified.",
        })))
        .mount(&server)
        .await;

    let client = ApiClient::default_client().unwrap();
    let err = authenticate(&client, password_params(&server)).await.unwrap_err();
    assert!(err.is_credential_rejection());
    assert!(err.to_string().contains("390100"));
}

#[tokio::test]
async fn rejected_consent_is_a_credential_error() {
    let server = MockServer::start().await;
    mount_validate(&server).await;
    mount_start_oauth(&server).await;
    mount_logins(&server).await;
    Mock::given(method("POST"))
        .and(path("/oauth/authorization-request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "code": "390302",
            "message": "Invalid consent request.",
        })))
        .mount(&server)
        .await;

    let client = ApiClient::default_client().unwrap();
    let err = authenticate(&client, password_params(&server)).await.unwrap_err();
    assert!(err.is_credential_rejection());
    assert!(err.to_string().contains("390302"));
}

#[tokio::test]
async fn missing_session_cookie_on_completion_is_a_credential_error() {
    let server = MockServer::start().await;
    mount_validate(&server).await;
    mount_start_oauth(&server).await;
    mount_logins(&server).await;
    Mock::given(method("POST"))
        .and(path("/oauth/authorization-request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"redirectUrl": "https://acme.example.com/?code=AC123"},
        })))
        .mount(&server)
        .await;
    // Completion succeeds but never hands out a `user-` cookie.
    Mock::given(method("GET"))
        .and(path("/complete-oauth/snowflake"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let client = ApiClient::default_client().unwrap();
    let err = authenticate(&client, password_params(&server)).await.unwrap_err();
    assert!(err.is_credential_rejection());
}
