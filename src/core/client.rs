//! Entity operations against an authenticated session.
//!
//! Thin uniform CRUD over the internal REST surface: worksheets and
//! dashboards are "queries" and "folders" server-side, filters are org
//! parameters, and listing anything goes through one entities/list endpoint
//! filtered by type. Replies are passed through as JSON; shaping them is the
//! caller's concern.

use serde_json::json;
use tracing::debug;

use crate::core::http::{ApiClient, ApiResponse, RequestOptions};
use crate::core::models::BootstrapReply;
use crate::core::session::SessionContext;
use crate::error::{Result, SightError};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Execution context for worksheet save and run operations.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub role: Option<String>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

impl ExecutionContext {
    /// Context with the session's default role and warehouse filled in.
    #[must_use]
    pub fn from_session(context: &SessionContext) -> Self {
        Self {
            role: context.default_role.clone(),
            warehouse: context.default_warehouse.clone(),
            ..Self::default()
        }
    }

    fn to_json(&self) -> String {
        json!({
            "role": self.role.as_deref().unwrap_or_default(),
            "warehouse": self.warehouse.as_deref().unwrap_or_default(),
            "database": self.database.as_deref().unwrap_or_default(),
            "schema": self.schema.as_deref().unwrap_or_default(),
        })
        .to_string()
    }
}

/// One authenticated session's view of the entity APIs.
pub struct EntityClient<'a> {
    http: &'a ApiClient,
    context: &'a SessionContext,
}

impl<'a> EntityClient<'a> {
    #[must_use]
    pub fn new(http: &'a ApiClient, context: &'a SessionContext) -> Self {
        Self { http, context }
    }

    // Worksheets

    /// List worksheets visible to the user.
    ///
    /// # Errors
    ///
    /// `NotFound` on an unusable reply.
    pub async fn list_worksheets(&self) -> Result<String> {
        self.list_entities("query").await
    }

    /// Fetch one worksheet by id.
    ///
    /// # Errors
    ///
    /// `NotFound` when the worksheet does not exist or the reply is empty.
    pub async fn get_worksheet(&self, worksheet_id: &str) -> Result<String> {
        self.authenticated_get(&format!("v0/queries/{worksheet_id}"))
            .await
    }

    /// Create a worksheet, optionally inside a folder.
    ///
    /// # Errors
    ///
    /// `NotFound` on an unusable reply.
    pub async fn create_worksheet(&self, name: &str, folder_id: Option<&str>) -> Result<String> {
        let mut body = format!(
            "action=create&orgId={}&name={}",
            self.context.organization_id,
            urlencoding::encode(name)
        );
        if let Some(folder_id) = folder_id {
            body.push_str(&format!("&folderId={folder_id}"));
        }
        self.form_post("v0/queries", body).await
    }

    /// Save new query text into a worksheet draft.
    ///
    /// # Errors
    ///
    /// `NotFound` on an unusable reply.
    pub async fn save_worksheet(
        &self,
        worksheet_id: &str,
        query_text: &str,
        exec: &ExecutionContext,
    ) -> Result<String> {
        let body = format!(
            "action=saveDraft&id={worksheet_id}&projectId={worksheet_id}&executionContext={}&query={}",
            urlencoding::encode(&exec.to_json()),
            urlencoding::encode(query_text)
        );
        self.form_post("v0/queries", body).await
    }

    /// Execute a worksheet's query and return the result payload.
    ///
    /// # Errors
    ///
    /// `NotFound` on an unusable reply.
    pub async fn run_worksheet(
        &self,
        worksheet_id: &str,
        query_text: &str,
        exec: &ExecutionContext,
    ) -> Result<String> {
        let body = format!(
            "action=execute&projectId={worksheet_id}&executionContext={}&query={}&paramRefs={}",
            urlencoding::encode(&exec.to_json()),
            urlencoding::encode(query_text),
            urlencoding::encode("[]")
        );
        self.form_post("v0/queries", body).await
    }

    /// Delete a worksheet.
    ///
    /// # Errors
    ///
    /// `NotFound` when the delete is rejected.
    pub async fn delete_worksheet(&self, worksheet_id: &str) -> Result<String> {
        self.authenticated_delete(&format!("v0/queries/{worksheet_id}"))
            .await
    }

    // Dashboards

    /// List dashboards visible to the user.
    ///
    /// # Errors
    ///
    /// `NotFound` on an unusable reply.
    pub async fn list_dashboards(&self) -> Result<String> {
        self.list_entities("dashboard").await
    }

    /// Fetch one dashboard by id.
    ///
    /// # Errors
    ///
    /// `NotFound` when the dashboard does not exist or the reply is empty.
    pub async fn get_dashboard(&self, dashboard_id: &str) -> Result<String> {
        self.authenticated_get(&format!("v0/folders/{dashboard_id}"))
            .await
    }

    /// Create an organization-visible dashboard.
    ///
    /// # Errors
    ///
    /// `NotFound` on an unusable reply.
    pub async fn create_dashboard(
        &self,
        name: &str,
        role: &str,
        warehouse: &str,
    ) -> Result<String> {
        let body = format!(
            "orgId={}&name={}&role={role}&warehouse={warehouse}&type=dashboard&visibility=organization",
            self.context.organization_id,
            urlencoding::encode(name)
        );
        self.form_post("v0/folders", body).await
    }

    /// Re-run every worksheet on a dashboard.
    ///
    /// # Errors
    ///
    /// `NotFound` on an unusable reply.
    pub async fn refresh_dashboard(&self, dashboard_id: &str) -> Result<String> {
        self.form_post(
            &format!("v0/folders/{dashboard_id}"),
            "action=refresh&drafts={}".to_string(),
        )
        .await
    }

    /// Delete a dashboard.
    ///
    /// # Errors
    ///
    /// `NotFound` when the delete is rejected.
    pub async fn delete_dashboard(&self, dashboard_id: &str) -> Result<String> {
        self.authenticated_delete(&format!("v0/folders/{dashboard_id}"))
            .await
    }

    // Folders

    /// List worksheet folders visible to the user.
    ///
    /// # Errors
    ///
    /// `NotFound` on an unusable reply.
    pub async fn list_folders(&self) -> Result<String> {
        self.list_entities("folder").await
    }

    // Filters

    /// List the organization's filters.
    ///
    /// Filters have no list endpoint of their own; they come back as
    /// `Org.settings.paramConfigs` on the bootstrap reply.
    ///
    /// # Errors
    ///
    /// `NotFound` on an unusable reply.
    pub async fn list_filters(&self) -> Result<String> {
        let body = self.authenticated_get("bootstrap").await?;
        let reply: BootstrapReply = serde_json::from_str(&body)?;
        let configs = reply
            .org
            .and_then(|o| o.settings)
            .and_then(|s| s.param_configs)
            .unwrap_or_default();
        Ok(serde_json::to_string(&configs)?)
    }

    /// Create or replace an organization filter under `keyword`.
    ///
    /// # Errors
    ///
    /// `NotFound` on an unusable reply.
    pub async fn set_filter(&self, keyword: &str, configuration: &str) -> Result<String> {
        let body = format!("paramConfig={}", urlencoding::encode(configuration));
        self.form_post(
            &format!(
                "v0/organizations/{}/param/{keyword}",
                self.context.organization_id
            ),
            body,
        )
        .await
    }

    /// Delete the organization filter under `keyword`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the delete is rejected.
    pub async fn delete_filter(&self, keyword: &str) -> Result<String> {
        self.authenticated_delete(&format!(
            "v0/organizations/{}/param/{keyword}",
            self.context.organization_id
        ))
        .await
    }

    // Query monitoring

    /// Execution details of a finished or running query.
    ///
    /// `role` overrides the session role when the query ran under another
    /// one.
    ///
    /// # Errors
    ///
    /// `NotFound` when the query is not visible under the given role.
    pub async fn query_details(&self, query_id: &str, role: Option<&str>) -> Result<String> {
        self.monitoring_get(
            &format!("v0/session/request/monitoring/queries/{query_id}?max=1001"),
            role,
        )
        .await
    }

    /// Query-plan profile of a query.
    ///
    /// # Errors
    ///
    /// `NotFound` when the query is not visible under the given role.
    pub async fn query_profile(&self, query_id: &str, role: Option<&str>) -> Result<String> {
        self.monitoring_get(
            &format!("v0/session/request/monitoring/query-plan-data/{query_id}"),
            role,
        )
        .await
    }

    // Shared plumbing

    /// The entities/list endpoint, filtered to one entity type.
    async fn list_entities(&self, entity_type: &str) -> Result<String> {
        let options = json!({
            "sort": {"col": "viewed", "dir": "desc"},
            "limit": 500,
            "owner": null,
            "types": [entity_type],
            "showNeverViewed": "if-invited",
        })
        .to_string();
        let body = format!(
            "options={}&location=worksheets",
            urlencoding::encode(&options)
        );
        self.form_post(
            &format!(
                "v0/organizations/{}/entities/list",
                self.context.organization_id
            ),
            body,
        )
        .await
    }

    fn base_options(&self) -> RequestOptions {
        RequestOptions {
            accept: Some("application/json".into()),
            context: Some(self.context.context_header()),
            referer: Some(self.context.referer()),
            cookies: vec![self.context.auth_token_snowsight.clone()],
            ..RequestOptions::default()
        }
    }

    async fn authenticated_get(&self, path: &str) -> Result<String> {
        let response = self
            .http
            .get(&self.context.app_server_url, path, &self.base_options())
            .await?;
        self.require_usable(path, response)
    }

    async fn monitoring_get(&self, path: &str, role: Option<&str>) -> Result<String> {
        let opts = RequestOptions {
            role: role
                .map(ToString::to_string)
                .or_else(|| self.context.default_role.clone()),
            ..self.base_options()
        };
        let response = self
            .http
            .get(&self.context.app_server_url, path, &opts)
            .await?;
        self.require_usable(path, response)
    }

    async fn form_post(&self, path: &str, body: String) -> Result<String> {
        debug!(path, body_len = body.len(), "entity POST");
        let opts = RequestOptions {
            csrf_token: Some(self.context.csrf_token.clone()),
            ..self.base_options()
        };
        let response = self
            .http
            .post(
                &self.context.app_server_url,
                path,
                body,
                FORM_CONTENT_TYPE,
                &opts,
            )
            .await?;
        self.require_usable(path, response)
    }

    async fn authenticated_delete(&self, path: &str) -> Result<String> {
        let response = self
            .http
            .delete(&self.context.app_server_url, path, &self.base_options())
            .await?;
        if response.status.is_success() {
            Ok(response.body)
        } else {
            Err(self.not_found(path, response.status.as_u16()))
        }
    }

    fn require_usable(&self, path: &str, response: ApiResponse) -> Result<String> {
        if response.is_usable() {
            Ok(response.body)
        } else {
            Err(self.not_found(path, response.status.as_u16()))
        }
    }

    fn not_found(&self, path: &str, status: u16) -> SightError {
        SightError::NotFound(format!(
            "no usable reply from {path} for user {}@{} (HTTP {status})",
            self.context.user_name, self.context.account_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_context_serializes_empty_fields() {
        let exec = ExecutionContext {
            role: Some("SYSADMIN".into()),
            ..ExecutionContext::default()
        };
        let parsed: serde_json::Value = serde_json::from_str(&exec.to_json()).unwrap();
        assert_eq!(parsed["role"], "SYSADMIN");
        assert_eq!(parsed["warehouse"], "");
        assert_eq!(parsed["database"], "");
    }
}
