//! `dashboard` subcommands.

use crate::cli::args::DashboardCommand;
use crate::cli::{load_session, print_json};
use crate::core::client::EntityClient;
use crate::error::{Result, SightError};
use crate::storage::ContextStore;

/// Dispatch one dashboard subcommand.
///
/// # Errors
///
/// Propagates session-load and API failures; creating a dashboard with no
/// role or warehouse available is a `Config` error.
pub async fn execute(cmd: DashboardCommand, store: &ContextStore) -> Result<()> {
    let body = match cmd {
        DashboardCommand::List(session) => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context).list_dashboards().await?
        }
        DashboardCommand::Show { session, id } => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context).get_dashboard(&id).await?
        }
        DashboardCommand::New { session, name, role, warehouse } => {
            let (http, context) = load_session(store, &session)?;
            let role = role
                .or_else(|| context.default_role.clone())
                .ok_or_else(|| missing("role", "--role"))?;
            let warehouse = warehouse
                .or_else(|| context.default_warehouse.clone())
                .ok_or_else(|| missing("warehouse", "--warehouse"))?;
            EntityClient::new(&http, &context)
                .create_dashboard(&name, &role, &warehouse)
                .await?
        }
        DashboardCommand::Refresh { session, id } => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context).refresh_dashboard(&id).await?
        }
        DashboardCommand::Delete { session, id } => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context).delete_dashboard(&id).await?
        }
    };
    print_json(&body);
    Ok(())
}

fn missing(what: &str, flag: &str) -> SightError {
    SightError::Config(format!(
        "dashboards need a {what}; the session has no default, pass {flag}"
    ))
}
