//! `worksheet` subcommands.

use crate::cli::args::{ExecArgs, WorksheetCommand};
use crate::cli::{load_session, print_json};
use crate::core::client::{EntityClient, ExecutionContext};
use crate::core::session::SessionContext;
use crate::error::Result;
use crate::storage::ContextStore;

/// Dispatch one worksheet subcommand.
///
/// # Errors
///
/// Propagates session-load and API failures.
pub async fn execute(cmd: WorksheetCommand, store: &ContextStore) -> Result<()> {
    let body = match cmd {
        WorksheetCommand::List(session) => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context).list_worksheets().await?
        }
        WorksheetCommand::Show { session, id } => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context).get_worksheet(&id).await?
        }
        WorksheetCommand::New { session, name, folder } => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context)
                .create_worksheet(&name, folder.as_deref())
                .await?
        }
        WorksheetCommand::Run { session, id, query, exec } => {
            let (http, context) = load_session(store, &session)?;
            let exec = merge_exec(&exec, &context);
            EntityClient::new(&http, &context)
                .run_worksheet(&id, &query, &exec)
                .await?
        }
        WorksheetCommand::Save { session, id, query, exec } => {
            let (http, context) = load_session(store, &session)?;
            let exec = merge_exec(&exec, &context);
            EntityClient::new(&http, &context)
                .save_worksheet(&id, &query, &exec)
                .await?
        }
        WorksheetCommand::Delete { session, id } => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context).delete_worksheet(&id).await?
        }
    };
    print_json(&body);
    Ok(())
}

/// CLI overrides win over the session's defaults.
fn merge_exec(args: &ExecArgs, context: &SessionContext) -> ExecutionContext {
    let defaults = ExecutionContext::from_session(context);
    ExecutionContext {
        role: args.role.clone().or(defaults.role),
        warehouse: args.warehouse.clone().or(defaults.warehouse),
        database: args.database.clone(),
        schema: args.schema.clone(),
    }
}
