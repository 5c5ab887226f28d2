//! `query` monitoring subcommands.

use crate::cli::args::QueryCommand;
use crate::cli::{load_session, print_json};
use crate::core::client::EntityClient;
use crate::error::Result;
use crate::storage::ContextStore;

/// Dispatch one query monitoring subcommand.
///
/// # Errors
///
/// Propagates session-load and API failures.
pub async fn execute(cmd: QueryCommand, store: &ContextStore) -> Result<()> {
    let body = match cmd {
        QueryCommand::Detail { session, id, role } => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context)
                .query_details(&id, role.as_deref())
                .await?
        }
        QueryCommand::Profile { session, id, role } => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context)
                .query_profile(&id, role.as_deref())
                .await?
        }
    };
    print_json(&body);
    Ok(())
}
