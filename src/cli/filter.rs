//! `filter` subcommands.

use crate::cli::args::FilterCommand;
use crate::cli::{load_session, print_json};
use crate::core::client::EntityClient;
use crate::error::{Result, SightError};
use crate::storage::ContextStore;

/// Dispatch one filter subcommand.
///
/// # Errors
///
/// Propagates session-load and API failures; a `set` with configuration that
/// is not valid JSON fails before any network call.
pub async fn execute(cmd: FilterCommand, store: &ContextStore) -> Result<()> {
    let body = match cmd {
        FilterCommand::List(session) => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context).list_filters().await?
        }
        FilterCommand::Set { session, keyword, config } => {
            serde_json::from_str::<serde_json::Value>(&config).map_err(|e| {
                SightError::Config(format!("filter configuration is not valid JSON: {e}"))
            })?;
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context)
                .set_filter(&keyword, &config)
                .await?
        }
        FilterCommand::Delete { session, keyword } => {
            let (http, context) = load_session(store, &session)?;
            EntityClient::new(&http, &context).delete_filter(&keyword).await?
        }
    };
    print_json(&body);
    Ok(())
}
