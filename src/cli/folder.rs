//! `folder` subcommands.

use crate::cli::args::FolderCommand;
use crate::cli::{load_session, print_json};
use crate::core::client::EntityClient;
use crate::error::Result;
use crate::storage::ContextStore;

/// Dispatch one folder subcommand.
///
/// # Errors
///
/// Propagates session-load and API failures.
pub async fn execute(cmd: FolderCommand, store: &ContextStore) -> Result<()> {
    let FolderCommand::List(session) = cmd;
    let (http, context) = load_session(store, &session)?;
    let body = EntityClient::new(&http, &context).list_folders().await?;
    print_json(&body);
    Ok(())
}
