//! CLI argument parsing and command dispatch.

pub mod args;
pub mod dashboard;
pub mod filter;
pub mod folder;
pub mod login;
pub mod query;
pub mod worksheet;

pub use args::{Cli, Commands};

use crate::cli::args::SessionArgs;
use crate::core::http::ApiClient;
use crate::core::session::SessionContext;
use crate::error::Result;
use crate::storage::ContextStore;

/// Load the saved session an entity command runs under, plus a client to
/// talk with.
///
/// # Errors
///
/// `Config` when no session is saved for the account+user pair.
pub(crate) fn load_session(
    store: &ContextStore,
    session: &SessionArgs,
) -> Result<(ApiClient, SessionContext)> {
    let context = store.load(&session.account, &session.user)?;
    let client = ApiClient::default_client()?;
    Ok((client, context))
}

/// Print an API reply to stdout, pretty-printed when it parses as JSON.
pub(crate) fn print_json(body: &str) {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{body}"),
        },
        Err(_) => println!("{body}"),
    }
}
