//! Authentication pipeline, transport, and entity operations.

pub mod account;
pub mod bootstrap;
pub mod client;
pub mod cookie;
pub mod http;
pub mod listener;
pub mod logging;
pub mod login;
pub mod models;
pub mod oauth;
pub mod page;
pub mod pipeline;
pub mod session;

pub use account::{AccountEndpoints, resolve_account};
pub use client::{EntityClient, ExecutionContext};
pub use cookie::Cookie;
pub use http::{ApiClient, ApiResponse, RequestOptions};
pub use login::{ClassicTokens, Credentials, Secret};
pub use pipeline::{AuthenticateParams, DEFAULT_MAIN_APP_URL, authenticate};
pub use session::SessionContext;
