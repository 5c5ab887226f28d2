//! Persistence for authenticated session contexts.

pub mod context_store;
pub mod paths;

pub use context_store::ContextStore;
pub use paths::AppPaths;
