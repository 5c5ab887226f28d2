//! Saving and loading session contexts.
//!
//! One JSON file per account+user under the platform data dir. The login
//! command writes here; every entity command reads back. Writes go through a
//! temp file and rename so a crash never leaves a half-written context.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::account;
use crate::core::session::SessionContext;
use crate::error::{Result, SightError};
use crate::storage::paths::AppPaths;

/// Store of saved contexts under one directory.
pub struct ContextStore {
    paths: AppPaths,
}

impl ContextStore {
    #[must_use]
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }

    /// Persist a context, replacing any earlier one for the same
    /// account+user.
    ///
    /// # Errors
    ///
    /// `Io` on filesystem failure, `Json` if the context cannot serialize.
    pub fn save(&self, context: &SessionContext) -> Result<PathBuf> {
        self.paths.ensure_dirs()?;
        let path = self.paths.context_file(&context.file_stem());
        let json = serde_json::to_string_pretty(context)?;

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
        }
        fs::rename(&tmp, &path)?;

        info!(path = %path.display(), "session context saved");
        Ok(path)
    }

    /// Load the context for `account` and `user`.
    ///
    /// `account` may be the full region-qualified identifier; the stored
    /// stem uses the short name.
    ///
    /// # Errors
    ///
    /// `Config` when no context is saved or the file does not parse; the
    /// caller's remedy in both cases is to log in again.
    pub fn load(&self, account: &str, user: &str) -> Result<SessionContext> {
        let stem = stem_for(account, user);
        let path = self.paths.context_file(&stem);
        debug!(path = %path.display(), "loading session context");

        let raw = fs::read_to_string(&path).map_err(|_| {
            SightError::Config(format!(
                "no saved session for {user}@{account}; run `sfsight login` first"
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            SightError::Config(format!(
                "saved session at {} is unreadable ({e}); run `sfsight login` again",
                path.display()
            ))
        })
    }

    /// Remove the saved context for `account` and `user`, if any.
    ///
    /// # Errors
    ///
    /// `Io` on filesystem failure other than the file being absent.
    pub fn delete(&self, account: &str, user: &str) -> Result<bool> {
        let path = self.paths.context_file(&stem_for(account, user));
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn stem_for(account: &str, user: &str) -> String {
    fn safe(s: &str) -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }
    format!(
        "context.{}.{}",
        safe(account::account_short_name(account)),
        safe(user)
    )
}
