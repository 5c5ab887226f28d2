//! The `login` command.

use std::io::Read;
use std::time::Duration;

use crate::cli::args::LoginArgs;
use crate::core::http::{ApiClient, DEFAULT_TIMEOUT};
use crate::core::login::{Credentials, Secret};
use crate::core::pipeline::{self, AuthenticateParams};
use crate::error::{Result, SightError};
use crate::storage::ContextStore;

/// Authenticate and persist the resulting session context.
///
/// # Errors
///
/// Pipeline failures propagate typed; missing credential sources are
/// `Config` errors before any network call is made.
pub async fn execute(args: LoginArgs, store: &ContextStore) -> Result<()> {
    let credentials = resolve_credentials(&args)?;
    let client = ApiClient::new(DEFAULT_TIMEOUT, args.insecure_skip_tls_verify)?;

    let context = pipeline::authenticate(
        &client,
        AuthenticateParams {
            account: args.account,
            login_name: args.user,
            main_app_url: args.main_app_url,
            credentials,
        },
    )
    .await?;

    let path = store.save(&context)?;
    println!("{context}");
    println!("session saved to {}", path.display());
    Ok(())
}

fn resolve_credentials(args: &LoginArgs) -> Result<Credentials> {
    if args.sso {
        return Ok(Credentials::BrowserSso {
            timeout: args.sso_timeout.map(Duration::from_secs),
        });
    }
    if let Some(var) = &args.password_env {
        let password = std::env::var(var).map_err(|_| {
            SightError::Config(format!("environment variable {var} is not set"))
        })?;
        if password.is_empty() {
            return Err(SightError::Config(format!(
                "environment variable {var} is empty"
            )));
        }
        return Ok(Credentials::Password(Secret::new(password)));
    }
    if args.password_stdin {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        let password = raw.trim_end_matches(['\r', '\n']).to_string();
        if password.is_empty() {
            return Err(SightError::Config("no password on stdin".to_string()));
        }
        return Ok(Credentials::Password(Secret::new(password)));
    }
    Err(SightError::Config(
        "choose a credential source: --password-env, --password-stdin, or --sso".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn login_args(extra: &[&str]) -> LoginArgs {
        let mut argv = vec!["login", "--account", "acme", "--user", "jdoe"];
        argv.extend_from_slice(extra);
        LoginArgs::parse_from(argv)
    }

    #[test]
    fn no_credential_source_is_a_config_error() {
        let err = resolve_credentials(&login_args(&[])).unwrap_err();
        assert!(matches!(err, SightError::Config(_)));
    }

    #[test]
    fn sso_flag_selects_browser_strategy() {
        let creds = resolve_credentials(&login_args(&["--sso", "--sso-timeout", "90"])).unwrap();
        match creds {
            Credentials::BrowserSso { timeout } => {
                assert_eq!(timeout, Some(Duration::from_secs(90)));
            }
            Credentials::Password(_) => panic!("expected SSO"),
        }
    }
}
