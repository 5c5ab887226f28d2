//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};

/// Automation client for the Snowsight web interface.
#[derive(Parser, Debug)]
#[command(name = "sfsight")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Emit machine-readable JSON logs to stderr
    #[arg(long, global = true)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for saved session contexts (defaults to the platform data
    /// dir)
    #[arg(long, value_name = "DIR", global = true)]
    pub context_dir: Option<std::path::PathBuf>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate and save a session context
    Login(LoginArgs),

    /// Worksheet operations
    #[command(subcommand)]
    Worksheet(WorksheetCommand),

    /// Dashboard operations
    #[command(subcommand)]
    Dashboard(DashboardCommand),

    /// Organization filter operations
    #[command(subcommand)]
    Filter(FilterCommand),

    /// Folder operations
    #[command(subcommand)]
    Folder(FolderCommand),

    /// Query monitoring
    #[command(subcommand)]
    Query(QueryCommand),
}

/// Arguments for the `login` command.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account identifier, optionally region-qualified
    /// (acme or acme.us-east-1.azure)
    #[arg(long, value_name = "ACCOUNT")]
    pub account: String,

    /// Login name
    #[arg(long, value_name = "USER")]
    pub user: String,

    /// Read the password from this environment variable
    #[arg(long, value_name = "VAR", conflicts_with_all = ["password_stdin", "sso"])]
    pub password_env: Option<String>,

    /// Read the password from stdin
    #[arg(long, conflicts_with = "sso")]
    pub password_stdin: bool,

    /// Authenticate through the browser (single sign-on)
    #[arg(long)]
    pub sso: bool,

    /// Give up on the browser callback after this many seconds
    /// (default: wait indefinitely)
    #[arg(long, value_name = "SECONDS", requires = "sso")]
    pub sso_timeout: Option<u64>,

    /// Main application URL
    #[arg(long, value_name = "URL", default_value = crate::core::DEFAULT_MAIN_APP_URL)]
    pub main_app_url: String,

    /// Skip TLS certificate verification (self-signed proxies only)
    #[arg(long)]
    pub insecure_skip_tls_verify: bool,
}

/// Identifies the saved session an entity command runs under.
#[derive(Parser, Debug)]
pub struct SessionArgs {
    /// Account of the saved session
    #[arg(long, value_name = "ACCOUNT")]
    pub account: String,

    /// User of the saved session
    #[arg(long, value_name = "USER")]
    pub user: String,
}

/// Worksheet subcommands.
#[derive(Subcommand, Debug)]
pub enum WorksheetCommand {
    /// List worksheets
    List(SessionArgs),

    /// Show one worksheet
    Show {
        #[command(flatten)]
        session: SessionArgs,
        /// Worksheet id
        id: String,
    },

    /// Create a worksheet
    New {
        #[command(flatten)]
        session: SessionArgs,
        /// Worksheet name
        name: String,
        /// Folder to create the worksheet in
        #[arg(long, value_name = "FOLDER_ID")]
        folder: Option<String>,
    },

    /// Execute a worksheet's query
    Run {
        #[command(flatten)]
        session: SessionArgs,
        /// Worksheet id
        id: String,
        /// Query text to execute
        #[arg(long, value_name = "SQL")]
        query: String,
        #[command(flatten)]
        exec: ExecArgs,
    },

    /// Save query text into a worksheet
    Save {
        #[command(flatten)]
        session: SessionArgs,
        /// Worksheet id
        id: String,
        /// Query text to save
        #[arg(long, value_name = "SQL")]
        query: String,
        #[command(flatten)]
        exec: ExecArgs,
    },

    /// Delete a worksheet
    Delete {
        #[command(flatten)]
        session: SessionArgs,
        /// Worksheet id
        id: String,
    },
}

/// Execution-context overrides for run/save.
#[derive(Parser, Debug)]
pub struct ExecArgs {
    /// Role to run under (defaults to the session's default role)
    #[arg(long, value_name = "ROLE")]
    pub role: Option<String>,

    /// Warehouse to run on (defaults to the session's default warehouse)
    #[arg(long, value_name = "WAREHOUSE")]
    pub warehouse: Option<String>,

    /// Database context
    #[arg(long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Schema context
    #[arg(long, value_name = "SCHEMA")]
    pub schema: Option<String>,
}

/// Dashboard subcommands.
#[derive(Subcommand, Debug)]
pub enum DashboardCommand {
    /// List dashboards
    List(SessionArgs),

    /// Show one dashboard
    Show {
        #[command(flatten)]
        session: SessionArgs,
        /// Dashboard id
        id: String,
    },

    /// Create a dashboard
    New {
        #[command(flatten)]
        session: SessionArgs,
        /// Dashboard name
        name: String,
        /// Role the dashboard runs under
        #[arg(long, value_name = "ROLE")]
        role: Option<String>,
        /// Warehouse the dashboard runs on
        #[arg(long, value_name = "WAREHOUSE")]
        warehouse: Option<String>,
    },

    /// Re-run every worksheet on a dashboard
    Refresh {
        #[command(flatten)]
        session: SessionArgs,
        /// Dashboard id
        id: String,
    },

    /// Delete a dashboard
    Delete {
        #[command(flatten)]
        session: SessionArgs,
        /// Dashboard id
        id: String,
    },
}

/// Filter subcommands.
#[derive(Subcommand, Debug)]
pub enum FilterCommand {
    /// List the organization's filters
    List(SessionArgs),

    /// Create or replace a filter
    Set {
        #[command(flatten)]
        session: SessionArgs,
        /// Filter keyword
        keyword: String,
        /// Filter configuration JSON
        #[arg(long, value_name = "JSON")]
        config: String,
    },

    /// Delete a filter
    Delete {
        #[command(flatten)]
        session: SessionArgs,
        /// Filter keyword
        keyword: String,
    },
}

/// Folder subcommands.
#[derive(Subcommand, Debug)]
pub enum FolderCommand {
    /// List worksheet folders
    List(SessionArgs),
}

/// Query monitoring subcommands.
#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    /// Execution details of a query
    Detail {
        #[command(flatten)]
        session: SessionArgs,
        /// Query id
        id: String,
        /// Role override for visibility
        #[arg(long, value_name = "ROLE")]
        role: Option<String>,
    },

    /// Query-plan profile of a query
    Profile {
        #[command(flatten)]
        session: SessionArgs,
        /// Query id
        id: String,
        /// Role override for visibility
        #[arg(long, value_name = "ROLE")]
        role: Option<String>,
    },
}
