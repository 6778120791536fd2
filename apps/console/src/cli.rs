use clap::{Args, Parser, Subcommand};

/// Terminal console for the operations hub backend.
#[derive(Debug, Parser)]
#[command(name = "opshub", version)]
pub struct Cli {
    /// Serve listings from built-in sample data instead of the backend.
    #[arg(long, global = true)]
    pub demo: bool,
    /// Backend base URL, overriding OPSHUB_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,
    /// Acting user id, overriding OPSHUB_ACTING_USER_ID.
    #[arg(long = "as-user", global = true)]
    pub acting_user_id: Option<i64>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List users, optionally running an action first.
    Users(UsersArgs),
    /// List audit events.
    Audit(AuditArgs),
}

/// Listing controls shared by every table.
#[derive(Debug, Default, Args)]
pub struct ListingArgs {
    /// Starting query string, e.g. "page=1&size=50&sort=email&order=desc".
    #[arg(long)]
    pub query: Option<String>,
    /// Column header to click; repeat to toggle the direction.
    #[arg(long = "sort")]
    pub sort: Vec<String>,
    /// Page size to select.
    #[arg(long)]
    pub size: Option<usize>,
    /// One-based page to move to.
    #[arg(long)]
    pub page: Option<usize>,
}

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(flatten)]
    pub listing: ListingArgs,
    /// Status filter: ACTIVE, DISABLED or ALL.
    #[arg(long)]
    pub status: Option<String>,
    #[command(subcommand)]
    pub action: Option<UsersAction>,
}

#[derive(Debug, Subcommand)]
pub enum UsersAction {
    /// Create a user.
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
    },
    /// Enable a disabled user or disable an active one.
    Toggle { user_id: i64 },
    /// Print the audit query for one user's history.
    History { user_id: i64 },
}

#[derive(Debug, Default, Args)]
pub struct AuditArgs {
    #[command(flatten)]
    pub listing: ListingArgs,
    /// Show the history of one user.
    #[arg(long = "user")]
    pub user_id: Option<i64>,
    #[arg(long)]
    pub entity_type: Option<String>,
    #[arg(long)]
    pub entity_id: Option<String>,
    #[arg(long)]
    pub action: Option<String>,
    #[arg(long = "actor")]
    pub actor_user_id: Option<String>,
    /// Lower time bound, e.g. 2025-03-01T00:00.
    #[arg(long)]
    pub from: Option<String>,
    /// Upper time bound.
    #[arg(long)]
    pub to: Option<String>,
}
