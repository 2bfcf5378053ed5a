//! Clap derive structures for the `lifeline` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use lifeline_core::{CrewStatus, Priority, RequestStatus, Role, ServiceType};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lifeline -- dispatch board CLI for emergency service coordination
#[derive(Debug, Parser)]
#[command(
    name = "lifeline",
    version,
    about = "Coordinate emergency service requests from the command line",
    long_about = "A dispatch board for emergency service coordination.\n\n\
        Citizens submit service requests, dispatchers assign crews, and\n\
        everyone watches the board update in real time.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "LIFELINE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base URL (overrides profile)
    #[arg(long, short = 'b', env = "LIFELINE_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Anon API key
    #[arg(long, env = "LIFELINE_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Run against a built-in in-memory demo board (no backend needed)
    #[arg(long, global = true)]
    pub demo: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LIFELINE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds
    #[arg(long, env = "LIFELINE_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Value-enum mirrors of the domain enums ───────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ServiceArg {
    Sar,
    Csar,
    Refueling,
    Medical,
    Escort,
    Cargo,
}

impl From<ServiceArg> for ServiceType {
    fn from(arg: ServiceArg) -> Self {
        match arg {
            ServiceArg::Sar => Self::Sar,
            ServiceArg::Csar => Self::Csar,
            ServiceArg::Refueling => Self::Refueling,
            ServiceArg::Medical => Self::Medical,
            ServiceArg::Escort => Self::Escort,
            ServiceArg::Cargo => Self::Cargo,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Self::Low,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::High => Self::High,
            PriorityArg::Critical => Self::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilterArg {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl From<StatusFilterArg> for RequestStatus {
    fn from(arg: StatusFilterArg) -> Self {
        match arg {
            StatusFilterArg::Pending => Self::Pending,
            StatusFilterArg::Assigned => Self::Assigned,
            StatusFilterArg::InProgress => Self::InProgress,
            StatusFilterArg::Completed => Self::Completed,
            StatusFilterArg::Cancelled => Self::Cancelled,
        }
    }
}

/// Statuses a dispatcher may move a request to directly.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TransitionArg {
    InProgress,
    Completed,
    Cancelled,
}

impl From<TransitionArg> for RequestStatus {
    fn from(arg: TransitionArg) -> Self {
        match arg {
            TransitionArg::InProgress => Self::InProgress,
            TransitionArg::Completed => Self::Completed,
            TransitionArg::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CrewStatusArg {
    Available,
    OnMission,
    Standby,
    Offline,
}

impl From<CrewStatusArg> for CrewStatus {
    fn from(arg: CrewStatusArg) -> Self {
        match arg {
            CrewStatusArg::Available => Self::Available,
            CrewStatusArg::OnMission => Self::OnMission,
            CrewStatusArg::Standby => Self::Standby,
            CrewStatusArg::Offline => Self::Offline,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Dispatcher,
    Pilot,
    Crew,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Dispatcher => Self::Dispatcher,
            RoleArg::Pilot => Self::Pilot,
            RoleArg::Crew => Self::Crew,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Board overview: pending requests, crew availability, recent activity
    #[command(alias = "dash")]
    Dashboard,

    /// Manage service requests
    #[command(alias = "req", alias = "r")]
    Requests(RequestsArgs),

    /// Manage crews
    #[command(alias = "crew")]
    Crews(CrewsArgs),

    /// View the personnel roster
    #[command(alias = "roster")]
    Personnel(PersonnelArgs),

    /// View the activity log
    #[command(alias = "log")]
    Activity(ActivityArgs),

    /// Watch the board and alert on new requests
    Watch,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REQUESTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RequestsArgs {
    #[command(subcommand)]
    pub command: RequestsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RequestsCommand {
    /// List service requests
    #[command(alias = "ls")]
    List {
        /// Filter by status
        #[arg(long, value_enum)]
        status: Option<StatusFilterArg>,

        /// Filter by service type
        #[arg(long, value_enum)]
        service: Option<ServiceArg>,

        /// Only this priority or higher
        #[arg(long, value_enum)]
        min_priority: Option<PriorityArg>,

        /// Only requests still on the active board
        #[arg(long, conflicts_with = "status")]
        active: bool,

        /// Only requests assigned to this crew
        #[arg(long)]
        crew: Option<String>,
    },

    /// Get request details
    Get {
        /// Request ID
        id: String,
    },

    /// Submit a new service request
    Create {
        /// Service type
        #[arg(long, value_enum, required = true)]
        service: ServiceArg,

        /// Priority
        #[arg(long, value_enum, default_value = "medium")]
        priority: PriorityArg,

        /// Where help is needed
        #[arg(long, required = true)]
        location: String,

        /// What the responding crew will find
        #[arg(long, short = 'd', required = true)]
        description: String,

        /// Submit on behalf of a named citizen (defaults to the
        /// signed-in operator)
        #[arg(long)]
        requester: Option<String>,

        /// Discord handle the requester can be reached on
        #[arg(long)]
        discord: Option<String>,
    },

    /// Assign a crew to a pending request (dispatcher only)
    Assign {
        /// Request ID
        request: String,

        /// Crew ID to send
        #[arg(long, required = true)]
        crew: String,
    },

    /// Move a request through its lifecycle (dispatcher only)
    Status {
        /// Request ID
        request: String,

        /// New status
        #[arg(value_enum)]
        status: TransitionArg,
    },

    /// Cancel a request (dispatcher only)
    Cancel {
        /// Request ID
        request: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CREWS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CrewsArgs {
    #[command(subcommand)]
    pub command: CrewsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CrewsCommand {
    /// List crews
    #[command(alias = "ls")]
    List {
        /// Only crews available for dispatch
        #[arg(long)]
        available: bool,

        /// Only crews that can take this service type right now
        #[arg(long, value_enum, conflicts_with = "available")]
        can_serve: Option<ServiceArg>,
    },

    /// Get crew details
    Get {
        /// Crew ID
        id: String,
    },

    /// Register a new crew (dispatcher only)
    Create {
        /// Crew name
        #[arg(long, required = true)]
        name: String,

        /// Radio callsign
        #[arg(long)]
        callsign: Option<String>,

        /// Ship the crew flies
        #[arg(long)]
        ship: Option<String>,

        /// Service types the crew handles (comma-separated; empty = any)
        #[arg(long, value_enum, value_delimiter = ',')]
        capabilities: Vec<ServiceArg>,

        /// Starting position
        #[arg(long)]
        location: Option<String>,

        /// Personnel IDs riding with the crew (comma-separated)
        #[arg(long, value_delimiter = ',')]
        members: Vec<String>,
    },

    /// Update a crew (dispatcher only)
    Update {
        /// Crew ID
        id: String,

        /// New crew name
        #[arg(long)]
        name: Option<String>,

        /// New radio callsign
        #[arg(long)]
        callsign: Option<String>,

        /// New ship
        #[arg(long)]
        ship: Option<String>,

        /// New status
        #[arg(long, value_enum)]
        status: Option<CrewStatusArg>,

        /// Replace the capability list (comma-separated)
        #[arg(long, value_enum, value_delimiter = ',')]
        capabilities: Option<Vec<ServiceArg>>,

        /// New position
        #[arg(long)]
        location: Option<String>,

        /// Replace the member list (comma-separated personnel IDs)
        #[arg(long, value_delimiter = ',')]
        members: Option<Vec<String>>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PERSONNEL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PersonnelArgs {
    #[command(subcommand)]
    pub command: PersonnelCommand,
}

#[derive(Debug, Subcommand)]
pub enum PersonnelCommand {
    /// List the personnel roster
    #[command(alias = "ls")]
    List {
        /// Filter by role
        #[arg(long, value_enum)]
        role: Option<RoleArg>,

        /// Only dispatchers
        #[arg(long, conflicts_with = "role")]
        dispatchers: bool,

        /// Only people currently online
        #[arg(long)]
        online: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ACTIVITY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ActivityArgs {
    #[command(subcommand)]
    pub command: ActivityCommand,
}

#[derive(Debug, Subcommand)]
pub enum ActivityCommand {
    /// List recent activity entries
    #[command(alias = "ls")]
    List {
        /// Max entries to show
        #[arg(long, short = 'l', default_value = "20")]
        limit: usize,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Print the config file path
    Path,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
