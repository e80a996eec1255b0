//! Clap derive structures for the `passline` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use passline_core::{Collection, InvoiceStatus, OrderStatus, StaffRole, ViewRole};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// passline -- live order board and notifications for restaurant staff
#[derive(Debug, Parser)]
#[command(
    name = "passline",
    version,
    about = "Watch restaurant orders, tables, and invoices live from the terminal",
    long_about = "Follows a venue's collection store in real time.\n\n\
        Each role (kitchen, server, admin, customer) watches a fixed set of\n\
        collections and is told once about every order that is placed or ready.",
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
    /// Venue profile to use
    #[arg(long, short = 'p', env = "PASSLINE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Collection store URL (overrides profile)
    #[arg(long, env = "PASSLINE_STORE_URL", global = true)]
    pub store_url: Option<String>,

    /// Venue identifier (overrides profile)
    #[arg(long, env = "PASSLINE_VENUE", global = true)]
    pub venue: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PASSLINE_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PASSLINE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "PASSLINE_TIMEOUT", default_value = "30", global = true)]
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
    Auto,
    Always,
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Follow collections live and print notifications as they fire
    Watch(WatchArgs),

    /// Orders on the board
    Orders(OrdersArgs),

    /// Venue tables
    Tables(CollectionArgs),

    /// Invoices
    Invoices(InvoicesArgs),

    /// Menu QR scans
    Scans(CollectionArgs),

    /// Staff accounts
    Staff(StaffArgs),

    /// Log in with a staff PIN and store the session token
    Login,

    /// Forget the stored session token
    Logout,

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Run a scripted service against an in-process store
    Demo(DemoArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Client role: kitchen, server, admin, or customer (defaults to profile role)
    #[arg(long, short = 'r', conflicts_with = "collections")]
    pub role: Option<ViewRole>,

    /// Explicit collections to follow: orders, tables, invoices, scans, staff
    #[arg(long, short = 'C', value_delimiter = ',')]
    pub collections: Vec<Collection>,

    /// Disable the terminal bell for audible cues
    #[arg(long)]
    pub no_bell: bool,
}

// ── Collection listings ──────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CollectionArgs {
    #[command(subcommand)]
    pub command: ListOnly,
}

#[derive(Debug, Subcommand)]
pub enum ListOnly {
    /// List current documents
    List,
}

#[derive(Debug, Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: OrdersCommand,
}

#[derive(Debug, Subcommand)]
pub enum OrdersCommand {
    /// List current orders
    List {
        /// Only orders not yet served
        #[arg(long, conflicts_with = "status")]
        open: bool,

        /// Only orders in this status: pending, preparing, ready, served
        #[arg(long)]
        status: Option<OrderStatus>,

        /// Only orders for this table
        #[arg(long)]
        table: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct InvoicesArgs {
    #[command(subcommand)]
    pub command: InvoicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum InvoicesCommand {
    /// List invoices
    List {
        /// Only invoices awaiting payment
        #[arg(long, conflicts_with = "status")]
        unpaid: bool,

        /// Only invoices in this status: pending, paid, cancelled
        #[arg(long)]
        status: Option<InvoiceStatus>,
    },
}

// ── Staff ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StaffArgs {
    #[command(subcommand)]
    pub command: StaffCommand,
}

#[derive(Debug, Subcommand)]
pub enum StaffCommand {
    /// List staff accounts
    List {
        /// Only active accounts
        #[arg(long)]
        active: bool,

        /// Only accounts with this role: kitchen, server, admin
        #[arg(long)]
        role: Option<StaffRole>,
    },

    /// Add a staff account
    Add {
        /// Display name
        name: String,

        /// Role: kitchen, server, admin
        #[arg(long, short = 'r')]
        role: StaffRole,

        /// Create the account disabled
        #[arg(long)]
        inactive: bool,
    },

    /// Remove a staff account
    Remove {
        /// Staff document id
        id: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Demo ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Pause between scripted steps, in milliseconds
    #[arg(long, default_value = "400")]
    pub step_ms: u64,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
