use clap::{Parser, Subcommand};

/// Command-line interface definition for TimeBlocks
/// Plan the day in time blocks, track what actually happened, sync it
#[derive(Parser)]
#[command(
    name = "timeblocks",
    version = env!("CARGO_PKG_VERSION"),
    about = "Plan and track daily time blocks by category, with achievements and sync",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Override the remote store directory
    #[arg(global = true, long = "remote")]
    pub remote: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// Verbose diagnostics on stderr
    #[arg(global = true, long = "verbose", short = 'v')]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Inspect or upgrade the configuration file
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields with their defaults")]
        migrate: bool,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Create a backup copy of the database
    Backup {
        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long, help = "Compress the backup as .zip")]
        compress: bool,

        #[arg(long, help = "Overwrite an existing backup without asking")]
        force: bool,
    },

    /// Plan, track and list time blocks
    Block {
        #[command(subcommand)]
        action: BlockAction,
    },

    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Show and evaluate achievements
    Achievement {
        #[command(subcommand)]
        action: AchievementAction,
    },

    /// Time statistics
    Stats {
        #[command(subcommand)]
        action: StatsAction,
    },

    /// Show or change the signed-in user's settings
    Settings {
        #[arg(long, value_name = "true|false", help = "Apply a purchase/restore result")]
        premium: Option<bool>,

        #[arg(long, value_name = "light|dark|system")]
        theme: Option<String>,

        #[arg(long, value_name = "CODE")]
        language: Option<String>,

        #[arg(long, value_name = "true|false")]
        notifications: Option<bool>,

        #[arg(long = "max-categories", value_name = "N")]
        max_categories: Option<i32>,
    },

    /// Account management
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Synchronise with the remote store
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },

    /// Background jobs
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },
}

#[derive(Subcommand)]
pub enum BlockAction {
    /// Plan a new block
    Add {
        title: String,

        #[arg(long, value_name = "HH:MM")]
        start: String,

        #[arg(long, value_name = "HH:MM")]
        end: String,

        #[arg(long, short, help = "Category id or name (default from config)")]
        category: Option<String>,

        #[arg(long, short, help = "YYYY-MM-DD, today, yesterday or tomorrow")]
        date: Option<String>,

        #[arg(long = "desc")]
        description: Option<String>,
    },

    /// Change a block's plan
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long = "desc")]
        description: Option<String>,

        #[arg(long, value_name = "HH:MM")]
        start: Option<String>,

        #[arg(long, value_name = "HH:MM")]
        end: Option<String>,

        #[arg(long, short)]
        category: Option<String>,

        #[arg(long, short)]
        date: Option<String>,
    },

    /// Record the actual start (now unless --at)
    Start {
        id: String,

        #[arg(long, value_name = "HH:MM")]
        at: Option<String>,
    },

    /// Record the actual end and mark the block completed
    Done {
        id: String,

        #[arg(long, value_name = "HH:MM")]
        at: Option<String>,
    },

    /// Correct the recorded actual start
    SetStart { id: String, time: String },

    /// Correct the recorded actual end
    SetEnd { id: String, time: String },

    /// Delete a block
    Del { id: String },

    /// Delete every block of a date
    Purge { date: String },

    /// Show one block
    Show { id: String },

    /// List blocks for a date or period
    List {
        #[arg(long, short)]
        date: Option<String>,

        #[arg(
            long,
            short,
            conflicts_with = "date",
            help = "YYYY, YYYY-MM, YYYY-MM-DD or START:END"
        )]
        period: Option<String>,

        #[arg(long, help = "Only completed blocks")]
        completed: bool,
    },

    /// Blocks whose planned window contains a time
    Active {
        #[arg(long, short)]
        date: Option<String>,

        #[arg(long, value_name = "HH:MM")]
        at: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Create a custom category
    Add {
        name: String,

        #[arg(long, value_name = "#RRGGBB")]
        color: String,

        #[arg(long, default_value = "")]
        icon: String,
    },

    /// Change a category (by id or name)
    Edit {
        key: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_name = "#RRGGBB")]
        color: Option<String>,

        #[arg(long)]
        icon: Option<String>,

        #[arg(long)]
        order: Option<i32>,
    },

    /// Delete an unused category
    Del { key: String },

    /// Show one category
    Show { key: String },

    /// List categories
    List,

    /// Insert the built-in categories if missing
    Seed,
}

#[derive(Subcommand)]
pub enum AchievementAction {
    /// List achievements
    List {
        #[arg(long, help = "Only unlocked achievements")]
        unlocked: bool,

        #[arg(long, value_name = "TYPE", help = "streak, total_hours, category_mastery, perfect_week, early_bird, night_owl")]
        kind: Option<String>,
    },

    /// Show one achievement
    Show { id: String },

    /// Recompute progress and unlock what has been earned
    Evaluate,

    /// Unlock an achievement manually
    Unlock { id: String },

    /// Set an achievement's progress
    Progress { id: String, value: i32 },
}

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's blocks, completion and minutes
    Today,
    /// Trailing week
    Week,
    /// Trailing month
    Month,
    /// Trailing year
    Year,
    /// Explicit period
    Range {
        #[arg(help = "YYYY, YYYY-MM, YYYY-MM-DD or START:END")]
        period: String,
    },
    /// Current and longest run of consecutive days with blocks
    Streak,
}

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account and sign in
    SignUp {
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Sign in with email and password
    SignIn {
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Sign in with an account token
    Token { token: String },

    /// Sign out
    SignOut,

    /// Show the signed-in account
    Status,

    /// Delete the signed-in user's settings locally and remotely
    DeleteData,
}

#[derive(Subcommand)]
pub enum SyncAction {
    /// Upload pending local changes
    Push,
    /// Download remote records missing locally
    Pull,
    /// Pending changes and last sync time
    Status,
}

#[derive(Subcommand)]
pub enum JobsAction {
    /// Register the periodic jobs
    Schedule,

    /// Run the jobs that are due
    Run {
        #[arg(long, help = "Pretend the network is unavailable")]
        offline: bool,

        #[arg(long = "battery-low", help = "Pretend the battery is low")]
        battery_low: bool,
    },

    /// List scheduled jobs
    List,

    /// Cancel one job
    Cancel { name: String },

    /// Cancel every job
    CancelAll,
}
