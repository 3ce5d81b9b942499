use clap::{Parser, Subcommand};

/// Daily health reminders with desktop notifications.
#[derive(Debug, Parser)]
#[command(name = "vitals", version, about)]
pub struct Cli {
    /// Config file (default: $VITALS_CONFIG, then ~/.vitals/vitals.toml).
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a reminder.
    Add {
        #[arg(long)]
        user: String,
        /// water, medication or other (agua, remedio, outro also accepted).
        #[arg(long)]
        category: String,
        /// Time of day as HH:MM; defaults to 08:00.
        #[arg(long)]
        time: Option<String>,
        /// Store the reminder switched off.
        #[arg(long)]
        inactive: bool,
    },
    /// List reminders ordered by time of day.
    List {
        #[arg(long)]
        user: String,
        #[arg(long)]
        active_only: bool,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Change a reminder's category, time or active flag.
    Edit {
        #[arg(long)]
        user: String,
        id: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a reminder.
    Remove {
        #[arg(long)]
        user: String,
        id: String,
    },
    /// Schedule the user's reminders and raise notifications until Ctrl-C.
    Run {
        #[arg(long)]
        user: String,
        /// Print notifications as JSON lines instead of desktop alerts.
        #[arg(long)]
        stdout: bool,
    },
}
