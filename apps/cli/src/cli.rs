//! Command-line surface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use liftlog_core::{Privacy, WeightUnit};

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Log workouts offline; they sync when you're back online")]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir, sync.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Treat the device as offline. Saves stay local and pending.
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the current workout and sync state
    Status,

    /// Start a new workout
    Start,

    /// Add an exercise to the current workout
    #[command(arg_required_else_help = true)]
    AddExercise {
        /// Server-side exercise id
        exercise_id: String,

        /// Display name
        name: String,

        /// Exercise profile (e.g. a machine setup)
        #[arg(long)]
        profile: Option<String>,
    },

    /// Log a set; defaults to the reps and weight from last time
    #[command(arg_required_else_help = true)]
    AddSet {
        exercise_id: String,

        #[arg(long, short)]
        reps: Option<u32>,

        #[arg(long, short)]
        weight: Option<f64>,

        /// kg or lbs
        #[arg(long, short, value_parser = parse_unit)]
        unit: Option<WeightUnit>,
    },

    /// Finish the current workout and sync it
    Finish {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        gym: Option<String>,
    },

    /// Discard the current workout
    Cancel,

    /// Log a rest day
    RestDay,

    /// Retry syncing anything pending
    Sync {
        /// Stay running through automatic retries until everything is
        /// synced or retries run out
        #[arg(long)]
        wait: bool,
    },

    /// Store an access token
    #[command(arg_required_else_help = true)]
    Login {
        access_token: String,

        #[arg(long)]
        refresh_token: Option<String>,
    },

    /// Forget stored tokens
    Logout,

    /// Show or change settings
    Settings {
        /// Privacy for new workouts: public, friends or private
        #[arg(long, value_parser = parse_privacy)]
        privacy: Option<Privacy>,

        /// Display unit: kg or lbs
        #[arg(long, value_parser = parse_unit)]
        unit: Option<WeightUnit>,
    },
}

fn parse_unit(s: &str) -> Result<WeightUnit, String> {
    s.parse().map_err(|e: liftlog_core::CoreError| e.to_string())
}

fn parse_privacy(s: &str) -> Result<Privacy, String> {
    s.parse().map_err(|e: liftlog_core::CoreError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_set() {
        let cli = Cli::try_parse_from(["liftlog", "--offline", "add-set", "bench", "-r", "8", "-u", "lbs"]).unwrap();

        assert!(cli.offline);
        match cli.command {
            Command::AddSet {
                exercise_id,
                reps,
                weight,
                unit,
            } => {
                assert_eq!(exercise_id, "bench");
                assert_eq!(reps, Some(8));
                assert_eq!(weight, None);
                assert_eq!(unit, Some(WeightUnit::Lbs));
            }
            _ => panic!("expected add-set"),
        }
    }

    #[test]
    fn test_rejects_unknown_unit() {
        assert!(Cli::try_parse_from(["liftlog", "add-set", "bench", "-u", "stone"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
