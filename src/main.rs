use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use chrono::Utc;
use clap::Parser;
use prunedir::{
    config::{LogLevel, Overrides, PrunedirConfig, resolve},
    observability::init_tracing,
    retention::{LocalFs, Outcome, PruneError, TerminalPrompt, run},
};

/// Exit status when the operator declines the confirmation prompt.
const EXIT_DECLINED: u8 = 3;

/// Remove or relocate the oldest entries of a directory, keeping the newest
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory whose direct children are pruned
    #[arg(value_name = "DIR")]
    dirs: Vec<PathBuf>,

    /// Minimum number of newest entries to keep [default: 1]
    #[arg(short = 'N', long, value_name = "N", allow_negative_numbers = true)]
    keep: Option<i64>,

    /// Only print the entries that would be removed
    #[arg(long)]
    print_only: bool,

    /// Print every entry prefixed with REMOVE or KEEP
    #[arg(long)]
    classify: bool,

    /// Do not ask before deleting or moving
    #[arg(long)]
    no_confirm: bool,

    /// Keep entries modified at or after this Unix time
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    since_unix_time: Option<i64>,

    /// Keep entries modified within the last DAYS days
    #[arg(long, value_name = "DAYS")]
    max_age_days: Option<u32>,

    /// Operate on directories instead of files
    #[arg(long)]
    directories: bool,

    /// Consider entries whose names start with '.'
    #[arg(long)]
    include_dotfiles: bool,

    /// Move removed entries into this existing directory instead of deleting them
    #[arg(long = "move", value_name = "DEST")]
    move_to: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            targets: self.dirs.clone(),
            keep: self.keep,
            since_unix_time: self.since_unix_time,
            max_age_days: self.max_age_days,
            directories: self.directories,
            include_dotfiles: self.include_dotfiles,
            no_confirm: self.no_confirm,
            move_to: self.move_to.clone(),
            print_only: self.print_only,
            classify: self.classify,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match execute(&args) {
        Ok(Outcome::Completed(_)) => ExitCode::SUCCESS,
        Ok(Outcome::Declined) => {
            eprintln!("User declined, no action taken.");
            ExitCode::from(EXIT_DECLINED)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(args: &Args) -> Result<Outcome, PruneError> {
    let mut config = match &args.config {
        Some(path) => PrunedirConfig::from_file(path)?,
        None => PrunedirConfig::default(),
    };

    if args.verbose {
        config.observability.logging.level = LogLevel::Debug;
    }
    if let Err(e) = init_tracing(&config.observability.logging) {
        eprintln!("warning: {e}");
    }

    let request = resolve(config, args.overrides(), Utc::now())?;
    tracing::debug!(request = ?request, "Resolved configuration");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = run(&request, &TerminalPrompt, &LocalFs, &mut out)?;
    out.flush().map_err(PruneError::Output)?;

    Ok(outcome)
}
