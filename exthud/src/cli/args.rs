//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "exthud",
    about = "Show extension activation times and profile extension host CPU usage",
    after_help = "\
EXAMPLES:
    exthud snapshot.json                               Live list, no profiling data
    exthud snapshot.json --trace recorded.json         Press P to profile (replays the recording)
    exthud snapshot.json --headless                    Print the list and exit
    exthud snapshot.json --trace t.json --headless --profile-secs 2 --export out.json"
)]
pub struct Args {
    /// Extension host snapshot (descriptions, marketplace records, statuses)
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Recorded profile trace replayed by profiling sessions
    #[arg(long, value_name = "FILE")]
    pub trace: Option<PathBuf>,

    /// Coalescing window for list refreshes, in milliseconds
    #[arg(long, default_value = "200")]
    pub refresh_ms: u64,

    /// Run without TUI
    #[arg(long)]
    pub headless: bool,

    /// In headless mode, profile for N seconds before printing (0 = don't profile)
    #[arg(long, default_value = "0", requires = "headless")]
    pub profile_secs: u64,

    /// Save the last profile to file on exit (Chrome trace format)
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["exthud", "snap.json"]);
        assert_eq!(args.snapshot, PathBuf::from("snap.json"));
        assert_eq!(args.refresh_ms, 200);
        assert!(!args.headless);
        assert_eq!(args.profile_secs, 0);
    }

    #[test]
    fn test_profile_secs_requires_headless() {
        let result = Args::try_parse_from(["exthud", "snap.json", "--profile-secs", "3"]);
        assert!(result.is_err());
        let args =
            Args::try_parse_from(["exthud", "snap.json", "--headless", "--profile-secs", "3"])
                .unwrap();
        assert_eq!(args.profile_secs, 3);
    }
}
