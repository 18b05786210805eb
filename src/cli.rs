use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "negotiator-sync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Synchronize collection and network memberships into the BBMRI Negotiator",
    long_about = None
)]
pub struct Cli {
    /// Input file with users and their memberships (JSON)
    pub input: PathBuf,

    /// Configuration file (TOML) with credentials and endpoints
    #[arg(short, long, env = "NEGOTIATOR_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show what would change without modifying the Negotiator
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_single_positional() {
        let cli = Cli::try_parse_from(["negotiator-sync", "users.json"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("users.json"));
        assert!(!cli.dry_run);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_missing_input_rejected() {
        assert!(Cli::try_parse_from(["negotiator-sync"]).is_err());
    }

    #[test]
    fn test_extra_positional_rejected() {
        assert!(Cli::try_parse_from(["negotiator-sync", "a.json", "b.json"]).is_err());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "negotiator-sync",
            "-vv",
            "--dry-run",
            "--config",
            "/tmp/negotiator.toml",
            "users.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.dry_run);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/negotiator.toml")));
    }
}
