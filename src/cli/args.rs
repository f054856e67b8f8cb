use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    version,
    about = "Mark places on a map and keep them between sessions"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Directory holding the stored locations
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the pinmark application
    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_negative_coordinates_for_add() {
        let cli =
            Cli::try_parse_from(["pinmark", "--verbose", "add", "51.5,-0.12", "-33.8,151.2"])
                .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Add { points } => assert_eq!(points, vec!["51.5,-0.12", "-33.8,151.2"]),
            _ => panic!("expected add"),
        }
    }
}
