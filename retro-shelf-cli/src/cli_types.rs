//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use retro_shelf_core::Platform;

#[derive(Parser)]
#[command(name = "retro-shelf")]
#[command(about = "Keep a retro game library's metadata and art up to date", long_about = None)]
pub(crate) struct Cli {
    /// Root path containing system folders (defaults to current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Only show warnings and errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable debug logging with timestamps
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub(crate) struct ScrapeArgs {
    /// System names or aliases (e.g., snes,megadrive,psx)
    #[arg(short, long, value_delimiter = ',')]
    pub systems: Option<Vec<Platform>>,

    /// Maximum number of games to push per system
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Number of scrape engines (capped by the account's thread allowance)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Media types to download (e.g., screenshots,covers,videos,wheels)
    #[arg(long, value_delimiter = ',')]
    pub media: Option<Vec<String>>,

    /// Preferred region for names and media (e.g., us, eu, jp)
    #[arg(long)]
    pub region: Option<String>,

    /// Preferred language for descriptions (e.g., en, fr)
    #[arg(long)]
    pub language: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Scrape every eligible game in the background until done
    Scrape(ScrapeArgs),

    /// List supported systems
    List,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show resolved settings and where each credential comes from
    Show,

    /// Print the config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_args_parse_systems_and_lists() {
        let cli = Cli::try_parse_from([
            "retro-shelf",
            "--root",
            "/roms",
            "scrape",
            "--systems",
            "snes,megadrive",
            "--media",
            "screenshots,videos",
            "--threads",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/roms")));
        let Commands::Scrape(args) = cli.command else {
            panic!("expected scrape");
        };
        assert_eq!(
            args.systems,
            Some(vec![Platform::Snes, Platform::Genesis])
        );
        assert_eq!(args.media.unwrap().len(), 2);
        assert_eq!(args.threads, Some(2));
    }

    #[test]
    fn unknown_system_is_rejected() {
        assert!(Cli::try_parse_from(["retro-shelf", "scrape", "--systems", "atari9000"]).is_err());
    }
}
