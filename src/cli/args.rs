//! Command-line argument parsing for HITRAN XSC
//!
//! This module defines the CLI structure using clap derive macros: browsing
//! cross-section metadata and managing the local metadata cache.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::models::{BoundRange, MoleculeId};
use crate::app::CrossSectionFilter;

/// HITRAN XSC - Browse HITRAN absorption cross-sections
#[derive(Parser, Debug)]
#[command(
    name = "hitran_xsc",
    version,
    about = "Browse HITRAN absorption cross-section metadata",
    long_about = "Fetches the HITRAN cross-section catalogue once, caches it on disk with an expiry,
and lists the cross-section files matching a molecule and physical conditions."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - only log errors (command reports still print)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query cross-section metadata
    Xsc(XscArgs),

    /// Cache management
    Cache(CacheArgs),
}

/// Arguments for cross-section queries
#[derive(Args, Debug)]
pub struct XscArgs {
    #[command(subcommand)]
    pub action: XscAction,
}

/// Cross-section actions
#[derive(Subcommand, Debug)]
pub enum XscAction {
    /// List cross-section files of a molecule
    List(ListArgs),

    /// Show how many cross-sections each molecule has
    Molecules {
        /// Re-fetch metadata even if the cache is fresh
        #[arg(long)]
        refresh: bool,
    },
}

/// Arguments for `xsc list`
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// HITRAN molecule id (e.g. 104 for CCl4)
    #[arg(short, long)]
    pub molecule: u32,

    /// Band that must lie strictly inside the file's band, in cm-1 (e.g. 760..800)
    #[arg(long, value_name = "LO..HI")]
    pub wn: Option<BoundRange>,

    /// Pressure bounds in Torr, exclusive
    #[arg(long, value_name = "LO..HI")]
    pub pressure: Option<BoundRange>,

    /// Temperature bounds in K, exclusive
    #[arg(long, value_name = "LO..HI")]
    pub temp: Option<BoundRange>,

    /// Re-fetch metadata even if the cache is fresh
    #[arg(long)]
    pub refresh: bool,

    /// Print pressure, temperature and band next to each file
    #[arg(short, long)]
    pub details: bool,
}

/// Arguments for cache management
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache management actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cached entries with their age
    Info,

    /// Remove every cached entry
    Clear,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        self.log_level_or(tracing::Level::WARN)
    }

    /// Like [`log_level`](Self::log_level) with `default` when no flag is set
    pub fn log_level_or(&self, default: tracing::Level) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            default
        }
    }
}

impl ListArgs {
    pub fn molecule_id(&self) -> MoleculeId {
        MoleculeId(self.molecule)
    }

    /// Filter described by the range options
    pub fn to_filter(&self) -> CrossSectionFilter {
        CrossSectionFilter {
            molecule_id: self.molecule_id(),
            wn_range: self.wn,
            pressure_range: self.pressure,
            temp_range: self.temp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with(global: GlobalArgs) -> Cli {
        Cli {
            global,
            command: Commands::Cache(CacheArgs {
                action: CacheAction::Info,
            }),
        }
    }

    fn global() -> GlobalArgs {
        GlobalArgs {
            verbose: false,
            very_verbose: false,
            quiet: false,
            config: None,
            cache_dir: None,
        }
    }

    #[test]
    fn test_log_level() {
        let quiet = cli_with(GlobalArgs {
            quiet: true,
            ..global()
        });
        let verbose = cli_with(GlobalArgs {
            verbose: true,
            ..global()
        });
        let plain = cli_with(global());

        assert_eq!(quiet.log_level(), tracing::Level::ERROR);
        assert_eq!(verbose.log_level(), tracing::Level::INFO);
        assert_eq!(plain.log_level(), tracing::Level::WARN);
        assert_eq!(
            plain.log_level_or(tracing::Level::DEBUG),
            tracing::Level::DEBUG
        );
        // Quiet wins over a configured level
        assert_eq!(
            quiet.log_level_or(tracing::Level::DEBUG),
            tracing::Level::ERROR
        );
    }

    #[test]
    fn test_quiet_help_describes_logging() {
        use clap::CommandFactory;

        let command = Cli::command();
        let quiet = command
            .get_arguments()
            .find(|arg| arg.get_id() == "quiet")
            .unwrap();
        let help = quiet.get_help().unwrap().to_string();
        assert!(help.contains("only log errors"));
    }

    #[test]
    fn test_parse_list_command() {
        let cli = Cli::try_parse_from([
            "hitran_xsc",
            "xsc",
            "list",
            "--molecule",
            "104",
            "--wn",
            "760..800",
            "--pressure",
            "700:800",
            "--refresh",
        ])
        .unwrap();

        let Commands::Xsc(XscArgs {
            action: XscAction::List(args),
        }) = cli.command
        else {
            panic!("expected xsc list");
        };

        assert!(args.refresh);
        let filter = args.to_filter();
        assert_eq!(filter.molecule_id, MoleculeId(104));
        assert_eq!(filter.wn_range, Some(BoundRange::new(760.0, 800.0)));
        assert_eq!(filter.pressure_range, Some(BoundRange::new(700.0, 800.0)));
        assert_eq!(filter.temp_range, None);
    }

    #[test]
    fn test_bad_range_is_rejected() {
        let result = Cli::try_parse_from([
            "hitran_xsc",
            "xsc",
            "list",
            "--molecule",
            "104",
            "--temp",
            "hot",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hitran_xsc", "cache", "clear", "--cache-dir", "/tmp/x", "-q"])
            .unwrap();
        assert!(cli.global.quiet);
        assert_eq!(cli.global.cache_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(
            cli.command,
            Commands::Cache(CacheArgs {
                action: CacheAction::Clear
            })
        ));
    }
}
