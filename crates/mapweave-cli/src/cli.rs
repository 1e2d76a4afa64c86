//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Mapweave CLI - declarative, bidirectional data mapping
///
/// Maps JSON or YAML documents through a mapping definition, forward from
/// source to target or in reverse from target back to source.
#[derive(Parser, Debug)]
#[command(
    name = "mapweave",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "MAPWEAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map a document through a definition
    Map(MapArgs),

    /// Compile a definition and report what it contains
    Check(CheckArgs),

    /// Manage configuration files
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the map command
#[derive(Parser, Debug)]
pub struct MapArgs {
    /// Path to the mapping definition (JSON or YAML)
    #[arg(value_name = "DEFINITION")]
    pub definition: PathBuf,

    /// Document to map (stdin if not specified)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Map from target back to source
    #[arg(short, long)]
    pub reverse: bool,

    /// Existing document to merge the result into
    #[arg(short, long, value_name = "FILE")]
    pub target: Option<PathBuf>,

    /// Extra named pipelines for `$apply` (JSON or YAML object)
    #[arg(short, long, value_name = "FILE")]
    pub pipelines: Option<PathBuf>,

    /// Treat the input as newline-delimited JSON, one record per line;
    /// each record is merged into the target separately
    #[arg(long)]
    pub ndjson: bool,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to the mapping definition (JSON or YAML)
    #[arg(value_name = "DEFINITION")]
    pub definition: PathBuf,

    /// Extra named pipelines for `$apply` (JSON or YAML object)
    #[arg(short, long, value_name = "FILE")]
    pub pipelines: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Write the user config instead of the project config (.mapweave.yaml)
    #[arg(long)]
    pub user: bool,

    /// Force overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli {
            verbose: 2,
            quiet: false,
            config: None,
            output: OutputFormat::Human,
            no_color: false,
            command: Commands::Check(CheckArgs {
                definition: PathBuf::from("mapping.json"),
                pipelines: None,
            }),
        };
        assert_eq!(cli.verbosity_level(), 2);

        let quiet_cli = Cli {
            verbose: 2,
            quiet: true,
            ..cli
        };
        assert_eq!(quiet_cli.verbosity_level(), 0);
    }

    #[test]
    fn test_map_arguments() {
        let cli = Cli::parse_from([
            "mapweave",
            "map",
            "mapping.yaml",
            "input.json",
            "--reverse",
            "--target",
            "existing.json",
            "--save-to",
            "out.json",
        ]);

        let Commands::Map(args) = cli.command else {
            panic!("expected the map command");
        };
        assert!(args.reverse);
        assert_eq!(args.input, Some(PathBuf::from("input.json")));
        assert_eq!(args.target, Some(PathBuf::from("existing.json")));
        assert_eq!(args.save_to, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_ndjson_accepts_target() {
        let cli = Cli::parse_from([
            "mapweave",
            "map",
            "mapping.json",
            "--ndjson",
            "--target",
            "existing.json",
        ]);

        let Commands::Map(args) = cli.command else {
            panic!("expected the map command");
        };
        assert!(args.ndjson);
        assert_eq!(args.target, Some(PathBuf::from("existing.json")));
    }
}
