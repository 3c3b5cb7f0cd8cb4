//! CLI argument parsing for bridges.

use std::path::PathBuf;

use clap::Parser;

/// Common CLI arguments for all bridges.
#[derive(Parser, Debug, Clone)]
#[command(about = "HomeStats sensor bridge")]
pub struct BridgeArgs {
    /// Path to configuration file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl BridgeArgs {
    /// Parse CLI arguments, falling back to `default_config` when `--config` is absent.
    pub fn parse_with_default(default_config: &'static str) -> Self {
        Self::parse_from_with_default(std::env::args_os(), default_config)
    }

    /// Parse an explicit argument list with a default config path.
    pub fn parse_from_with_default<I, T>(args: I, default_config: &'static str) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = <Self as clap::CommandFactory>::command()
            .mut_arg("config", |arg| arg.default_value(default_config))
            .get_matches_from(args);

        <Self as clap::FromArgMatches>::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }
}
