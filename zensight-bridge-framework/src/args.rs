//! CLI argument parsing for bridges.

use std::path::PathBuf;

use clap::Parser;

/// Common CLI arguments for all bridges.
#[derive(Parser, Debug, Clone)]
#[command(about = "ZenSight polling bridge", version)]
pub struct BridgeArgs {
    /// Path to configuration file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Run a single collection pass, publish it, and exit.
    #[arg(long)]
    pub once: bool,
}

impl BridgeArgs {
    /// Parse CLI arguments with a default config path.
    ///
    /// If no `--config` argument is provided, uses the default.
    pub fn parse_with_default(default_config: &'static str) -> Self {
        Self::parse_from_with_default(std::env::args_os(), default_config)
    }

    /// Parse the given argument list with a default config path.
    ///
    /// Exits the process with clap's usage message on invalid arguments.
    pub fn parse_from_with_default<I, T>(args: I, default_config: &'static str) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        parse_cli_from(args, default_config)
    }
}

/// Parse a bridge CLI that flattens [`BridgeArgs`], with a default config path.
///
/// Exits the process with clap's usage message on invalid arguments.
pub fn parse_cli_from<C, I, T>(args: I, default_config: &'static str) -> C
where
    C: Parser,
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = <C as clap::CommandFactory>::command()
        .mut_arg("config", |arg| arg.default_value(default_config))
        .get_matches_from(args);

    <C as clap::FromArgMatches>::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let args = BridgeArgs::parse_from_with_default(["bridge"], "elasticsearch.json5");
        assert_eq!(args.config, PathBuf::from("elasticsearch.json5"));
        assert!(args.log_level.is_none());
        assert!(!args.once);
    }

    #[test]
    fn test_overrides() {
        let args = BridgeArgs::parse_from_with_default(
            [
                "bridge",
                "--config",
                "/etc/zensight/es.json5",
                "--log-level",
                "debug",
                "--once",
            ],
            "elasticsearch.json5",
        );
        assert_eq!(args.config, PathBuf::from("/etc/zensight/es.json5"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.once);
    }
}
