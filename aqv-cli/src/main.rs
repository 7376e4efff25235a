//! AQV CLI - loads a directory of daily air-quality CSV files and queries,
//! animates or scripts the dashboard built from it.

use clap::Parser;
use env_logger::Env;

#[derive(Parser)]
#[command(
    name = "aqv-cli",
    version,
    about = "Air-quality dashboard data toolkit",
    long_about = "Query daily pollutant datasets, play regional rankings and replay dashboard navigation from the command line."
)]
struct Cli {
    /// Log loads and queries (-v), or every transition and frame too (-vv).
    /// RUST_LOG takes precedence when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: aqv_cmd::Command,
}

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(log_filter(cli.verbose))).init();
    aqv_cmd::run(cli.command).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_flags() {
        let cli = Cli::try_parse_from(["aqv-cli", "summary", "-vv"]).unwrap();
        assert_eq!(log_filter(cli.verbose), "debug");
        let cli = Cli::try_parse_from(["aqv-cli", "summary"]).unwrap();
        assert_eq!(log_filter(cli.verbose), "warn");
    }

    #[test]
    fn test_session_requires_steps() {
        assert!(Cli::try_parse_from(["aqv-cli", "session"]).is_err());
    }
}
