use anyhow::Result;
use clap::{Parser, Subcommand};

mod app;
mod cmd;
mod config;
mod connection;
mod utils;

use cmd::{CommandsArgs, ConnectArgs, DisconnectArgs};
use config::{GlobalOpts, Settings};

/// Lightning - connect this shell to a Lightning App and use its commands
///
/// Command layout:
///   lightning connect <app_name_or_id|localhost> [-y]
///   lightning disconnect
///   lightning commands
///
/// The connection is tracked per parent process (your shell): each terminal
/// can be connected to a different app.
///
/// Global flags / env:
///   -v / -vv / -vvv               Increase verbosity (logs go to stderr)
///   -q / --quiet                  Errors only
///   --connection-dir              LIGHTNING_CONNECTION_DIR  (default ~/.lightning/lightning_connection)
///   --local-app-url               LIGHTNING_LOCAL_APP_URL   (default http://localhost:7501)
///   --cloud-url                   LIGHTNING_CLOUD_URL       (default https://lightning.ai)
///   --api-key                     LIGHTNING_API_KEY         (or ~/.lightning/credentials.json)
///   --project-id                  LIGHTNING_CLOUD_PROJECT_ID
///
/// Examples:
///   lightning connect localhost
///   lightning connect my-app --yes
///   lightning commands
///   lightning disconnect
#[derive(Parser, Debug)]
#[command(
    name = "lightning",
    version,
    about = "Connect to a local or cloud Lightning App and install its commands",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error logs
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to a Lightning App (`localhost` for the local one)
    Connect(ConnectArgs),

    /// Disconnect from the current Lightning App
    Disconnect(DisconnectArgs),

    /// List the commands of the connected Lightning App
    Commands(CommandsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let settings = Settings::resolve(cli.global)?;

    match cli.command {
        Commands::Connect(args) => cmd::execute_connect(args, &settings),
        Commands::Disconnect(args) => cmd::execute_disconnect(args, &settings),
        Commands::Commands(args) => cmd::execute_commands(args, &settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_connect_with_yes() {
        let cli = Cli::try_parse_from(["lightning", "connect", "example", "-y"]).unwrap();
        match cli.command {
            Commands::Connect(a) => {
                assert_eq!(a.app_name_or_id, "example");
                assert!(a.yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lightning",
            "disconnect",
            "--connection-dir",
            "/tmp/conn",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.global.connection_dir.as_deref(),
            Some(std::path::Path::new("/tmp/conn"))
        );
        assert!(matches!(cli.command, Commands::Disconnect(_)));
    }

    #[test]
    fn connect_requires_app() {
        assert!(Cli::try_parse_from(["lightning", "connect"]).is_err());
    }
}
