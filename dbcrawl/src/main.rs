//! Database metadata crawler.
//!
//! This binary resolves single-dash crawl options, connector selection,
//! configuration files and credentials into one session, then runs the
//! requested command against the database.
//!
//! # Security Guarantees
//! - Credentials are never logged
//! - Connection URLs are redacted in every message
//! - Passwords can come from the environment, a file or a prompt instead of
//!   the command line

use anyhow::Context;
use clap::Parser;
use dbcrawl_core::logging::init_logging;
use dbcrawl_core::{CommandLineSession, ConnectorRegistry, DiagnosticExecutor};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "dbcrawl")]
#[command(about = "Database metadata crawler")]
#[command(version)]
#[command(long_about = "
dbcrawl - Database metadata crawler

Crawl options use single-dash long names and are passed after the dbcrawl
switches. Exactly one command is given as a bare word.

CONNECTION:
  -server <tag> -host <h> -port <p> -database <db> [-urlx <k=v&..>]
  -url <connection-url>
  -user|-u <user> -password:env <VAR> | -password:file <path> | -password:prompt

CONFIGURATION:
  -configfile|-g <path[,path..]>   TOML files, later files win
  Bundled connector defaults < config files < command line

FILTERS:
  -schemas -tables -routines -synonyms -sequences <regex>
  -excludecolumns -excludeinout <regex>
  -grep-columns -grep-inout -grep-def <regex> [-invert-match] [-only-matching]
  -tabletypes -routinetypes <comma-list>
  -infolevel|-i <minimum|standard|detailed|maximum|custom>

COMMANDS:
  ping      Check that the database answers
  options   Print the resolved options as JSON

EXAMPLES:
  dbcrawl -server postgresql -host localhost -database crm -u app -password:prompt ping
  dbcrawl --verbose -url sqlite:///var/data/app.db -schemas 'main' -tables 'ORDER.*' options
")]
struct Cli {
    /// Increase verbosity
    #[arg(
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (--verbose, --verbose --verbose)"
    )]
    verbose: u8,

    /// Suppress output
    #[arg(long, help = "Suppress all output except errors")]
    quiet: bool,

    /// List compiled-in connectors
    #[arg(long, help = "List the database connectors in this build and exit")]
    list_connectors: bool,

    /// Crawl options and the command
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "ARGS",
        help = "Crawl options, connection settings and the command"
    )]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose, cli.quiet).context("Failed to initialize logging")?;

    let registry = Arc::new(ConnectorRegistry::with_default_connectors());
    if cli.list_connectors {
        list_connectors(&registry);
        return Ok(());
    }

    let session = CommandLineSession::new(cli.args, registry, Arc::new(DiagnosticExecutor));
    debug!("Starting session {}", session.id());
    session.run().await?;
    Ok(())
}

/// Prints every registered connector with its bundled URL template.
fn list_connectors(registry: &ConnectorRegistry) {
    println!("Supported Connectors:");
    println!();
    for connector in registry.connectors() {
        println!("{}:", connector.description());
        println!("  Server tag: {}", connector.server_type());
        match connector.bundled_config() {
            Ok(bundled) => {
                if let Some(template) = bundled.get("connection.url_template") {
                    println!("  URL:        {template}");
                }
            }
            Err(e) => println!("  Bundled config unavailable: {e}"),
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_flags_pass_through() {
        let cli = Cli::try_parse_from([
            "dbcrawl",
            "--verbose",
            "--verbose",
            "-server",
            "sqlite",
            "-tables",
            ".*",
            "--quiet",
            "list",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        assert_eq!(
            cli.args,
            vec!["-server", "sqlite", "-tables", ".*", "--quiet", "list"]
        );
    }

    #[test]
    fn test_binary_switches() {
        let cli = Cli::try_parse_from(["dbcrawl", "--quiet", "--list-connectors"]).unwrap();
        assert!(cli.quiet);
        assert!(cli.list_connectors);
        assert!(cli.args.is_empty());
    }
}
