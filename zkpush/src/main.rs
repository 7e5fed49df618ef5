use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use zkpush::config::SessionConfig;
use zkpush::session::{connect, run_scoped};

/// Upload files and directories into a ZooKeeper namespace.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// ZooKeeper connection string, e.g. `zk1:2181,zk2:2181/chroot`
    /// [env: ZKPUSH_CONNECTION_STRING]
    #[arg(short, long, global = true)]
    connection_string: Option<String>,

    /// Session timeout in milliseconds [env: ZKPUSH_SESSION_TIMEOUT_MS] [default: 30000]
    #[arg(short = 't', long, global = true)]
    session_timeout_ms: Option<u64>,

    /// Print the result as a JSON object
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging (can be specified multiple times)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Upload a file or a directory tree; prints the number of files written
    Upload {
        /// Local file or directory
        input: PathBuf,
        /// Target node; a trailing `/` keeps the file name of a single file
        target: String,
    },
    /// Recursively delete a node; prints the number of nodes removed
    Delete { path: String },
    /// Print whether a node exists
    Exists { path: String },
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    operation: &'static str,
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
}

impl Report<'_> {
    fn render(&self, json: bool) -> anyhow::Result<String> {
        if json {
            return Ok(serde_json::to_string(self)?);
        }
        Ok(match (self.count, self.exists) {
            (Some(count), _) => count.to_string(),
            (None, Some(exists)) => exists.to_string(),
            (None, None) => String::new(),
        })
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("zkpush=info,zkpush_core=info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Upload { input, .. } = &cli.command {
        if !input.exists() {
            anyhow::bail!("input path does not exist: {}", input.display());
        }
    }

    let config = SessionConfig::resolve(cli.connection_string, cli.session_timeout_ms)?;
    let namespace = connect(&config)
        .with_context(|| format!("failed to open session to {}", config.connection_string))?;

    let report = match &cli.command {
        Command::Upload { input, target } => {
            let count = run_scoped(namespace, |engine| engine.upload(input, target))
                .with_context(|| format!("failed to upload {} to {target}", input.display()))?;
            Report {
                operation: "upload",
                path: target,
                count: Some(count),
                exists: None,
            }
        }
        Command::Delete { path } => {
            let count = run_scoped(namespace, |engine| engine.delete(path))
                .with_context(|| format!("failed to delete {path}"))?;
            Report {
                operation: "delete",
                path,
                count: Some(count),
                exists: None,
            }
        }
        Command::Exists { path } => {
            let exists = run_scoped(namespace, |engine| engine.exists(path))
                .with_context(|| format!("failed to check {path}"))?;
            Report {
                operation: "exists",
                path,
                count: None,
                exists: Some(exists),
            }
        }
    };

    println!("{}", report.render(cli.json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("zkpush").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parses_upload_with_global_flags_after_subcommand() {
        let cli = parse(&["upload", "conf", "/app/", "-c", "zk:2181", "-t", "5000"]);
        assert_eq!(
            cli.command,
            Command::Upload {
                input: PathBuf::from("conf"),
                target: "/app/".to_string(),
            }
        );
        assert_eq!(cli.connection_string.as_deref(), Some("zk:2181"));
        assert_eq!(cli.session_timeout_ms, Some(5000));
    }

    #[test]
    fn parses_delete_and_exists() {
        assert_eq!(
            parse(&["delete", "/app"]).command,
            Command::Delete {
                path: "/app".to_string()
            }
        );
        assert_eq!(parse(&["-vv", "exists", "/app"]).verbose, 2);
    }

    #[test]
    fn upload_requires_target() {
        assert!(Cli::try_parse_from(["zkpush", "upload", "conf"]).is_err());
    }

    #[test]
    fn report_renders_plain_count() {
        let report = Report {
            operation: "delete",
            path: "/app",
            count: Some(10),
            exists: None,
        };
        assert_eq!(report.render(false).unwrap(), "10");
    }

    #[test]
    fn report_renders_json_without_empty_fields() {
        let report = Report {
            operation: "exists",
            path: "/app",
            count: None,
            exists: Some(true),
        };
        let value: serde_json::Value =
            serde_json::from_str(&report.render(true).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"operation": "exists", "path": "/app", "exists": true})
        );
    }
}
