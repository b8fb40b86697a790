use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use upcount::api::{self, SecurityConfig};
use upcount::config::ServerConfig;
use upcount::db;
use upcount::validate::{parse_goal, parse_log, parse_user, ShapeError};

#[derive(Parser)]
#[command(name = "upcount")]
#[command(about = "Goal tracking with progress logs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the development API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Check records in a JSON file against an entity shape
    Validate {
        kind: Kind,
        /// JSON file holding one record or an array of records
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    User,
    Goal,
    Log,
}

impl Kind {
    /// Narrow `value` and describe the record it holds.
    fn check(self, value: &Value) -> Result<String, ShapeError> {
        match self {
            Kind::User => parse_user(value).map(|u| match u.display_name {
                Some(name) => format!("{} <{}>", name, u.email),
                None => u.email,
            }),
            Kind::Goal => parse_goal(value).map(|g| g.summary()),
            Kind::Log => parse_log(value).map(|l| l.summary()),
        }
    }
}

/// Initialize tracing with output to stderr (for one-shot commands) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "upcount=debug,tower_http=debug".into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve(port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting UpCount server on port {}", port);

    let config = ServerConfig::from_env();
    let db = match &config.db_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    let app = api::create_router_with_config(db, SecurityConfig::from_server_config(&config));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("UpCount server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Print one line per record. Returns whether every record passed.
fn validate(kind: Kind, file: &Path) -> anyhow::Result<bool> {
    let content = std::fs::read_to_string(file)?;
    let value: Value = serde_json::from_str(&content)?;

    let records = match &value {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        other => vec![other],
    };

    let mut all_valid = true;
    for (index, record) in records.into_iter().enumerate() {
        match kind.check(record) {
            Ok(summary) => println!("{}: ok ({})", index, summary),
            Err(e) => {
                all_valid = false;
                println!("{}: invalid ({})", index, e);
            }
        }
    }
    Ok(all_valid)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let use_stderr = matches!(cli.command, Some(Commands::Validate { .. }));
    init_tracing(use_stderr);

    match cli.command {
        Some(Commands::Serve { port }) => serve(port).await?,
        Some(Commands::Validate { kind, file }) => {
            if !validate(kind, &file)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        None => serve(3000).await?,
    }

    Ok(ExitCode::SUCCESS)
}
