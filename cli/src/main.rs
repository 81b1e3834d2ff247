//! procdesk CLI
//!
//! Command-line interface for the procdesk custom-field engine.
//!
//! # Usage
//!
//! ```bash
//! procdesk -b forms.yaml resolve --process purchase --sub-process it,travel
//! procdesk -b forms.yaml validate --process purchase --answers answers.json
//! procdesk -b forms.yaml visibility --process purchase --answers answers.json
//! procdesk -b forms.yaml table --process purchase --field lines --column supplier --label Acme
//! procdesk config set default_format json
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod output;

use commands::Outcome;

#[derive(Parser)]
#[command(name = "procdesk")]
#[command(author = "procdesk")]
#[command(version)]
#[command(about = "Resolve, organize and validate custom request forms", long_about = None)]
struct Cli {
    /// Form bundle (JSON or YAML) with fields, sections and lookup tables
    #[arg(long, short, env = "PROCDESK_BUNDLE", global = true)]
    bundle: Option<PathBuf>,

    /// Output format
    #[arg(long, short, env = "PROCDESK_FORMAT", global = true)]
    format: Option<output::OutputFormat>,

    /// Maximum rows fetched per lookup
    #[arg(long, env = "PROCDESK_LOOKUP_ROW_LIMIT", global = true)]
    lookup_row_limit: Option<usize>,

    /// Profile name from config file
    #[arg(long, short, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the organized sections of a request context
    Resolve {
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Validate an answers file against the resolved form
    Validate {
        #[command(flatten)]
        context: ContextArgs,
        #[command(flatten)]
        answers: AnswersArgs,
    },
    /// Print which fields are visible for an answers file
    Visibility {
        #[command(flatten)]
        context: ContextArgs,
        #[command(flatten)]
        answers: AnswersArgs,
    },
    /// Add a row to a repeatable table and pick a lookup label in it
    Table {
        #[command(flatten)]
        context: ContextArgs,
        #[command(flatten)]
        answers: AnswersArgs,
        /// Repeatable-table field id
        #[arg(long)]
        field: String,
        /// Lookup column key
        #[arg(long)]
        column: String,
        /// Label to select
        #[arg(long)]
        label: String,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Args)]
pub struct ContextArgs {
    /// Process id
    #[arg(long)]
    pub process: Option<String>,

    /// Selected sub-process ids, in display order
    #[arg(long = "sub-process", value_delimiter = ',')]
    pub sub_processes: Vec<String>,
}

#[derive(Args)]
pub struct AnswersArgs {
    /// Prior answers (JSON or YAML object keyed by field id)
    #[arg(long, short)]
    pub answers: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init,
    /// Print the current configuration
    Show,
    /// Set a configuration value
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = config::Config::load(cli.profile.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable config: {}", e);
        config::Config::default()
    });
    if let Some(limit) = cli.lookup_row_limit {
        config.engine.lookup_row_limit = limit;
    }
    let format = cli.format.unwrap_or_else(|| config.format());
    let bundle = cli.bundle.or_else(|| config.bundle.clone().map(PathBuf::from));

    let result = match cli.command {
        Commands::Resolve { context } => {
            commands::resolve::handle(&context, bundle.as_deref(), &config.engine, format).await
        }
        Commands::Validate { context, answers } => {
            commands::validate::handle(&context, &answers, bundle.as_deref(), &config.engine, format).await
        }
        Commands::Visibility { context, answers } => {
            commands::visibility::handle(&context, &answers, bundle.as_deref(), &config.engine, format).await
        }
        Commands::Table { context, answers, field, column, label } => {
            let pick = commands::table::Pick { field, column, label };
            commands::table::handle(&context, &answers, &pick, bundle.as_deref(), &config.engine, format).await
        }
        Commands::Config { action } => commands::config::handle(action, cli.profile.as_deref()).await,
    };

    match result {
        Ok(Outcome::Success) => {}
        Ok(Outcome::ValidationFailed) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
