//! CLI binary for the gce-metadata crate.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use gce_metadata::{resolve_host, MetadataClient, MetadataError, DEFAULT_TIMEOUT, HOST_ENV};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gce-metadata")]
#[command(author, version, about = "Query the Google Compute Engine metadata server")]
struct Cli {
    /// Metadata host (host[:port]); defaults to $GCE_METADATA_HOST or 169.254.169.254
    #[arg(long, global = true)]
    host: Option<String>,

    /// Fail with an error instead of printing nothing when not on GCE
    #[arg(long, global = true)]
    strict: bool,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether this process runs on GCE
    Detect,

    /// Fetch a single metadata field
    Get {
        #[arg(value_enum)]
        field: Field,
    },

    /// Fetch a user-defined attribute value
    Attribute {
        key: String,

        /// Read the project attribute instead of the instance attribute
        #[arg(short, long)]
        project: bool,
    },

    /// Show a service account's email or scopes
    ServiceAccount {
        /// Account name; the instance's default account when omitted
        #[arg(short, long)]
        account: Option<String>,

        /// Print the OAuth scopes instead of the email
        #[arg(short, long)]
        scopes: bool,
    },

    /// Print every field as JSON, leaving unavailable ones empty
    Snapshot {
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Field {
    ProjectId,
    NumericProjectId,
    InstanceId,
    InternalIp,
    ExternalIp,
    Hostname,
    InstanceName,
    Zone,
    Tags,
    InstanceAttributes,
    ProjectAttributes,
}

enum Value {
    Text(String),
    List(Vec<String>),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), MetadataError> {
    let host = cli
        .host
        .unwrap_or_else(|| resolve_host(std::env::var(HOST_ENV).ok()));
    let timeout = cli
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TIMEOUT);
    let metadata = MetadataClient::with_host(&host)?
        .with_timeout(timeout)
        .throw_if_not_on_gce(cli.strict);

    match cli.command {
        Commands::Detect => {
            println!("{}", metadata.is_on_gce().await);
            Ok(())
        }

        Commands::Get { field } => {
            let value = match field {
                Field::ProjectId => metadata.project_id().await?.map(Value::Text),
                Field::NumericProjectId => metadata.numeric_project_id().await?.map(Value::Text),
                Field::InstanceId => metadata.instance_id().await?.map(Value::Text),
                Field::InternalIp => metadata.internal_ip().await?.map(Value::Text),
                Field::ExternalIp => metadata.external_ip().await?.map(Value::Text),
                Field::Hostname => metadata.hostname().await?.map(Value::Text),
                Field::InstanceName => metadata.instance_name().await?.map(Value::Text),
                Field::Zone => metadata.zone().await?.map(Value::Text),
                Field::Tags => metadata.instance_tags().await?.map(Value::List),
                Field::InstanceAttributes => {
                    metadata.instance_attributes().await?.map(Value::List)
                }
                Field::ProjectAttributes => metadata.project_attributes().await?.map(Value::List),
            };
            print_value(value)
        }

        Commands::Attribute { key, project } => {
            let value = if project {
                metadata.project_attribute_value(&key).await?
            } else {
                metadata.instance_attribute_value(&key).await?
            };
            print_value(value.map(Value::Text))
        }

        Commands::ServiceAccount { account, scopes } => {
            let value = if scopes {
                metadata.scopes(account.as_deref()).await?.map(Value::List)
            } else {
                metadata.email(account.as_deref()).await?.map(Value::Text)
            };
            print_value(value)
        }

        Commands::Snapshot { pretty } => {
            let snapshot = metadata.snapshot().await;
            let json = if pretty {
                serde_json::to_string_pretty(&snapshot)?
            } else {
                serde_json::to_string(&snapshot)?
            };
            println!("{}", json);
            Ok(())
        }
    }
}

/// Print a fetched value. `None` comes from a permissive client off GCE and
/// prints nothing; a strict client has already failed with `NotOnGce`.
fn print_value(value: Option<Value>) -> Result<(), MetadataError> {
    if let Some(text) = render(value) {
        println!("{}", text);
    }
    Ok(())
}

fn render(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Text(text) => Some(text),
        Value::List(items) if items.is_empty() => None,
        Value::List(items) => Some(items.join("\n")),
    }
}
