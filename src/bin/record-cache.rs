use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use record_cache::prelude::*;
use tracing::info;

#[derive(Debug, Clone, Parser)]
#[clap(about, version, author, name = "record-cache")]
struct Cli {
    /// Directory holding the snapshot files.
    #[clap(long, short = 'd', env = "RECORD_CACHE_DIR", default_value = ".record-cache")]
    storage_dir: PathBuf,

    /// Snapshot key. Use distinct keys for independent caches sharing a directory.
    #[clap(long, short, env = "RECORD_CACHE_KEY", default_value = DEFAULT_STORAGE_KEY)]
    key: String,

    /// Which mutations persist the snapshot.
    #[clap(long, env = "RECORD_CACHE_PERSIST", value_enum, default_value_t = PersistPolicy::EveryMutation)]
    persist: PersistPolicy,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Print a record.
    Read { data_id: String },
    /// Set a single record field. The value is parsed as JSON, falling back to a plain string.
    WriteField {
        data_id:  String,
        field:    String,
        value:    String,
        #[clap(long, short)]
        typename: Option<String>,
    },
    /// Map a root call storage key to a data id.
    WriteRootCall {
        storage_key: String,
        data_id:     String,
        #[clap(long)]
        arg:         Option<String>,
    },
    /// Resolve a root call by its name.
    ReadRootCall { call_name: String },
    /// Print the whole snapshot.
    Dump,
    /// Remove the snapshot.
    Clear,
}

fn setup_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::from_default_env();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing()?;

    let storage = FileStorage::with_key(&cli.storage_dir, &cli.key);
    info!(path = %storage.path().display(), "using file storage");
    let writer = CacheWriter::with_policy(storage, cli.persist);

    match cli.command {
        Command::Read { data_id } => match writer.read_node(&data_id) {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("null"),
        },
        Command::WriteField {
            data_id,
            field,
            value,
            typename,
        } => {
            writer.write_field(&data_id, &field, parse_value(&value), typename.as_deref());
        }
        Command::WriteRootCall {
            storage_key,
            data_id,
            arg,
        } => {
            writer.write_root_call(&storage_key, arg.as_deref(), &data_id);
        }
        Command::ReadRootCall { call_name } => {
            let data_id = writer.read_root_call(&call_name, None).await;
            println!("{}", serde_json::to_string(&data_id)?);
        }
        Command::Dump => {
            let snapshot: serde_json::Value =
                serde_json::from_str(&writer.snapshot()?).context("re-reading the snapshot")?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Clear => writer.clear_storage(),
    }

    // A one-shot process has nothing to batch with, so a manual policy still gets its snapshot on exit.
    if cli.persist == PersistPolicy::Manual {
        writer.persist()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = vec!["cmd", "--storage-dir", "/tmp/rc", "write-field", "1", "name", "\"Alice\"", "-t", "Person"];
        let cli = Cli::try_parse_from(args).expect("Failed to parse CLI arguments");
        assert_eq!(cli.key, DEFAULT_STORAGE_KEY);
        assert_eq!(cli.persist, PersistPolicy::EveryMutation);
        match cli.command {
            Command::WriteField { data_id, typename, .. } => {
                assert_eq!(data_id, "1");
                assert_eq!(typename.as_deref(), Some("Person"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_value_parsing() {
        assert_eq!(parse_value("42"), serde_json::json!(42));
        assert_eq!(parse_value("Alice"), serde_json::json!("Alice"));
        assert_eq!(parse_value("{\"a\":1}"), serde_json::json!({"a": 1}));
    }
}
