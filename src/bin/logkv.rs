//! logkv CLI
//!
//! Command-line interface over a local logkv store.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use logkv::config::DEFAULT_MAX_RECORD_SIZE;
use logkv::wal::{Operation, WalReader, WalRecovery};
use logkv::{Config, KvError, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// logkv CLI
#[derive(Parser, Debug)]
#[command(name = "logkv")]
#[command(about = "Embedded WAL-backed key-value store")]
#[command(version)]
struct Args {
    /// Path of the write-ahead log
    #[arg(short, long, env = "LOGKV_WAL", default_value = "./logkv.wal")]
    wal: PathBuf,

    /// Largest accepted key + value size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_RECORD_SIZE)]
    max_record_size: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List all live keys
    Keys,

    /// Check the log for truncation or corruption
    Verify,

    /// Print every record in the log
    Dump,
}

fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,logkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> logkv::Result<ExitCode> {
    let wal = args.wal;
    let max_record_size = args.max_record_size;

    match args.command {
        Commands::Get { key } => with_store(&wal, max_record_size, |store| {
            match store.get(key.as_bytes()) {
                Ok(value) => {
                    println!("{}", String::from_utf8_lossy(&value));
                    Ok(ExitCode::SUCCESS)
                }
                Err(KvError::KeyNotFound) => {
                    println!("(not found)");
                    Ok(ExitCode::FAILURE)
                }
                Err(e) => Err(e),
            }
        }),
        Commands::Set { key, value } => with_store(&wal, max_record_size, |store| {
            store.set(key.as_bytes(), value.as_bytes())?;
            println!("OK");
            Ok(ExitCode::SUCCESS)
        }),
        Commands::Del { key } => with_store(&wal, max_record_size, |store| {
            store.delete(key.as_bytes())?;
            println!("OK");
            Ok(ExitCode::SUCCESS)
        }),
        Commands::Keys => with_store(&wal, max_record_size, |store| {
            let mut keys: Vec<_> = store.keys().into_iter().collect();
            keys.sort();
            for key in keys {
                println!("{}", String::from_utf8_lossy(&key));
            }
            Ok(ExitCode::SUCCESS)
        }),
        Commands::Verify => {
            let stats = WalRecovery::verify(&wal, max_record_size)?;
            println!(
                "OK: {} records ({} sets, {} deletes), {} bytes",
                stats.entries_recovered, stats.sets, stats.deletes, stats.bytes_read
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Dump => {
            let reader = WalReader::open(&wal)?.with_max_record_size(max_record_size);
            for entry in reader.entries() {
                let entry = entry?;
                match entry.operation {
                    Operation::Set => println!(
                        "{} SET {} = {}",
                        entry.timestamp,
                        String::from_utf8_lossy(&entry.key),
                        String::from_utf8_lossy(&entry.value)
                    ),
                    Operation::Delete => println!(
                        "{} DEL {}",
                        entry.timestamp,
                        String::from_utf8_lossy(&entry.key)
                    ),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Open the store, run one command against it, then close it cleanly
fn with_store(
    wal: &Path,
    max_record_size: u32,
    command: impl FnOnce(&Store) -> logkv::Result<ExitCode>,
) -> logkv::Result<ExitCode> {
    let config = Config::builder()
        .wal_path(wal)
        .max_record_size(max_record_size)
        .build();
    let store = Store::open_with(config)?;
    let code = command(&store)?;
    store.close()?;
    Ok(code)
}
