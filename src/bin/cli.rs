//! spacekv CLI
//!
//! Command-line access to a spacekv data directory.

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use spacekv::{
    open_indexed, open_scan, Config, KeyspaceAdapter, Result, Strategy, StructuralCriteria,
    TextualCriteria,
};

/// spacekv CLI
#[derive(Parser, Debug)]
#[command(name = "spacekv-cli")]
#[command(about = "Keyspace object store over an embedded LSM engine")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./spacekv_data")]
    data_dir: String,

    /// Keyspace strategy: indexed or scan
    #[arg(short, long, default_value = "indexed")]
    strategy: Strategy,

    /// Fail if the data directory does not exist yet
    #[arg(long)]
    no_create: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a JSON value under an id
    Put {
        keyspace: String,
        id: String,
        /// JSON document, e.g. '{"name":"Alice"}'
        value: String,
    },

    /// Print the value stored under an id
    Get { keyspace: String, id: String },

    /// Delete an id and print what was removed
    Delete { keyspace: String, id: String },

    /// Print every value of a keyspace
    List { keyspace: String },

    /// Print the number of records in a keyspace
    Count { keyspace: String },

    /// Print values whose JSON text contains a substring
    Find { keyspace: String, substring: String },

    /// Delete a whole keyspace
    Drop { keyspace: String },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,spacekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .create_if_missing(!args.no_create)
        .strategy(args.strategy)
        .build();

    if let Err(e) = run(config, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(config: Config, command: Commands) -> Result<()> {
    match config.strategy {
        Strategy::Indexed => {
            let store = open_indexed(config)?;
            let outcome = match command {
                Commands::Find {
                    keyspace,
                    substring,
                } => {
                    let criteria = StructuralCriteria::<Value>::new()
                        .value(move |v| v.to_string().contains(&substring));
                    store.find(&criteria, &keyspace).map(print_all)
                }
                other => execute(&store, other),
            };
            finish(&store, outcome)
        }
        Strategy::Scan => {
            let store = open_scan(config)?;
            let outcome = match command {
                Commands::Find {
                    keyspace,
                    substring,
                } => {
                    let criteria = TextualCriteria::new(format!("{}:", keyspace), substring);
                    store.find::<Value>(&criteria, &keyspace).map(print_all)
                }
                other => execute(&store, other),
            };
            finish(&store, outcome)
        }
    }
}

/// Strategy-independent commands
fn execute<A: KeyspaceAdapter>(store: &A, command: Commands) -> Result<()> {
    match command {
        Commands::Put {
            keyspace,
            id,
            value,
        } => {
            let value: Value = serde_json::from_str(&value)
                .map_err(|e| spacekv::SpaceKvError::InvalidArgument(format!("value is not JSON: {}", e)))?;
            store.put(&id, value, &keyspace)?;
            println!("OK");
        }
        Commands::Get { keyspace, id } => match store.get::<Value>(&id, &keyspace)? {
            Some(value) => println!("{}", value),
            None => println!("(not found)"),
        },
        Commands::Delete { keyspace, id } => match store.delete::<Value>(&id, &keyspace)? {
            Some(value) => println!("{}", value),
            None => println!("(not found)"),
        },
        Commands::List { keyspace } => print_all(store.get_all_of::<Value>(&keyspace)?),
        Commands::Count { keyspace } => println!("{}", store.count(&keyspace)?),
        Commands::Drop { keyspace } => {
            store.delete_all_of(&keyspace)?;
            println!("OK");
        }
        Commands::Find { .. } => unreachable!("find is dispatched per strategy"),
    }
    Ok(())
}

fn print_all(values: Vec<Value>) {
    for value in values {
        println!("{}", value);
    }
}

/// Close the store even when the command failed; the command's error wins
fn finish<A: KeyspaceAdapter>(store: &A, outcome: Result<()>) -> Result<()> {
    let closed = store.destroy();
    outcome.and(closed)
}
