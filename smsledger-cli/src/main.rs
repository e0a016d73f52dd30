use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use smsledger_core::{LedgerRecord, LedgerReply, extract};
use smsledger_flow::{
    CategoryStore, ConfirmationWorkflow, FileCategoryStore, HandledKeys, HttpLedgerClient,
    LedgerClient, NullLedger,
};
use tracing_subscriber::EnvFilter;

mod config;
mod state;

#[derive(Parser, Debug)]
#[command(name = "smsledger", version, about = "Turn bank SMS text into confirmed ledger entries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the extractor on a message and print the parse as JSON
    Parse {
        #[arg(long)]
        message: String,

        #[arg(long, default_value = "unknown")]
        sender: String,

        /// Received-date hint (yyyy-mm-dd), used when the text has no date
        #[arg(long)]
        received: Option<NaiveDate>,
    },

    /// Full pipeline: parse, dedup, confirm (or ignore) against ~/.smsledger state
    Ingest {
        #[arg(long)]
        message: String,

        #[arg(long, default_value = "unknown")]
        sender: String,

        #[arg(long)]
        received: Option<NaiveDate>,

        /// Override the transaction title
        #[arg(long)]
        title: Option<String>,

        /// Override the category
        #[arg(long)]
        category: Option<String>,

        /// Discard instead of confirming
        #[arg(long)]
        ignore: bool,

        /// Skip the remote ledger even when configured
        #[arg(long)]
        offline: bool,
    },

    /// Inspect or seed the per-counterparty category memory
    Memory {
        #[command(subcommand)]
        command: MemoryCommand,
    },

    /// Manage ~/.smsledger/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum MemoryCommand {
    /// List remembered title -> category entries
    Show,
    /// Remember a category for a title
    Set { title: String, category: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
}

/// Ledger backend chosen at runtime from config/flags.
enum AnyLedger {
    Http(HttpLedgerClient),
    Null(NullLedger),
}

impl LedgerClient for AnyLedger {
    async fn post_transaction(&self, record: &LedgerRecord) -> Result<LedgerReply> {
        match self {
            AnyLedger::Http(c) => c.post_transaction(record).await,
            AnyLedger::Null(n) => n.post_transaction(record).await,
        }
    }
}

fn select_ledger(offline: bool) -> Result<AnyLedger> {
    if offline {
        return Ok(AnyLedger::Null(NullLedger));
    }
    let cfg = config::load_config()?;
    match cfg.ledger.base_url {
        Some(base_url) => Ok(AnyLedger::Http(HttpLedgerClient::new(
            base_url,
            cfg.ledger.token,
            Duration::from_secs(cfg.ledger.timeout_secs),
        )?)),
        None => Ok(AnyLedger::Null(NullLedger)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Parse {
            message,
            sender,
            received,
        } => {
            match extract(&message, &sender, received) {
                Some(parsed) => println!("{}", serde_json::to_string_pretty(&parsed)?),
                None => println!("not a transaction message"),
            }
            Ok(())
        }

        Command::Ingest {
            message,
            sender,
            received,
            title,
            category,
            ignore,
            offline,
        } => ingest(&message, &sender, received, title, category, ignore, offline).await,

        Command::Memory { command } => {
            let store = FileCategoryStore::open(state::category_memory_path()?)?;
            match command {
                MemoryCommand::Show => {
                    let entries = store.entries();
                    if entries.is_empty() {
                        println!("(no remembered categories)");
                    }
                    for (title, cat) in entries {
                        println!("{title} -> {cat}");
                    }
                }
                MemoryCommand::Set { title, category } => {
                    store.put(&title, &category);
                    println!("remembered: {title} -> {category}");
                }
            }
            Ok(())
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(),
        },
    }
}

async fn ingest(
    message: &str,
    sender: &str,
    received: Option<NaiveDate>,
    title: Option<String>,
    category: Option<String>,
    ignore: bool,
    offline: bool,
) -> Result<()> {
    let Some(parsed) = extract(message, sender, received) else {
        println!("not a transaction message, nothing to do");
        return Ok(());
    };

    let memory = FileCategoryStore::open(state::category_memory_path()?)?;
    let handled = HandledKeys::durable(state::handled_keys_path()?)?;
    let ledger = select_ledger(offline)?;
    let flow = ConfirmationWorkflow::new(memory, ledger, handled);

    let Some(prompt) = flow.handle_incoming(parsed) else {
        println!("skipped (duplicate delivery or not actionable)");
        return Ok(());
    };
    let key = prompt.transaction.idempotency_key.clone();

    println!(
        "detected {:?} of {:.2} from {} (confidence {:.2}), quick picks: {}",
        prompt.transaction.direction,
        prompt.transaction.amount,
        prompt.transaction.receiver,
        prompt.transaction.confidence,
        prompt.quick_categories.join(", "),
    );

    if ignore {
        flow.ignore(&key);
        println!("ignored");
        return Ok(());
    }

    let committed = flow
        .confirm(&key, title.as_deref(), category.as_deref())
        .await
        .context("transaction was no longer pending")?;
    println!("{}", serde_json::to_string_pretty(&committed)?);
    Ok(())
}
