use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use paybridge::application::polling::should_continue_polling;
use paybridge::application::resolver::resolve;
use paybridge::config::{BridgeArgs, BridgeConfig};
use paybridge::domain::payment::{Payment, PaymentId, PaymentStatus};
use paybridge::domain::ports::TransactionLogBox;
use paybridge::infrastructure::in_memory::InMemoryTransactionLog;
use paybridge::interfaces::csv::status_writer::{StatusRow, StatusWriter};
use paybridge::interfaces::csv::transaction_reader::TransactionReader;
use paybridge::notification::NotificationDispatcher;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::time::timeout;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay provider transactions from CSV and print each payment's status
    Status {
        /// Input provider transactions CSV file
        input: PathBuf,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long, env = "PAYBRIDGE_DB_PATH")]
        db_path: Option<PathBuf>,

        /// Payment status used when a response defers to the payment
        #[arg(long, default_value = "open")]
        payment_status: String,

        #[command(flatten)]
        bridge: BridgeArgs,
    },
    /// Sign a notification for a payment and write it to stdout
    Notify {
        #[arg(long)]
        project: u64,
        #[arg(long)]
        payment: u64,
        #[arg(long)]
        status: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        currency: String,
        #[arg(long, default_value = "en_US")]
        locale: String,
        /// Notification wire version
        #[arg(long, default_value = "2")]
        version: String,
        #[arg(long)]
        key_id: String,
        /// Hex-encoded secret key
        #[arg(long, env = "PAYBRIDGE_SECRET_KEY", hide_env_values = true)]
        key: String,
        /// Signing time as unix seconds, defaults to now
        #[arg(long)]
        timestamp: Option<i64>,
    },
}

#[cfg(feature = "storage-rocksdb")]
fn open_log(db_path: Option<PathBuf>) -> Result<TransactionLogBox> {
    use paybridge::infrastructure::rocksdb::RocksDbTransactionLog;

    match db_path {
        Some(path) => Ok(Box::new(RocksDbTransactionLog::open(path).into_diagnostic()?)),
        None => Ok(Box::new(InMemoryTransactionLog::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_log(db_path: Option<PathBuf>) -> Result<TransactionLogBox> {
    if db_path.is_some() {
        warn!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Box::new(InMemoryTransactionLog::new()))
}

async fn status(
    input: PathBuf,
    db_path: Option<PathBuf>,
    payment_status: PaymentStatus,
    config: BridgeConfig,
) -> Result<()> {
    let log = open_log(db_path)?;

    let file = File::open(input).into_diagnostic()?;
    let reader = TransactionReader::new(file);
    let mut payments = BTreeSet::new();
    for tx_result in reader.transactions() {
        match tx_result {
            Ok(tx) => {
                let id = tx.payment();
                match timeout(config.storage_timeout, log.append(tx)).await {
                    Ok(Ok(())) => {
                        payments.insert(id);
                    }
                    Ok(Err(e)) => return Err(e).into_diagnostic(),
                    Err(_) => return Err(miette!("appending transaction for {id} timed out")),
                }
            }
            Err(e) => {
                warn!("Error reading transaction: {e}");
            }
        }
    }

    let mut rows = Vec::with_capacity(payments.len());
    for id in payments {
        let latest = timeout(config.storage_timeout, log.latest(id))
            .await
            .map_err(|_| miette!("reading latest transaction for {id} timed out"))?
            .into_diagnostic()?;
        let Some(tx) = latest else { continue };
        let payment = Payment::new(id, Decimal::ZERO, "").with_status(payment_status.clone());
        rows.push(StatusRow {
            project: id.project_id,
            payment: id.payment_id,
            display_state: resolve(&tx, &payment),
            continue_polling: should_continue_polling(&tx),
            r#type: tx.r#type,
        });
    }

    let stdout = io::stdout();
    let mut writer = StatusWriter::new(stdout.lock());
    writer.write_rows(rows).into_diagnostic()?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn notify(
    id: PaymentId,
    status: PaymentStatus,
    amount: Decimal,
    currency: String,
    locale: String,
    version: &str,
    key_id: String,
    key: &str,
    at: DateTime<Utc>,
) -> Result<()> {
    let key = hex::decode(key).into_diagnostic()?;
    let dispatcher = NotificationDispatcher::new(version, key_id, key).into_diagnostic()?;
    let payment = Payment::new(id, amount, currency)
        .with_status(status)
        .with_locale(locale);

    let mut signed = dispatcher
        .prepare(&id.encoded(), &payment, Vec::new(), at)
        .into_diagnostic()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    io::copy(&mut signed.body, &mut out).into_diagnostic()?;
    out.flush().into_diagnostic()?;
    eprintln!("identification: {}", signed.identification);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().into_diagnostic()?))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Status {
            input,
            db_path,
            payment_status,
            bridge,
        } => status(input, db_path, payment_status.into(), bridge.into()).await,
        Command::Notify {
            project,
            payment,
            status,
            amount,
            currency,
            locale,
            version,
            key_id,
            key,
            timestamp,
        } => {
            let at = match timestamp {
                Some(secs) => DateTime::<Utc>::from_timestamp(secs, 0)
                    .ok_or_else(|| miette!("timestamp {secs} out of range"))?,
                None => Utc::now(),
            };
            notify(
                PaymentId::new(project, payment),
                status.into(),
                amount,
                currency,
                locale,
                &version,
                key_id,
                &key,
                at,
            )
        }
    }
}
