use crate::domain::payment::PaymentId;
use crate::domain::ports::TransactionLog;
use crate::domain::transaction::ProviderTransaction;
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Column Family holding provider transactions.
pub const CF_PROVIDER_TRANSACTIONS: &str = "provider_transactions";

const PREFIX_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// A persistent transaction log using RocksDB.
///
/// Keys are `project_id | payment_id | timestamp | sequence`, all big-endian,
/// so a payment's records are contiguous and sorted by time with the
/// append sequence breaking ties. `latest` is a single reverse seek.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbTransactionLog {
    db: Arc<DB>,
    sequence: Arc<AtomicU64>,
}

impl RocksDbTransactionLog {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf = ColumnFamilyDescriptor::new(CF_PROVIDER_TRANSACTIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf])?;

        // Seeded from the clock so sequences from an earlier process never
        // collide with this one.
        let seed = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .unsigned_abs();

        Ok(Self {
            db: Arc::new(db),
            sequence: Arc::new(AtomicU64::new(seed)),
        })
    }

    fn cf(&self) -> Result<&ColumnFamily> {
        self.db.cf_handle(CF_PROVIDER_TRANSACTIONS).ok_or_else(|| {
            BridgeError::Database("provider transactions column family not found".to_string())
        })
    }
}

fn prefix(id: PaymentId) -> [u8; PREFIX_LEN] {
    let mut key = [0u8; PREFIX_LEN];
    key[..8].copy_from_slice(&id.project_id.to_be_bytes());
    key[8..].copy_from_slice(&id.payment_id.to_be_bytes());
    key
}

fn key(tx: &ProviderTransaction, sequence: u64) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    key[..PREFIX_LEN].copy_from_slice(&prefix(tx.payment()));
    // flip the sign bit so negative timestamps sort before positive ones
    let micros = (tx.timestamp.timestamp_micros() as u64) ^ (1 << 63);
    key[16..24].copy_from_slice(&micros.to_be_bytes());
    key[24..].copy_from_slice(&sequence.to_be_bytes());
    key
}

fn decode(bytes: &[u8]) -> Result<ProviderTransaction> {
    serde_json::from_slice(bytes)
        .map_err(|e| BridgeError::Database(format!("Deserialization error: {}", e)))
}

#[async_trait]
impl TransactionLog for RocksDbTransactionLog {
    async fn append(&self, tx: ProviderTransaction) -> Result<()> {
        let cf = self.cf()?;
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let value = serde_json::to_vec(&tx)
            .map_err(|e| BridgeError::Database(format!("Serialization error: {}", e)))?;

        self.db.put_cf(&cf, key(&tx, sequence), value)?;

        Ok(())
    }

    async fn latest(&self, id: PaymentId) -> Result<Option<ProviderTransaction>> {
        let cf = self.cf()?;
        let prefix = prefix(id);
        let mut upper = [0xFFu8; KEY_LEN];
        upper[..PREFIX_LEN].copy_from_slice(&prefix);

        let mut iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&upper, Direction::Reverse));
        match iter.next() {
            Some(item) => {
                let (key, value) = item?;
                if key.starts_with(&prefix) {
                    Ok(Some(decode(&value)?))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    async fn history(&self, id: PaymentId) -> Result<Vec<ProviderTransaction>> {
        let cf = self.cf()?;
        let prefix = prefix(id);

        let mut history = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            history.push(decode(&value)?);
        }
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::TransactionType;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn tx(payment: u64, ty: TransactionType, secs: i64) -> ProviderTransaction {
        ProviderTransaction::new(
            PaymentId::new(1, payment),
            ty,
            Utc.timestamp_opt(secs, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let log = RocksDbTransactionLog::open(dir.path()).expect("Failed to open RocksDB");
        assert!(log.db.cf_handle(CF_PROVIDER_TRANSACTIONS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_latest_and_history() {
        let dir = tempdir().unwrap();
        let log = RocksDbTransactionLog::open(dir.path()).unwrap();

        log.append(tx(1, TransactionType::CreatePayment, 10)).await.unwrap();
        log.append(tx(1, TransactionType::CreatePaymentResponse, 20).with_state("created"))
            .await
            .unwrap();
        log.append(tx(2, TransactionType::Error, 5).with_data(b"boom".to_vec()))
            .await
            .unwrap();

        let latest = log.latest(PaymentId::new(1, 1)).await.unwrap().unwrap();
        assert_eq!(latest.r#type, TransactionType::CreatePaymentResponse);
        assert_eq!(latest.state(), "created");

        let other = log.latest(PaymentId::new(1, 2)).await.unwrap().unwrap();
        assert_eq!(other.data, b"boom".to_vec());

        assert!(log.latest(PaymentId::new(1, 3)).await.unwrap().is_none());
        assert!(log.latest(PaymentId::new(2, 1)).await.unwrap().is_none());
        assert_eq!(log.history(PaymentId::new(1, 1)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rocksdb_timestamp_collision() {
        let dir = tempdir().unwrap();
        let log = RocksDbTransactionLog::open(dir.path()).unwrap();

        log.append(tx(1, TransactionType::GetPayment, 10)).await.unwrap();
        log.append(tx(1, TransactionType::GetPaymentResponse, 10))
            .await
            .unwrap();

        let latest = log.latest(PaymentId::new(1, 1)).await.unwrap().unwrap();
        assert_eq!(latest.r#type, TransactionType::GetPaymentResponse);
        assert_eq!(log.history(PaymentId::new(1, 1)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rocksdb_reopen_keeps_records() {
        let dir = tempdir().unwrap();
        {
            let log = RocksDbTransactionLog::open(dir.path()).unwrap();
            log.append(tx(1, TransactionType::ExecutePayment, 10))
                .await
                .unwrap();
        }
        let log = RocksDbTransactionLog::open(dir.path()).unwrap();
        let latest = log.latest(PaymentId::new(1, 1)).await.unwrap().unwrap();
        assert_eq!(latest.r#type, TransactionType::ExecutePayment);
    }
}
