use crate::domain::payment::PaymentId;
use crate::domain::ports::{NotificationSink, TransactionLog};
use crate::domain::transaction::ProviderTransaction;
use crate::error::Result;
use crate::notification::NotificationReader;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory transaction log.
///
/// Records are kept per payment in insertion order, so equal timestamps
/// resolve to the record appended last.
#[derive(Default, Clone)]
pub struct InMemoryTransactionLog {
    transactions: Arc<RwLock<HashMap<PaymentId, Vec<ProviderTransaction>>>>,
}

impl InMemoryTransactionLog {
    /// Creates a new, empty in-memory log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn append(&self, tx: ProviderTransaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        transactions.entry(tx.payment()).or_default().push(tx);
        Ok(())
    }

    async fn latest(&self, id: PaymentId) -> Result<Option<ProviderTransaction>> {
        let transactions = self.transactions.read().await;
        let latest = transactions.get(&id).and_then(|txs| {
            txs.iter()
                .enumerate()
                .max_by_key(|(seq, tx)| (tx.timestamp, *seq))
                .map(|(_, tx)| tx.clone())
        });
        Ok(latest)
    }

    async fn history(&self, id: PaymentId) -> Result<Vec<ProviderTransaction>> {
        let transactions = self.transactions.read().await;
        let mut history = transactions.get(&id).cloned().unwrap_or_default();
        // stable: equal timestamps keep insertion order
        history.sort_by_key(|tx| tx.timestamp);
        Ok(history)
    }
}

/// Collects delivered notifications in memory.
#[derive(Default, Clone)]
pub struct InMemoryNotificationSink {
    delivered: Arc<RwLock<Vec<(String, Vec<u8>)>>>,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identification and body of every delivery, in order.
    pub async fn delivered(&self) -> Vec<(String, Vec<u8>)> {
        self.delivered.read().await.clone()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn deliver(&self, identification: String, mut body: NotificationReader) -> Result<()> {
        let mut bytes = Vec::with_capacity(body.remaining());
        body.read_to_end(&mut bytes)?;
        self.delivered.write().await.push((identification, bytes));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::TransactionType;
    use chrono::{TimeZone, Utc};

    fn tx(payment: u64, ty: TransactionType, secs: i64) -> ProviderTransaction {
        ProviderTransaction::new(
            PaymentId::new(1, payment),
            ty,
            Utc.timestamp_opt(secs, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_latest_on_unknown_payment() {
        let log = InMemoryTransactionLog::new();
        assert!(log.latest(PaymentId::new(1, 1)).await.unwrap().is_none());
        assert!(log.history(PaymentId::new(1, 1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latest_by_timestamp() {
        let log = InMemoryTransactionLog::new();
        log.append(tx(1, TransactionType::CreatePaymentResponse, 20))
            .await
            .unwrap();
        // appended later but older
        log.append(tx(1, TransactionType::CreatePayment, 10))
            .await
            .unwrap();
        log.append(tx(2, TransactionType::Error, 30)).await.unwrap();

        let latest = log.latest(PaymentId::new(1, 1)).await.unwrap().unwrap();
        assert_eq!(latest.r#type, TransactionType::CreatePaymentResponse);

        let history = log.history(PaymentId::new(1, 1)).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].r#type, TransactionType::CreatePayment);
    }

    #[tokio::test]
    async fn test_timestamp_collision_uses_insertion_order() {
        let log = InMemoryTransactionLog::new();
        log.append(tx(1, TransactionType::ExecutePayment, 10))
            .await
            .unwrap();
        log.append(tx(1, TransactionType::ExecutePaymentResponse, 10))
            .await
            .unwrap();

        let latest = log.latest(PaymentId::new(1, 1)).await.unwrap().unwrap();
        assert_eq!(latest.r#type, TransactionType::ExecutePaymentResponse);
    }
}
