use super::payment::{Payment, PaymentId};
use super::transaction::ProviderTransaction;
use crate::error::Result;
use crate::notification::NotificationReader;
use async_trait::async_trait;

/// Append-only store of provider round trips.
///
/// Concurrent writers need no coordination: records are immutable and
/// `latest` orders by timestamp, falling back to insertion order on ties.
/// A read racing an in-flight append may return the previous record.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn append(&self, tx: ProviderTransaction) -> Result<()>;
    async fn latest(&self, id: PaymentId) -> Result<Option<ProviderTransaction>>;
    /// All records of a payment, oldest first.
    async fn history(&self, id: PaymentId) -> Result<Vec<ProviderTransaction>>;
}

pub type TransactionLogBox = Box<dyn TransactionLog>;

/// Successful provider reply. Only `state` is interpreted by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub state: String,
    pub reference: Option<String>,
    pub payload: Vec<u8>,
}

/// Failed provider call, with whatever the provider sent back.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    pub message: String,
    pub payload: Vec<u8>,
}

pub type ProviderResult = std::result::Result<ProviderReply, ProviderFailure>;

/// The external payment provider. Credentials and wire format live behind
/// the implementation.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn create(&self, payment: &Payment) -> ProviderResult;
    async fn get(&self, reference: &str) -> ProviderResult;
    async fn execute(&self, reference: &str) -> ProviderResult;
}

pub type ProviderClientBox = Box<dyn ProviderClient>;

/// Outbound delivery of signed notifications to the payment owner.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, identification: String, body: NotificationReader) -> Result<()>;
}

pub type NotificationSinkBox = Box<dyn NotificationSink>;
