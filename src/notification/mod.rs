//! Signed, versioned outbound notifications.
//!
//! Consumers pin the wire version they accept, so constructors are looked up
//! in a closed registry: unknown versions are rejected rather than mapped to
//! the closest known one.

pub mod buffer;
pub mod dispatcher;
pub mod v2;

pub use buffer::{BufferPool, NotificationReader, PooledBuffer};
pub use dispatcher::NotificationDispatcher;

use crate::domain::payment::{EncodedPaymentId, Payment, PaymentTransactionList};
use crate::error::{BridgeError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Builds a notification of one wire version, bound to one payment.
pub type NewNotificationFn = fn(&EncodedPaymentId, &Payment) -> Result<Box<dyn Notification>>;

/// A notification describing the state of a payment.
pub trait Notification: Send {
    /// Attaches the payment ledger. Rejected once the notification is signed.
    fn set_transactions(&mut self, transactions: PaymentTransactionList) -> Result<()>;

    /// Serializes and signs the body. The body is frozen afterwards.
    fn sign(&mut self, at: DateTime<Utc>, secret_key_id: &str, secret_key: &[u8]) -> Result<()>;

    /// Takes the signed bytes. Can be called once.
    fn reader(&mut self) -> Result<NotificationReader>;

    /// Stable id of the logical event, used by receivers to drop duplicates.
    fn identification(&self) -> String;
}

static REGISTRY: LazyLock<HashMap<&'static str, NewNotificationFn>> = LazyLock::new(|| {
    let mut versions: HashMap<&'static str, NewNotificationFn> = HashMap::new();
    versions.insert(v2::VERSION, v2::new_notification);
    versions
});

/// Looks up the constructor for a wire version.
pub fn constructor_for(version: &str) -> Result<NewNotificationFn> {
    REGISTRY
        .get(version)
        .copied()
        .ok_or_else(|| BridgeError::InvalidVersion(version.to_string()))
}

/// Versions this build can emit, sorted.
pub fn supported_versions() -> Vec<&'static str> {
    let mut versions: Vec<_> = REGISTRY.keys().copied().collect();
    versions.sort_unstable();
    versions
}
