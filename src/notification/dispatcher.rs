use super::{NewNotificationFn, NotificationReader, constructor_for};
use crate::domain::payment::{EncodedPaymentId, Payment, PaymentTransactionList};
use crate::domain::ports::NotificationSinkBox;
use crate::error::{BridgeError, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// A signed notification ready for transmission.
#[derive(Debug)]
pub struct SignedNotification {
    pub identification: String,
    pub body: NotificationReader,
}

/// Builds, signs and hands off notifications for terminal payments.
///
/// The version is resolved once at construction so a misconfigured version
/// fails at startup rather than on the first payment.
pub struct NotificationDispatcher {
    version: String,
    constructor: NewNotificationFn,
    secret_key_id: String,
    secret_key: Vec<u8>,
}

impl NotificationDispatcher {
    pub fn new(
        version: &str,
        secret_key_id: impl Into<String>,
        secret_key: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let secret_key = secret_key.into();
        if secret_key.is_empty() {
            return Err(BridgeError::Signing("empty secret key".to_string()));
        }
        Ok(Self {
            version: version.to_string(),
            constructor: constructor_for(version)?,
            secret_key_id: secret_key_id.into(),
            secret_key,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Constructs, attaches the ledger and signs.
    pub fn prepare(
        &self,
        encoded_id: &EncodedPaymentId,
        payment: &Payment,
        transactions: PaymentTransactionList,
        at: DateTime<Utc>,
    ) -> Result<SignedNotification> {
        let mut notification = (self.constructor)(encoded_id, payment)?;
        notification.set_transactions(transactions)?;
        notification.sign(at, &self.secret_key_id, &self.secret_key)?;
        Ok(SignedNotification {
            identification: notification.identification(),
            body: notification.reader()?,
        })
    }

    /// Prepares the notification and delivers it through `sink`.
    pub async fn dispatch(
        &self,
        sink: &NotificationSinkBox,
        encoded_id: &EncodedPaymentId,
        payment: &Payment,
        transactions: PaymentTransactionList,
        at: DateTime<Utc>,
    ) -> Result<String> {
        let signed = self.prepare(encoded_id, payment, transactions, at).inspect_err(|e| {
            error!(
                project_id = payment.id.project_id,
                payment_id = payment.id.payment_id,
                version = %self.version,
                error = %e,
                "failed to prepare notification"
            );
        })?;
        let identification = signed.identification.clone();
        sink.deliver(signed.identification, signed.body).await?;
        info!(
            project_id = payment.id.project_id,
            payment_id = payment.id.payment_id,
            identification = %identification,
            "notification delivered"
        );
        Ok(identification)
    }
}
