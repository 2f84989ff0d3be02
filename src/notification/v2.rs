//! Version 2 notification wire format.
//!
//! The transmitted bytes are a compact JSON envelope:
//!
//! ```text
//! {"version":"2","keyId":"<id>","timestamp":<unix>,"signature":"<hex>","body":{...}}
//! ```
//!
//! The signature is HMAC-SHA256 over `<timestamp>.<keyId>.<body bytes>`,
//! where the body bytes are exactly the `body` value as transmitted.

use super::buffer::{BufferPool, NotificationReader, PooledBuffer};
use super::Notification;
use crate::domain::payment::{
    EncodedPaymentId, Payment, PaymentStatus, PaymentTransaction, PaymentTransactionList,
};
use crate::error::{BridgeError, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

pub const VERSION: &str = "2";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Body {
    project_id: u64,
    payment_id: EncodedPaymentId,
    status: PaymentStatus,
    amount: Decimal,
    currency: String,
    locale: String,
    transactions: Vec<PaymentTransaction>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    version: &'a str,
    key_id: &'a str,
    timestamp: i64,
    signature: &'a str,
    body: &'a RawValue,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ReceivedEnvelope<'a> {
    version: String,
    key_id: String,
    timestamp: i64,
    signature: String,
    #[serde(borrow)]
    body: &'a RawValue,
}

/// A version 2 notification bound to one payment.
#[derive(Debug)]
pub struct NotificationV2 {
    body: Body,
    signature: Option<String>,
    signed: Option<PooledBuffer>,
}

impl NotificationV2 {
    pub fn new(encoded_id: &EncodedPaymentId, payment: &Payment) -> Self {
        Self {
            body: Body {
                project_id: payment.id.project_id,
                payment_id: encoded_id.clone(),
                status: payment.status.clone(),
                amount: payment.amount,
                currency: payment.currency.clone(),
                locale: payment.locale.clone(),
                transactions: Vec::new(),
            },
            signature: None,
            signed: None,
        }
    }

    /// Hex signature, once signed.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// Registry entry for version 2.
pub fn new_notification(
    encoded_id: &EncodedPaymentId,
    payment: &Payment,
) -> Result<Box<dyn Notification>> {
    Ok(Box::new(NotificationV2::new(encoded_id, payment)))
}

fn mac(timestamp: i64, key_id: &str, body: &[u8], secret_key: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret_key)
        .map_err(|e| BridgeError::Signing(format!("invalid secret key: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(key_id.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

impl Notification for NotificationV2 {
    fn set_transactions(&mut self, transactions: PaymentTransactionList) -> Result<()> {
        if self.is_signed() {
            return Err(BridgeError::Signing(
                "notification already signed".to_string(),
            ));
        }
        self.body.transactions = transactions;
        Ok(())
    }

    fn sign(&mut self, at: DateTime<Utc>, secret_key_id: &str, secret_key: &[u8]) -> Result<()> {
        if self.is_signed() {
            return Err(BridgeError::Signing(
                "notification already signed".to_string(),
            ));
        }
        if secret_key.is_empty() {
            return Err(BridgeError::Signing("empty secret key".to_string()));
        }

        let body = serde_json::to_string(&self.body)
            .map_err(|e| BridgeError::Signing(format!("body serialization: {e}")))?;
        let body = RawValue::from_string(body)
            .map_err(|e| BridgeError::Signing(format!("body serialization: {e}")))?;

        let timestamp = at.timestamp();
        let signature = mac(timestamp, secret_key_id, body.get().as_bytes(), secret_key)?;

        let mut buf = BufferPool::shared().acquire();
        let envelope = Envelope {
            version: VERSION,
            key_id: secret_key_id,
            timestamp,
            signature: &signature,
            body: body.as_ref(),
        };
        serde_json::to_writer(&mut *buf, &envelope)
            .map_err(|e| BridgeError::Signing(format!("envelope serialization: {e}")))?;

        debug!(
            project_id = self.body.project_id,
            payment_id = %self.body.payment_id,
            key_id = secret_key_id,
            len = buf.len(),
            "signed notification"
        );
        self.signature = Some(signature);
        self.signed = Some(buf);
        Ok(())
    }

    fn reader(&mut self) -> Result<NotificationReader> {
        match self.signed.take() {
            Some(buf) => Ok(NotificationReader::new(buf)),
            None if self.is_signed() => Err(BridgeError::Signing(
                "notification body already consumed".to_string(),
            )),
            None => Err(BridgeError::Signing("notification not signed".to_string())),
        }
    }

    fn identification(&self) -> String {
        identification(&self.body.payment_id)
    }
}

/// Identification of a version 2 notification for a payment.
pub fn identification(encoded_id: &EncodedPaymentId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(VERSION.as_bytes());
    hasher.update(b"/");
    hasher.update(encoded_id.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks a received version 2 notification against the shared secret.
///
/// Any parse failure, version mismatch or signature mismatch yields `false`.
pub fn verify(bytes: &[u8], secret_key: &[u8]) -> bool {
    let Ok(envelope) = serde_json::from_slice::<ReceivedEnvelope>(bytes) else {
        return false;
    };
    if envelope.version != VERSION {
        return false;
    }
    let Ok(expected) = mac(
        envelope.timestamp,
        &envelope.key_id,
        envelope.body.get().as_bytes(),
        secret_key,
    ) else {
        return false;
    };
    expected.as_bytes().ct_eq(envelope.signature.as_bytes()).into()
}
