use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite key identifying a payment: the owning project plus the
/// payment number inside that project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaymentId {
    pub project_id: u64,
    pub payment_id: u64,
}

impl PaymentId {
    pub fn new(project_id: u64, payment_id: u64) -> Self {
        Self {
            project_id,
            payment_id,
        }
    }

    /// The externally visible form handed to clients and notification receivers.
    pub fn encoded(&self) -> EncodedPaymentId {
        EncodedPaymentId(format!("{}-{}", self.project_id, self.payment_id))
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.payment_id)
    }
}

/// String form of a [`PaymentId`] as produced by the payment subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedPaymentId(String);

impl EncodedPaymentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodedPaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a payment.
///
/// Values written by newer producers are kept as `Unrecognized` so they can
/// be routed to the error path instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    #[default]
    Open,
    Paid,
    Authorized,
    Cancelled,
    Error,
    Unrecognized(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Open => "open",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Authorized => "authorized",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Error => "error",
            PaymentStatus::Unrecognized(s) => s,
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => PaymentStatus::Open,
            "paid" => PaymentStatus::Paid,
            "authorized" => PaymentStatus::Authorized,
            "cancelled" => PaymentStatus::Cancelled,
            "error" => PaymentStatus::Error,
            _ => PaymentStatus::Unrecognized(value),
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchase attempt as seen by the bridge. Read-only here; the payment
/// subsystem owns status transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub status: PaymentStatus,
    pub locale: String,
    pub amount: Decimal,
    pub currency: String,
}

impl Payment {
    pub fn new(id: PaymentId, amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            id,
            status: PaymentStatus::Open,
            locale: "en_US".to_string(),
            amount,
            currency: currency.into(),
        }
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

/// One entry of the payment's own ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    pub timestamp: DateTime<Utc>,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Ordered ledger of a payment, oldest entry first.
pub type PaymentTransactionList = Vec<PaymentTransaction>;
