use super::payment::PaymentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of a provider round trip.
///
/// The three request variants mean a call went out and nothing has come back
/// yet. Values unknown to this build deserialize to `Unrecognized`.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    CreatePayment,
    CreatePaymentResponse,
    GetPayment,
    GetPaymentResponse,
    ExecutePayment,
    ExecutePaymentResponse,
    Error,
    Unrecognized(String),
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::CreatePayment => "create_payment",
            TransactionType::CreatePaymentResponse => "create_payment_response",
            TransactionType::GetPayment => "get_payment",
            TransactionType::GetPaymentResponse => "get_payment_response",
            TransactionType::ExecutePayment => "execute_payment",
            TransactionType::ExecutePaymentResponse => "execute_payment_response",
            TransactionType::Error => "error",
            TransactionType::Unrecognized(s) => s,
        }
    }

    /// True for the request stages, i.e. a call is in flight.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            TransactionType::CreatePayment
                | TransactionType::GetPayment
                | TransactionType::ExecutePayment
        )
    }

    /// The response stage that closes this request stage.
    pub fn response(&self) -> Option<TransactionType> {
        match self {
            TransactionType::CreatePayment => Some(TransactionType::CreatePaymentResponse),
            TransactionType::GetPayment => Some(TransactionType::GetPaymentResponse),
            TransactionType::ExecutePayment => Some(TransactionType::ExecutePaymentResponse),
            _ => None,
        }
    }
}

impl From<String> for TransactionType {
    fn from(value: String) -> Self {
        match value.trim() {
            "create_payment" => TransactionType::CreatePayment,
            "create_payment_response" => TransactionType::CreatePaymentResponse,
            "get_payment" => TransactionType::GetPayment,
            "get_payment_response" => TransactionType::GetPaymentResponse,
            "execute_payment" => TransactionType::ExecutePayment,
            "execute_payment_response" => TransactionType::ExecutePaymentResponse,
            "error" => TransactionType::Error,
            _ => TransactionType::Unrecognized(value),
        }
    }
}

impl From<TransactionType> for String {
    fn from(ty: TransactionType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provider round-trip record. Records are append-only and never
/// mutated once written.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ProviderTransaction {
    pub project_id: u64,
    pub payment_id: u64,
    pub timestamp: DateTime<Utc>,
    pub r#type: TransactionType,
    /// Provider-defined state, e.g. "created", "approved", "failed".
    #[serde(default)]
    pub provider_state: Option<String>,
    /// Provider-side payment reference used by get/execute calls.
    #[serde(default)]
    pub provider_ref: Option<String>,
    /// Raw provider payload, stored as received.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl ProviderTransaction {
    pub fn new(id: PaymentId, r#type: TransactionType, timestamp: DateTime<Utc>) -> Self {
        Self {
            project_id: id.project_id,
            payment_id: id.payment_id,
            timestamp,
            r#type,
            provider_state: None,
            provider_ref: None,
            data: Vec::new(),
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.provider_state = Some(state.into());
        self
    }

    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.provider_ref = Some(reference.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn payment(&self) -> PaymentId {
        PaymentId::new(self.project_id, self.payment_id)
    }

    pub fn state(&self) -> &str {
        self.provider_state.as_deref().unwrap_or_default()
    }

    /// Looks up a HATEOAS link by relation in the raw payload.
    ///
    /// Returns `None` when the payload is not JSON or has no such link.
    pub fn link(&self, rel: &str) -> Option<String> {
        let payload: serde_json::Value = serde_json::from_slice(&self.data).ok()?;
        payload
            .get("links")?
            .as_array()?
            .iter()
            .find(|link| link.get("rel").and_then(|r| r.as_str()) == Some(rel))
            .and_then(|link| link.get("href"))
            .and_then(|href| href.as_str())
            .map(str::to_string)
    }
}
