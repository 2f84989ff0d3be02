use super::polling::{self, Page, StatusRequest, StatusResponse};
use crate::config::BridgeConfig;
use crate::domain::payment::{Payment, PaymentId};
use crate::domain::ports::{ProviderClientBox, ProviderResult, TransactionLogBox};
use crate::domain::transaction::{ProviderTransaction, TransactionType};
use crate::error::{BridgeError, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, warn};

/// One provider call of the create → get → execute sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Create,
    Get { reference: String },
    Execute { reference: String },
}

impl ProviderCall {
    pub fn request_type(&self) -> TransactionType {
        match self {
            ProviderCall::Create => TransactionType::CreatePayment,
            ProviderCall::Get { .. } => TransactionType::GetPayment,
            ProviderCall::Execute { .. } => TransactionType::ExecutePayment,
        }
    }

    pub fn response_type(&self) -> TransactionType {
        match self {
            ProviderCall::Create => TransactionType::CreatePaymentResponse,
            ProviderCall::Get { .. } => TransactionType::GetPaymentResponse,
            ProviderCall::Execute { .. } => TransactionType::ExecutePaymentResponse,
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            ProviderCall::Create => None,
            ProviderCall::Get { reference } | ProviderCall::Execute { reference } => {
                Some(reference.as_str())
            }
        }
    }
}

/// Drives provider round trips and records each of them in the
/// transaction log.
///
/// Every call appends the request record first, then either the matching
/// response record or an `Error` record carrying the raw failure payload.
pub struct ProviderDriver {
    log: TransactionLogBox,
    provider: ProviderClientBox,
    config: BridgeConfig,
}

impl ProviderDriver {
    pub fn new(log: TransactionLogBox, provider: ProviderClientBox, config: BridgeConfig) -> Self {
        Self {
            log,
            provider,
            config,
        }
    }

    /// Runs one provider call to completion.
    pub async fn round_trip(
        &self,
        payment: &Payment,
        call: ProviderCall,
    ) -> Result<ProviderTransaction> {
        let mut request = ProviderTransaction::new(payment.id, call.request_type(), Utc::now());
        if let Some(reference) = call.reference() {
            request = request.with_ref(reference);
        }
        self.append(request).await?;

        let (message, payload) =
            match timeout(self.config.provider_timeout, self.call(payment, &call)).await {
                Ok(Ok(reply)) => {
                    let mut response =
                        ProviderTransaction::new(payment.id, call.response_type(), Utc::now())
                            .with_state(reply.state)
                            .with_data(reply.payload);
                    response.provider_ref =
                        reply.reference.or_else(|| call.reference().map(str::to_string));
                    self.append(response.clone()).await?;
                    return Ok(response);
                }
                Ok(Err(failure)) => (failure.message, failure.payload),
                Err(_) => {
                    let payload = serde_json::json!({
                        "error": "timeout",
                        "call": call.request_type().as_str(),
                        "timeout_ms": self.config.provider_timeout.as_millis() as u64,
                    });
                    (
                        format!("{} timed out", call.request_type()),
                        payload.to_string().into_bytes(),
                    )
                }
            };

        self.record_provider_error(payment, payload)
            .await
            .inspect_err(|_| {
                error!(
                    project_id = payment.id.project_id,
                    payment_id = payment.id.payment_id,
                    provider_error = %message,
                    "provider failure could not be recorded"
                );
            })?;
        Err(BridgeError::Provider(message))
    }

    /// Runs the round trip on a detached task.
    ///
    /// The call keeps going when the client that triggered it goes away.
    pub fn spawn_round_trip(
        self: &Arc<Self>,
        payment: Payment,
        call: ProviderCall,
    ) -> JoinHandle<Result<ProviderTransaction>> {
        let driver = Arc::clone(self);
        tokio::spawn(async move { driver.round_trip(&payment, call).await })
    }

    /// Marks the payment failed on the provider side, keeping the payload
    /// exactly as received.
    pub async fn record_provider_error(&self, payment: &Payment, payload: Vec<u8>) -> Result<()> {
        warn!(
            project_id = payment.id.project_id,
            payment_id = payment.id.payment_id,
            payload_len = payload.len(),
            "provider error"
        );
        let tx = ProviderTransaction::new(payment.id, TransactionType::Error, Utc::now())
            .with_data(payload.clone());
        self.append(tx).await.inspect_err(|_| {
            // the log was the only other copy
            error!(
                project_id = payment.id.project_id,
                payment_id = payment.id.payment_id,
                payload = %hex::encode(&payload),
                "unrecorded provider payload"
            );
        })
    }

    pub async fn latest(&self, id: PaymentId) -> Result<Option<ProviderTransaction>> {
        match timeout(self.config.storage_timeout, self.log.latest(id)).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Database(format!(
                "reading latest transaction of {id} timed out"
            ))),
        }
    }

    /// Answers a status check for `payment`.
    ///
    /// Storage failures are logged and turned into the internal error page;
    /// no detail reaches the client.
    pub async fn check_status(
        &self,
        request: &StatusRequest,
        payment: &Payment,
        default: Page,
    ) -> StatusResponse {
        match self.latest(payment.id).await {
            Ok(latest) => polling::respond(request, latest.as_ref(), payment, default),
            Err(e) => {
                error!(
                    project_id = payment.id.project_id,
                    payment_id = payment.id.payment_id,
                    error = %e,
                    "status check failed"
                );
                StatusResponse::Page(Page::InternalError)
            }
        }
    }

    async fn call(&self, payment: &Payment, call: &ProviderCall) -> ProviderResult {
        match call {
            ProviderCall::Create => self.provider.create(payment).await,
            ProviderCall::Get { reference } => self.provider.get(reference).await,
            ProviderCall::Execute { reference } => self.provider.execute(reference).await,
        }
    }

    async fn append(&self, tx: ProviderTransaction) -> Result<()> {
        let (id, ty, timestamp) = (tx.payment(), tx.r#type.clone(), tx.timestamp);
        let result = match timeout(self.config.storage_timeout, self.log.append(tx)).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Database("append timed out".to_string())),
        };
        result.inspect_err(|e| {
            error!(
                project_id = id.project_id,
                payment_id = id.payment_id,
                tx_type = %ty,
                timestamp = %timestamp,
                error = %e,
                "error saving provider transaction"
            );
        })
    }
}
