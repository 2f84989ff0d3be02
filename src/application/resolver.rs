use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::transaction::{ProviderTransaction, TransactionType};
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Provider state signalling that the payer still has to approve the payment.
pub const STATE_CREATED: &str = "created";

/// Status category used to pick what the payer is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    Pending,
    AwaitingApproval,
    Success,
    Cancelled,
    Error,
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DisplayState::Pending => "pending",
            DisplayState::AwaitingApproval => "awaiting_approval",
            DisplayState::Success => "success",
            DisplayState::Cancelled => "cancelled",
            DisplayState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Derives the display state from the latest provider transaction.
///
/// Response records other than a fresh "created" defer to the payment's own
/// status. Unknown transaction types never count as success.
pub fn resolve(tx: &ProviderTransaction, payment: &Payment) -> DisplayState {
    match &tx.r#type {
        TransactionType::CreatePaymentResponse if tx.state() == STATE_CREATED => {
            DisplayState::AwaitingApproval
        }
        TransactionType::CreatePaymentResponse
        | TransactionType::GetPaymentResponse
        | TransactionType::ExecutePaymentResponse => status_display_state(payment),
        TransactionType::Error => DisplayState::Error,
        TransactionType::CreatePayment
        | TransactionType::GetPayment
        | TransactionType::ExecutePayment => DisplayState::Pending,
        TransactionType::Unrecognized(ty) => {
            warn!(
                project_id = tx.project_id,
                payment_id = tx.payment_id,
                tx_type = %ty,
                timestamp = %tx.timestamp,
                "unrecognized provider transaction type"
            );
            DisplayState::Error
        }
    }
}

/// Maps the payment's own status onto a display state.
///
/// Only terminal statuses are mapped; anything else is an error.
pub fn status_display_state(payment: &Payment) -> DisplayState {
    match &payment.status {
        PaymentStatus::Paid | PaymentStatus::Authorized => DisplayState::Success,
        PaymentStatus::Cancelled => DisplayState::Cancelled,
        PaymentStatus::Error => DisplayState::Error,
        status @ (PaymentStatus::Open | PaymentStatus::Unrecognized(_)) => {
            warn!(
                project_id = payment.id.project_id,
                payment_id = payment.id.payment_id,
                status = %status,
                "unmapped payment status"
            );
            DisplayState::Error
        }
    }
}
