use super::resolver::STATE_CREATED;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::transaction::{ProviderTransaction, TransactionType};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

const JSON_MEDIA_TYPE: &str = "application/json";

/// Page the view layer renders for a status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// Loading screen shown while a provider call is in flight.
    Init,
    /// Redirect to the provider's approval URL.
    ApprovalRedirect { url: String },
    Success,
    Cancel,
    PaymentError,
    NotFound,
    InternalError,
}

impl Page {
    pub fn status_code(&self) -> u16 {
        match self {
            Page::Init | Page::Success | Page::Cancel | Page::PaymentError => 200,
            Page::ApprovalRedirect { .. } => 307,
            Page::NotFound => 404,
            Page::InternalError => 500,
        }
    }
}

/// Body of the poll response: `{"c": true}` means keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResponse {
    pub c: bool,
}

impl PollResponse {
    pub fn to_json(self) -> serde_json::Result<String> {
        serde_json::to_string(&self)
    }
}

/// The content-negotiation headers of an incoming status check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRequest {
    pub accept: Option<String>,
    pub content_type: Option<String>,
}

impl StatusRequest {
    pub fn page_load() -> Self {
        Self::default()
    }

    pub fn poll() -> Self {
        Self {
            accept: Some(JSON_MEDIA_TYPE.to_string()),
            content_type: None,
        }
    }

    /// An asynchronous poll announces JSON in either header.
    pub fn is_poll(&self) -> bool {
        [&self.accept, &self.content_type]
            .into_iter()
            .flatten()
            .any(|v| v.contains(JSON_MEDIA_TYPE))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusResponse {
    Poll(PollResponse),
    Page(Page),
}

impl StatusResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            StatusResponse::Poll(_) => 200,
            StatusResponse::Page(page) => page.status_code(),
        }
    }
}

/// True while a request has gone out and neither response nor error has
/// been recorded.
pub fn should_continue_polling(tx: &ProviderTransaction) -> bool {
    tx.r#type.is_request()
}

/// Picks the page for the latest transaction; anything not covered falls
/// through to `default`.
pub fn select_handler(tx: &ProviderTransaction, payment: &Payment, default: Page) -> Page {
    match &tx.r#type {
        TransactionType::CreatePaymentResponse if tx.state() == STATE_CREATED => {
            approval_handler(tx, payment)
        }
        TransactionType::CreatePaymentResponse => payment_status_handler(payment),
        TransactionType::Error => Page::PaymentError,
        TransactionType::GetPaymentResponse | TransactionType::ExecutePaymentResponse => {
            payment_status_handler(payment)
        }
        _ => default,
    }
}

pub fn payment_status_handler(payment: &Payment) -> Page {
    match &payment.status {
        PaymentStatus::Cancelled => Page::Cancel,
        PaymentStatus::Paid | PaymentStatus::Authorized => Page::Success,
        PaymentStatus::Error => Page::PaymentError,
        status => {
            warn!(
                project_id = payment.id.project_id,
                payment_id = payment.id.payment_id,
                status = %status,
                "unknown payment status"
            );
            Page::PaymentError
        }
    }
}

fn approval_handler(tx: &ProviderTransaction, payment: &Payment) -> Page {
    match tx.link("approval_url") {
        Some(url) => Page::ApprovalRedirect { url },
        None => {
            error!(
                project_id = payment.id.project_id,
                payment_id = payment.id.payment_id,
                timestamp = %tx.timestamp,
                "no approval URL in provider response"
            );
            Page::PaymentError
        }
    }
}

/// Answers a status check.
///
/// Polls get the continue flag, page loads get the page for the latest
/// transaction. A payment that has not reached the provider yet shows the
/// init page and keeps the poll loop running.
pub fn respond(
    request: &StatusRequest,
    latest: Option<&ProviderTransaction>,
    payment: &Payment,
    default: Page,
) -> StatusResponse {
    match (request.is_poll(), latest) {
        (true, Some(tx)) => StatusResponse::Poll(PollResponse {
            c: should_continue_polling(tx),
        }),
        (true, None) => StatusResponse::Poll(PollResponse { c: true }),
        (false, Some(tx)) => StatusResponse::Page(select_handler(tx, payment, default)),
        (false, None) => StatusResponse::Page(Page::Init),
    }
}
