//! Payment gateway hand-off contract.
//!
//! The coordinator sends a [`GatewayRequest`] out and later receives a
//! [`GatewayResult`] back through whatever transport the host uses (usually
//! return-URL query parameters).

use std::time::Duration;

use async_trait::async_trait;

use crate::checkout::PaymentMethod;
use crate::ids::{OrderReference, TransactionId};
use crate::money::Money;
use crate::CommerceError;

/// Outbound payload handed to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    /// Amount to charge.
    pub amount: Money,
    /// Reference the gateway must echo back.
    pub order_reference: OrderReference,
    /// Method chosen by the shopper.
    pub payment_method: PaymentMethod,
}

/// Status reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStatus {
    Success,
    Cancelled,
    /// Anything else the gateway sends back (declined, error, ...).
    Other(String),
}

impl GatewayStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" => GatewayStatus::Success,
            "cancelled" | "canceled" => GatewayStatus::Cancelled,
            other => GatewayStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GatewayStatus::Success => "success",
            GatewayStatus::Cancelled => "cancelled",
            GatewayStatus::Other(other) => other,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GatewayStatus::Success)
    }
}

/// Inbound resolution from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResult {
    /// Echoed reference. `None` when the transport dropped it.
    pub order_reference: Option<OrderReference>,
    pub status: GatewayStatus,
    pub transaction_id: Option<TransactionId>,
}

impl GatewayResult {
    /// A successful payment.
    pub fn success(reference: OrderReference, transaction_id: TransactionId) -> Self {
        Self {
            order_reference: Some(reference),
            status: GatewayStatus::Success,
            transaction_id: Some(transaction_id),
        }
    }

    /// The shopper backed out at the gateway.
    pub fn cancelled(reference: OrderReference) -> Self {
        Self {
            order_reference: Some(reference),
            status: GatewayStatus::Cancelled,
            transaction_id: None,
        }
    }

    /// Parse `orderReference=..&status=..&transactionId=..`.
    ///
    /// A leading `?` is ignored. Unknown keys are skipped; missing keys are
    /// left empty so the reconciler can reject them.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        let mut result = Self {
            order_reference: None,
            status: GatewayStatus::Other(String::new()),
            transaction_id: None,
        };
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "orderReference" | "ref" if !value.is_empty() => {
                    result.order_reference = Some(OrderReference::new(value));
                }
                "status" => result.status = GatewayStatus::parse(value),
                "transactionId" | "txn" if !value.is_empty() => {
                    result.transaction_id = Some(TransactionId::new(value));
                }
                _ => {}
            }
        }
        result
    }

    /// Parse the query string of a full return URL.
    pub fn from_return_url(return_url: &str) -> Result<Self, CommerceError> {
        let url = url::Url::parse(return_url)
            .map_err(|e| CommerceError::InvalidGatewayReturn(e.to_string()))?;
        Ok(Self::from_query(url.query().unwrap_or_default()))
    }

    /// Encode as a query string.
    pub fn to_query(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(reference) = &self.order_reference {
            query.append_pair("orderReference", reference.as_str());
        }
        query.append_pair("status", self.status.as_str());
        if let Some(txn) = &self.transaction_id {
            query.append_pair("transactionId", txn.as_str());
        }
        query.finish()
    }
}

/// External payment collaborator.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Take the shopper through payment and resolve with the outcome.
    async fn process(&self, request: &GatewayRequest) -> Result<GatewayResult, CommerceError>;
}

/// How the [`SimulatedGateway`] resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulatedOutcome {
    #[default]
    Approve,
    Cancel,
    Decline,
    /// Echo a reference other than the one sent.
    WrongReference,
}

/// Gateway stand-in that resolves after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
    outcome: SimulatedOutcome,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            outcome: SimulatedOutcome::Approve,
        }
    }

    pub fn with_outcome(mut self, outcome: SimulatedOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn process(&self, request: &GatewayRequest) -> Result<GatewayResult, CommerceError> {
        tracing::debug!(
            reference = %request.order_reference,
            amount = %request.amount,
            method = request.payment_method.as_str(),
            "simulated gateway processing"
        );
        tokio::time::sleep(self.delay).await;

        let reference = request.order_reference.clone();
        let result = match self.outcome {
            SimulatedOutcome::Approve => GatewayResult::success(reference, TransactionId::generate()),
            SimulatedOutcome::Cancel => GatewayResult::cancelled(reference),
            SimulatedOutcome::Decline => GatewayResult {
                order_reference: Some(reference),
                status: GatewayStatus::Other("declined".to_string()),
                transaction_id: None,
            },
            SimulatedOutcome::WrongReference => {
                GatewayResult::success(OrderReference::generate(), TransactionId::generate())
            }
        };
        Ok(result)
    }
}
