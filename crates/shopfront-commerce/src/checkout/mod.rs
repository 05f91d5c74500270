//! Checkout module.
//!
//! Contains the checkout state machine, customer details, the gateway
//! contract, the hand-off ticket store and the order ledger.

mod customer;
mod flow;
mod gateway;
mod order;
mod payment;
mod ticket;

pub use customer::{Address, CustomerSnapshot};
pub use flow::{
    CheckoutCoordinator, CheckoutProgress, CheckoutStep, PendingHandoff, ReconcileOutcome,
};
pub use gateway::{
    GatewayRequest, GatewayResult, GatewayStatus, PaymentGateway, SimulatedGateway,
    SimulatedOutcome,
};
pub use order::{NewOrder, Order, OrderLedger, OrderLine, OrderStatus};
pub use payment::PaymentMethod;
pub use ticket::{CheckoutTicket, HandoffStore};
