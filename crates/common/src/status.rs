//! Order status state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The status of an order in its lifecycle.
///
/// Status transitions are forward-only:
/// ```text
/// Pending ──► InPreparation ──► Ready
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order was placed and is waiting for the kitchen.
    #[default]
    Pending,

    /// Kitchen picked the order up.
    InPreparation,

    /// Order is ready to be served (terminal state).
    Ready,
}

/// Raised when a status change does not follow the allowed edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid status transition from {from} to {to}")]
pub struct StatusError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Returns true if `current -> target` is an allowed edge.
pub fn can_transition(current: OrderStatus, target: OrderStatus) -> bool {
    matches!(
        (current, target),
        (OrderStatus::Pending, OrderStatus::InPreparation)
            | (OrderStatus::InPreparation, OrderStatus::Ready)
    )
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::InPreparation,
        OrderStatus::Ready,
    ];

    /// Returns true if the order can move to `target` from this status.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        can_transition(*self, target)
    }

    /// Returns `target` if the edge is allowed.
    pub fn transition_to(&self, target: OrderStatus) -> Result<OrderStatus, StatusError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(StatusError {
                from: *self,
                to: target,
            })
        }
    }

    /// Returns the next status in the lifecycle, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::InPreparation),
            OrderStatus::InPreparation => Some(OrderStatus::Ready),
            OrderStatus::Ready => None,
        }
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Ready)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::InPreparation => "IN_PREPARATION",
            OrderStatus::Ready => "READY",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "IN_PREPARATION" => Ok(OrderStatus::InPreparation),
            "READY" => Ok(OrderStatus::Ready),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}
