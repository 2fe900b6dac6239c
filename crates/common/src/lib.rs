//! Shared vocabulary for the order, kitchen and report services.
//!
//! Every service agrees on these types out-of-band: identifiers, money,
//! the order status state machine and the injectable clock.

pub mod clock;
pub mod money;
pub mod status;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use money::Money;
pub use status::{OrderStatus, StatusError, can_transition};
pub use types::{EventId, OrderId, ProductId, TableId};
