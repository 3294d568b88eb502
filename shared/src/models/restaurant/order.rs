//! Restaurant Order Model
//!
//! Order lifecycle: OPEN → SENT_TO_KITCHEN → PREPARING → READY → DELIVERED →
//! CLOSED, with CANCELLED reachable before preparation starts. Once an order
//! is in the kitchen its status follows the item statuses (see
//! [`derive_order_status`]).

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, ErrorCode};
use crate::models::sale::PaymentMethod;

string_enum! {
    pub enum OrderStatus {
        Open => "OPEN",
        SentToKitchen => "SENT_TO_KITCHEN",
        Preparing => "PREPARING",
        Ready => "READY",
        Delivered => "DELIVERED",
        Closed => "CLOSED",
        Cancelled => "CANCELLED",
    }
}

impl OrderStatus {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Closed | OrderStatus::Cancelled)
    }

    /// Items may be added while the order has not been served
    pub const fn accepts_items(&self) -> bool {
        !matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Closed | OrderStatus::Cancelled
        )
    }

    /// Orders the kitchen display shows
    pub const fn in_kitchen(&self) -> bool {
        matches!(
            self,
            OrderStatus::SentToKitchen | OrderStatus::Preparing | OrderStatus::Ready
        )
    }

    /// Position along the forward path; terminal states sit past the end
    const fn rank(&self) -> u8 {
        match self {
            OrderStatus::Open => 0,
            OrderStatus::SentToKitchen => 1,
            OrderStatus::Preparing => 2,
            OrderStatus::Ready => 3,
            OrderStatus::Delivered => 4,
            OrderStatus::Closed | OrderStatus::Cancelled => 5,
        }
    }

    pub fn can_transition(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Open, SentToKitchen | Cancelled)
                | (SentToKitchen, Preparing | Cancelled)
                | (Preparing, Ready)
                | (Ready, Delivered)
                | (Delivered, Closed)
        )
    }

    pub fn transition(&self, next: OrderStatus) -> Result<OrderStatus, AppError> {
        if self.is_terminal() {
            return Err(AppError::with_message(
                ErrorCode::OrderClosed,
                format!("Order is already {self}"),
            ));
        }
        if !self.can_transition(next) {
            return Err(AppError::with_message(
                ErrorCode::InvalidOrderTransition,
                format!("Cannot change order from {self} to {next}"),
            )
            .with_detail("from", self.as_str())
            .with_detail("to", next.as_str()));
        }
        Ok(next)
    }
}

string_enum! {
    /// Kitchen state of a single order line
    pub enum OrderItemStatus {
        Pending => "PENDING",
        Preparing => "PREPARING",
        Ready => "READY",
        Delivered => "DELIVERED",
    }
}

impl OrderItemStatus {
    pub fn can_transition(&self, next: OrderItemStatus) -> bool {
        use OrderItemStatus::*;
        matches!(
            (self, next),
            (Pending, Preparing) | (Preparing, Ready) | (Ready, Delivered)
        )
    }

    /// Same-status updates are accepted as no-ops
    pub fn transition(&self, next: OrderItemStatus) -> Result<OrderItemStatus, AppError> {
        if *self == next || self.can_transition(next) {
            Ok(next)
        } else {
            Err(AppError::with_message(
                ErrorCode::InvalidItemTransition,
                format!("Cannot change item from {self} to {next}"),
            )
            .with_detail("from", self.as_str())
            .with_detail("to", next.as_str()))
        }
    }
}

/// Order status implied by its item statuses.
///
/// Only applies to orders in the kitchen, and only ever moves forward:
/// any item started → PREPARING, every item READY (or beyond) → READY,
/// every item DELIVERED → DELIVERED.
pub fn derive_order_status(current: OrderStatus, items: &[OrderItemStatus]) -> OrderStatus {
    if !current.in_kitchen() || items.is_empty() {
        return current;
    }
    let derived = if items.iter().all(|s| *s == OrderItemStatus::Delivered) {
        OrderStatus::Delivered
    } else if items
        .iter()
        .all(|s| matches!(s, OrderItemStatus::Ready | OrderItemStatus::Delivered))
    {
        OrderStatus::Ready
    } else if items.iter().any(|s| *s != OrderItemStatus::Pending) {
        OrderStatus::Preparing
    } else {
        current
    };
    if derived.rank() > current.rank() {
        derived
    } else {
        current
    }
}

/// Order header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub company_id: i64,
    pub table_id: i64,
    pub waiter_id: Option<i64>,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub status: OrderStatus,
    pub notes: Option<String>,
    /// Σ item quantity × unit price (cents)
    pub total: i64,
    /// Sale recorded when the order was closed with a payment
    pub sale_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub closed_at: Option<i64>,

    #[cfg_attr(feature = "db", sqlx(default))]
    pub table_number: Option<i32>,
    #[cfg_attr(feature = "db", sqlx(default))]
    pub waiter_name: Option<String>,
}

/// Order line; name and price are snapshotted from the menu item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub notes: Option<String>,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub status: OrderItemStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    pub menu_item_id: i64,
    #[validate(range(min = 1, max = 999, message = "must be 1-999"))]
    pub quantity: i64,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderCreate {
    pub table_id: i64,
    pub waiter_id: Option<i64>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub notes: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
}

/// Order status change; `payment_method` only matters when closing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub table_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenItemUpdate {
    pub status: OrderItemStatus,
}

/// One line on the kitchen display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct KitchenItem {
    pub item_id: i64,
    pub order_id: i64,
    pub table_id: i64,
    pub table_number: i32,
    pub name: String,
    pub quantity: i64,
    pub notes: Option<String>,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub status: OrderItemStatus,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub order_status: OrderStatus,
    pub created_at: i64,
    #[cfg_attr(feature = "db", sqlx(default))]
    pub minutes_waiting: i64,
}

impl KitchenItem {
    pub fn with_wait(mut self, now: i64) -> Self {
        self.minutes_waiting = ((now - self.created_at) / 60_000).max(0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::OrderItemStatus as I;
    use super::OrderStatus as O;
    use super::*;

    #[test]
    fn forward_path_is_allowed() {
        let path = [O::Open, O::SentToKitchen, O::Preparing, O::Ready, O::Delivered, O::Closed];
        for pair in path.windows(2) {
            assert_eq!(pair[0].transition(pair[1]).unwrap(), pair[1]);
        }
    }

    #[test]
    fn closing_early_is_rejected() {
        for from in [O::Open, O::SentToKitchen, O::Preparing, O::Ready] {
            let err = from.transition(O::Closed).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidOrderTransition);
        }
    }

    #[test]
    fn cancel_only_before_preparation() {
        assert!(O::Open.can_transition(O::Cancelled));
        assert!(O::SentToKitchen.can_transition(O::Cancelled));
        assert!(!O::Preparing.can_transition(O::Cancelled));
        assert!(!O::Delivered.can_transition(O::Cancelled));
    }

    #[test]
    fn terminal_orders_are_frozen() {
        for from in [O::Closed, O::Cancelled] {
            for to in O::ALL {
                assert_eq!(from.transition(*to).unwrap_err().code, ErrorCode::OrderClosed);
            }
        }
    }

    #[test]
    fn item_transitions_step_forward() {
        assert!(I::Pending.transition(I::Preparing).is_ok());
        assert!(I::Preparing.transition(I::Ready).is_ok());
        assert!(I::Ready.transition(I::Delivered).is_ok());
        assert!(I::Ready.transition(I::Ready).is_ok());
        assert_eq!(
            I::Pending.transition(I::Ready).unwrap_err().code,
            ErrorCode::InvalidItemTransition
        );
        assert!(I::Delivered.transition(I::Pending).is_err());
    }

    #[test]
    fn order_status_follows_items() {
        assert_eq!(
            derive_order_status(O::SentToKitchen, &[I::Pending, I::Pending]),
            O::SentToKitchen
        );
        assert_eq!(
            derive_order_status(O::SentToKitchen, &[I::Preparing, I::Pending]),
            O::Preparing
        );
        assert_eq!(derive_order_status(O::Preparing, &[I::Ready, I::Delivered]), O::Ready);
        assert_eq!(
            derive_order_status(O::Ready, &[I::Delivered, I::Delivered]),
            O::Delivered
        );
    }

    #[test]
    fn derived_status_never_moves_back() {
        // A new pending item on a READY order does not reopen preparation
        assert_eq!(derive_order_status(O::Ready, &[I::Ready, I::Pending]), O::Ready);
        assert_eq!(derive_order_status(O::Open, &[I::Ready]), O::Open);
        assert_eq!(derive_order_status(O::Preparing, &[]), O::Preparing);
    }

    #[test]
    fn kitchen_wait_in_minutes() {
        let item = KitchenItem {
            item_id: 1,
            order_id: 1,
            table_id: 1,
            table_number: 4,
            name: "Feijoada".into(),
            quantity: 2,
            notes: None,
            status: I::Pending,
            order_status: O::SentToKitchen,
            created_at: 1_000_000,
            minutes_waiting: 0,
        }
        .with_wait(1_000_000 + 7 * 60_000 + 30_000);
        assert_eq!(item.minutes_waiting, 7);
    }
}
