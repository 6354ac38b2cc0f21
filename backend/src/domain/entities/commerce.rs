//! Commerce records mirrored from the shop backend.
//!
//! Local copies are replaced wholesale on every sync; no field-level merge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityKind, SyncEntity};

/// Role string the shop assigns to administrators.
pub const ROLE_ADMINISTRATOR: &str = "administrator";

/// Shop customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Shop-assigned identifier.
    pub id: i64,
    /// Login name; members log in with their national id.
    pub username: String,
    /// Contact e-mail.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Shop role (`customer`, `administrator`, ...).
    pub role: String,
}

impl Customer {
    /// Whether this customer administers the shop.
    pub fn is_administrator(&self) -> bool {
        self.role == ROLE_ADMINISTRATOR
    }
}

impl SyncEntity for Customer {
    type Id = i64;

    const KIND: EntityKind = EntityKind::Customers;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Line identifier.
    pub id: i64,
    /// Product name at purchase time.
    pub name: String,
    /// Purchased product.
    pub product_id: i64,
    /// Purchased variation, `0` when none.
    pub variation_id: i64,
    /// Units purchased.
    pub quantity: i64,
    /// Unit price.
    pub price: f64,
}

/// Shop order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Shop-assigned identifier.
    pub id: i64,
    /// Order status (`pending`, `processing`, `completed`, ...).
    pub status: String,
    /// ISO currency code.
    pub currency: String,
    /// Creation time.
    pub date_created: DateTime<Utc>,
    /// Last modification time.
    pub date_modified: DateTime<Utc>,
    /// Order total.
    pub total: f64,
    /// Customer who placed the order, resolved at read time.
    pub customer_id: i64,
    /// Purchased lines.
    pub items: Vec<OrderItem>,
}

impl SyncEntity for Order {
    type Id = i64;

    const KIND: EntityKind = EntityKind::Orders;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Stock availability reported for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Places are available.
    InStock,
    /// Sold out.
    OutOfStock,
    /// Accepting reservations beyond stock.
    OnBackorder,
}

/// Bookable event sold through the shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Shop-assigned identifier.
    pub id: i64,
    /// Product name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Public product URL.
    pub permalink: String,
    /// Creation time.
    pub date_created: DateTime<Utc>,
    /// Last modification time.
    pub date_modified: DateTime<Utc>,
    /// Long description.
    pub description: String,
    /// Short description, which carries dates and reservation limits.
    pub short_description: String,
    /// Ticket price.
    pub price: f64,
    /// Availability.
    pub stock_status: StockStatus,
    /// Remaining places, when the shop tracks stock.
    pub stock_quantity: Option<i64>,
}

impl SyncEntity for Event {
    type Id = i64;

    const KIND: EntityKind = EntityKind::Events;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Payment gateway available in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Gateway identifier (`bacs`, `cod`, ...).
    pub id: String,
    /// Title shown at checkout.
    pub title: String,
    /// Checkout description.
    pub description: String,
    /// Whether customers may pick this gateway.
    pub enabled: bool,
}

impl SyncEntity for PaymentMethod {
    type Id = String;

    const KIND: EntityKind = EntityKind::Payments;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
