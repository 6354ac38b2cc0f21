//! Transport DTOs for the shop, directory, and ledger endpoints.
//!
//! Adapters decode into these first, then map into domain records in one
//! pass so decoding problems surface as a single decode error.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::domain::entities::{
    Customer, Event, Member, Order, OrderItem, PaymentMethod, PersonalLedger, StockStatus,
    Transaction, TransactionAmount,
};
use crate::domain::ports::Account;

#[derive(Debug, Deserialize)]
pub(super) struct CustomerDto {
    pub(super) id: i64,
    pub(super) username: String,
    #[serde(default)]
    pub(super) email: String,
    #[serde(default)]
    pub(super) first_name: String,
    #[serde(default)]
    pub(super) last_name: String,
    #[serde(default)]
    pub(super) role: String,
}

impl From<CustomerDto> for Customer {
    fn from(dto: CustomerDto) -> Self {
        Self {
            id: dto.id,
            username: dto.username,
            email: dto.email,
            first_name: dto.first_name,
            last_name: dto.last_name,
            role: dto.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PaymentGatewayDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) title: String,
    #[serde(default)]
    pub(super) description: String,
    #[serde(default)]
    pub(super) enabled: bool,
}

impl From<PaymentGatewayDto> for PaymentMethod {
    fn from(dto: PaymentGatewayDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            description: dto.description,
            enabled: dto.enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LineItemDto {
    pub(super) id: i64,
    #[serde(default)]
    pub(super) name: String,
    pub(super) product_id: i64,
    #[serde(default)]
    pub(super) variation_id: i64,
    pub(super) quantity: i64,
    #[serde(default)]
    pub(super) price: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderDto {
    pub(super) id: i64,
    pub(super) status: String,
    pub(super) currency: String,
    pub(super) date_created_gmt: String,
    pub(super) date_modified_gmt: String,
    pub(super) total: String,
    pub(super) customer_id: i64,
    #[serde(default)]
    pub(super) line_items: Vec<LineItemDto>,
}

impl OrderDto {
    pub(super) fn into_domain(self) -> Result<Order, String> {
        Ok(Order {
            id: self.id,
            date_created: parse_gmt(&self.date_created_gmt)
                .map_err(|error| format!("order {}: {error}", self.id))?,
            date_modified: parse_gmt(&self.date_modified_gmt)
                .map_err(|error| format!("order {}: {error}", self.id))?,
            total: parse_amount(&self.total)
                .map_err(|error| format!("order {}: {error}", self.id))?,
            status: self.status,
            currency: self.currency,
            customer_id: self.customer_id,
            items: self
                .line_items
                .into_iter()
                .map(|item| OrderItem {
                    id: item.id,
                    name: item.name,
                    product_id: item.product_id,
                    variation_id: item.variation_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductDto {
    pub(super) id: i64,
    pub(super) name: String,
    #[serde(default)]
    pub(super) slug: String,
    #[serde(default)]
    pub(super) permalink: String,
    pub(super) date_created_gmt: String,
    pub(super) date_modified_gmt: String,
    #[serde(default)]
    pub(super) description: String,
    #[serde(default)]
    pub(super) short_description: String,
    #[serde(default)]
    pub(super) price: String,
    pub(super) stock_status: String,
    pub(super) stock_quantity: Option<i64>,
}

impl ProductDto {
    pub(super) fn into_domain(self) -> Result<Event, String> {
        let stock_status = match self.stock_status.as_str() {
            "instock" => StockStatus::InStock,
            "outofstock" => StockStatus::OutOfStock,
            "onbackorder" => StockStatus::OnBackorder,
            other => return Err(format!("event {}: unknown stock status {other}", self.id)),
        };
        let price = if self.price.trim().is_empty() {
            0.0
        } else {
            parse_amount(&self.price).map_err(|error| format!("event {}: {error}", self.id))?
        };
        Ok(Event {
            id: self.id,
            date_created: parse_gmt(&self.date_created_gmt)
                .map_err(|error| format!("event {}: {error}", self.id))?,
            date_modified: parse_gmt(&self.date_modified_gmt)
                .map_err(|error| format!("event {}: {error}", self.id))?,
            name: self.name,
            slug: self.slug,
            permalink: self.permalink,
            description: self.description,
            short_description: self.short_description,
            price,
            stock_status,
            stock_quantity: self.stock_quantity,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct MemberDto {
    pub(super) id: i64,
    pub(super) name: String,
    #[serde(default)]
    pub(super) national_id: Option<String>,
    #[serde(default)]
    pub(super) parent_member_id: Option<i64>,
}

impl From<MemberDto> for Member {
    fn from(dto: MemberDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            national_id: dto.national_id.filter(|value| !value.trim().is_empty()),
            parent_member_id: dto.parent_member_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginResponseDto {
    pub(super) token: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct LedgerPageDto {
    #[serde(default)]
    pub(super) balance: Option<f64>,
    #[serde(default)]
    pub(super) transactions: Vec<LedgerLineDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LedgerLineDto {
    #[serde(default)]
    pub(super) date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(super) description: String,
    #[serde(default)]
    pub(super) enters: Option<f64>,
    #[serde(default)]
    pub(super) exits: Option<f64>,
}

impl LedgerPageDto {
    pub(super) fn into_ledger(self, account: &Account) -> Result<PersonalLedger, String> {
        let transactions = self
            .transactions
            .into_iter()
            .enumerate()
            .map(|(line, dto)| dto.into_domain().map_err(|error| format!("line {line}: {error}")))
            .collect::<Result<Vec<_>, _>>()?;
        let mut ledger = PersonalLedger::new(
            account.name.clone(),
            account.account_type.clone(),
            transactions,
        );
        ledger.balance = self.balance;
        Ok(ledger)
    }
}

impl LedgerLineDto {
    fn into_domain(self) -> Result<Transaction, String> {
        let amount = match (self.enters, self.exits) {
            (Some(enters), None) => TransactionAmount::In(enters),
            (None, Some(exits)) => TransactionAmount::Out(exits),
            (Some(_), Some(_)) => return Err("both enters and exits are set".to_owned()),
            (None, None) => return Err("neither enters nor exits is set".to_owned()),
        };
        Ok(Transaction {
            amount,
            description: self.description,
            timestamp: self.date,
            notified: false,
        })
    }
}

fn parse_gmt(raw: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|error| format!("invalid GMT timestamp {raw:?}: {error}"))
}

fn parse_amount(raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|error| format!("invalid amount {raw:?}: {error}"))
}
