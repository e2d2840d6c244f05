//! Wire types for the backend API (camelCase JSON, Mongo-style `_id`s).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockdesk_billing::{CartSnapshot, ProductSnapshot};
use stockdesk_core::{BillId, DomainError, DomainResult, Money, ProductId, StockRequestId};

use crate::auth::Role;

/// Product as listed by `GET /products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub min_stock_level: u32,
}

impl From<ProductRecord> for ProductSnapshot {
    fn from(record: ProductRecord) -> Self {
        ProductSnapshot::new(record.id, record.name, record.category, record.price, record.quantity)
            .with_min_stock_level(record.min_stock_level)
    }
}

/// Payload for `POST /products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub category: String,
    pub price: Money,
    pub quantity: u32,
    pub min_stock_level: u32,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        Ok(())
    }
}

/// Body of `PUT /products/{id}/quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: u32,
}

/// One line of a bill, priced at the time it was scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    pub quantity: u32,
    pub price: Money,
}

/// Payload for `POST /bills`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBill {
    pub items: Vec<BillItem>,
    pub total: Money,
}

impl NewBill {
    pub fn from_snapshot(snapshot: &CartSnapshot) -> Self {
        Self {
            items: snapshot
                .lines
                .iter()
                .map(|line| BillItem {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    price: line.unit_price,
                })
                .collect(),
            total: snapshot.total,
        }
    }
}

/// Bill as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    #[serde(alias = "_id")]
    pub id: BillId,
    pub items: Vec<BillItem>,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Query of `GET /bills/range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl BillRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> DomainResult<Self> {
        if end_date < start_date {
            return Err(DomainError::validation("end date is before start date"));
        }
        Ok(Self { start_date, end_date })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockRequestStatus {
    Pending,
    Approved,
    Declined,
}

/// Stock request as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRequest {
    #[serde(alias = "_id")]
    pub id: StockRequestId,
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    pub status: StockRequestStatus,
    #[serde(default)]
    pub requested_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /stock-requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStockRequest {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
}

/// Body of `PUT /stock-requests/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRequestUpdate {
    pub status: StockRequestStatus,
}

/// User account as returned by the backend (never carries the password).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    #[serde(alias = "_id")]
    pub id: stockdesk_core::UserId,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Payload for `POST /users/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Body of `POST /users/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `PUT /users/change-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

pub const MIN_PASSWORD_LEN: usize = 6;

impl PasswordChange {
    /// Check a change-password form before it is sent.
    pub fn from_form(old: &str, new: &str, confirm: &str) -> DomainResult<Self> {
        if new != confirm {
            return Err(DomainError::validation(
                "New password and confirm password do not match.",
            ));
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "New password must be at least {MIN_PASSWORD_LEN} characters long."
            )));
        }
        if old == new {
            return Err(DomainError::validation(
                "New password cannot be the same as the old password.",
            ));
        }
        Ok(Self {
            old_password: old.to_string(),
            new_password: new.to_string(),
        })
    }
}

/// Error body the backend sends alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockdesk_billing::CartLine;
    use stockdesk_core::Entity;

    #[test]
    fn product_record_accepts_mongo_ids_and_decimal_prices() {
        let record: ProductRecord = serde_json::from_value(json!({
            "_id": "LP-101",
            "name": "Laptop Pro 15\"",
            "category": "Electronics",
            "price": 1199.99,
            "quantity": 25,
            "minStockLevel": 10
        }))
        .unwrap();

        assert_eq!(record.id, ProductId::new("LP-101"));
        assert_eq!(record.price, Money::from_minor(119_999));

        let snapshot = ProductSnapshot::from(record);
        assert_eq!(snapshot.id(), &ProductId::new("LP-101"));
        assert_eq!(snapshot.available(), 25);
        assert_eq!(snapshot.min_stock_level(), 10);
    }

    #[test]
    fn new_bill_carries_add_time_prices_and_exact_total() {
        let snapshot = CartSnapshot::from_lines(vec![
            CartLine {
                product_id: ProductId::new("A"),
                name: "A".to_string(),
                quantity: 2,
                unit_price: Money::from_major(10),
            },
            CartLine {
                product_id: ProductId::new("B"),
                name: "B".to_string(),
                quantity: 1,
                unit_price: Money::from_major(5),
            },
        ]);

        let bill = NewBill::from_snapshot(&snapshot);
        let body = serde_json::to_value(&bill).unwrap();

        assert_eq!(body["total"], json!(25));
        assert_eq!(body["items"][0]["productId"], json!("A"));
        assert_eq!(body["items"][0]["quantity"], json!(2));
        assert_eq!(body["items"][0]["price"], json!(10));
    }

    #[test]
    fn password_change_form_rules() {
        assert!(PasswordChange::from_form("old-secret", "abc123", "abc124").is_err());
        assert!(PasswordChange::from_form("old-secret", "abc", "abc").is_err());
        assert!(PasswordChange::from_form("same-pass", "same-pass", "same-pass").is_err());
        let ok = PasswordChange::from_form("old-secret", "new-secret", "new-secret").unwrap();
        assert_eq!(ok.new_password, "new-secret");
    }

    #[test]
    fn bill_range_rejects_inverted_dates() {
        let a = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert!(BillRange::new(a, b).is_ok());
        assert!(BillRange::new(b, a).is_err());
    }
}
