//! Inventory reporting and display formatting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockdesk_core::Money;

use crate::types::{ProductRecord, StockRequest, StockRequestStatus};

/// Display currency. Amounts are never converted, only formatted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
        }
    }
}

impl core::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

/// `₹1,23,456.50` (Indian grouping) or `$123,456.50`.
pub fn format_currency(amount: Money, currency: Currency) -> String {
    let digits = amount.major_part().to_string();
    let grouped = match currency {
        Currency::Inr => group_indian(&digits),
        Currency::Usd => group_thousands(&digits),
    };
    format!("{}{}.{:02}", currency.symbol(), grouped, amount.minor_part())
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// Last three digits form one group, everything before is grouped in pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::with_capacity(digits.len() + digits.len() / 2);
    for (i, ch) in head.chars().enumerate() {
        if i > 0 && (head.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push(',');
    out.push_str(tail);
    out
}

/// `19 Oct 2026, 02:30 PM`.
pub fn format_bill_date(at: DateTime<Utc>) -> String {
    at.format("%d %b %Y, %I:%M %p").to_string()
}

pub fn is_low_stock(product: &ProductRecord) -> bool {
    product.quantity <= product.min_stock_level
}

pub fn low_stock(products: &[ProductRecord]) -> Vec<&ProductRecord> {
    products.iter().filter(|p| is_low_stock(p)).collect()
}

/// Figures shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub product_count: usize,
    pub total_stock_value: Money,
    pub low_stock_items: usize,
    pub pending_requests: usize,
}

impl DashboardSummary {
    pub fn compute(products: &[ProductRecord], requests: &[StockRequest]) -> Self {
        Self {
            product_count: products.len(),
            total_stock_value: products.iter().map(|p| p.price.times(p.quantity)).sum(),
            low_stock_items: products.iter().filter(|p| is_low_stock(p)).count(),
            pending_requests: requests
                .iter()
                .filter(|r| r.status == StockRequestStatus::Pending)
                .count(),
        }
    }
}
