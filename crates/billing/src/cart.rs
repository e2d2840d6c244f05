use serde::{Deserialize, Serialize};

use stockdesk_core::{Money, ProductId, ValueObject};

/// One product's accumulated quantity in the open sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    /// Price captured when the line was created.
    pub unit_price: Money,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Result of an accepted scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMutation {
    pub line: CartLine,
    pub total: Money,
}

/// Immutable copy of the cart, handed to the checkout flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub total: Money,
}

impl CartSnapshot {
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let total = lines.iter().map(CartLine::line_total).sum();
        Self { lines, total }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| &l.product_id == product_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }
}

impl ValueObject for CartSnapshot {}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, quantity: u32, price: &str) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            name: id.to_string(),
            quantity,
            unit_price: Money::parse_decimal(price).unwrap(),
        }
    }

    #[test]
    fn snapshot_total_is_sum_of_line_totals() {
        let snapshot = CartSnapshot::from_lines(vec![line("A", 2, "10.00"), line("B", 1, "5.00")]);
        assert_eq!(snapshot.total, Money::from_major(25));
        assert_eq!(snapshot.total.to_string(), "25.00");
        assert_eq!(snapshot.item_count(), 3);
        assert_eq!(snapshot.quantity_of(&ProductId::new("A")), 2);
        assert_eq!(snapshot.quantity_of(&ProductId::new("Z")), 0);
    }
}
