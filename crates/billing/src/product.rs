use serde::{Deserialize, Serialize};

use stockdesk_core::{Entity, Money, ProductId};

/// Local view of one product's price and remaining availability.
///
/// `available` is what the counter may still sell: backend stock minus what
/// already sits in the open cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    id: ProductId,
    name: String,
    category: String,
    unit_price: Money,
    available: u32,
    min_stock_level: u32,
}

impl ProductSnapshot {
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        category: impl Into<String>,
        unit_price: Money,
        available: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            unit_price,
            available,
            min_stock_level: 0,
        }
    }

    pub fn with_min_stock_level(mut self, level: u32) -> Self {
        self.min_stock_level = level;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    pub fn min_stock_level(&self) -> u32 {
        self.min_stock_level
    }

    /// At or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.available <= self.min_stock_level
    }

    pub(crate) fn take_one(&mut self) {
        self.available -= 1;
    }

    pub(crate) fn restore(&mut self, quantity: u32) {
        self.available += quantity;
    }

    /// Reserve `quantity` units; returns how many could not be covered.
    pub(crate) fn reserve(&mut self, quantity: u32) -> u32 {
        let covered = quantity.min(self.available);
        self.available -= covered;
        quantity - covered
    }
}

impl Entity for ProductSnapshot {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }
}
