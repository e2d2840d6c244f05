use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use stockdesk_core::{Entity, Money, ProductId};

use crate::cart::{CartLine, CartMutation, CartSnapshot};
use crate::dedupe::DedupeGuard;
use crate::error::ScanError;
use crate::product::ProductSnapshot;
use crate::scan::ScanEvent;

/// Minimum gap between two accepted scans of the same barcode.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3000);

/// A cart line that a fresh snapshot can no longer cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub product_id: ProductId,
    pub in_cart: u32,
    pub in_stock: u32,
}

/// Outcome of replacing the snapshot while a cart may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResyncReport {
    pub products: usize,
    pub shortfalls: Vec<Shortfall>,
    /// Cart lines whose product is absent from the new snapshot.
    pub missing: Vec<ProductId>,
}

impl ResyncReport {
    /// The open cart is fully covered by the new snapshot.
    pub fn is_consistent(&self) -> bool {
        self.shortfalls.is_empty() && self.missing.is_empty()
    }
}

/// Turns scan events into cart mutations against a local stock snapshot.
///
/// Single-owner and synchronous: every method runs to completion and either
/// applies its whole effect or none of it. Callers on several threads must
/// serialize access themselves (see the client's billing session).
#[derive(Debug, Clone)]
pub struct ScanReconciler {
    products: HashMap<ProductId, ProductSnapshot>,
    cart: Vec<CartLine>,
    /// Cart units the last snapshot could not back with stock.
    uncovered: HashMap<ProductId, u32>,
    dedupe: DedupeGuard,
}

impl Default for ScanReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanReconciler {
    pub fn new() -> Self {
        Self::with_cooldown(DEFAULT_COOLDOWN)
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            products: HashMap::new(),
            cart: Vec::new(),
            uncovered: HashMap::new(),
            dedupe: DedupeGuard::new(cooldown),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.dedupe.cooldown()
    }

    /// Replace the snapshot wholesale.
    ///
    /// The cart is left as is. Quantities already in the cart are reserved
    /// against the incoming stock so `available` keeps meaning "still
    /// sellable"; lines the new stock cannot cover are reported, and their
    /// uncovered units are never handed back to the snapshot.
    pub fn initialize(&mut self, products: impl IntoIterator<Item = ProductSnapshot>) -> ResyncReport {
        self.products = products
            .into_iter()
            .map(|p| (p.id().clone(), p))
            .collect();
        self.uncovered.clear();

        let mut report = ResyncReport {
            products: self.products.len(),
            ..ResyncReport::default()
        };

        for line in &self.cart {
            match self.products.get_mut(&line.product_id) {
                Some(product) => {
                    let uncovered = product.reserve(line.quantity);
                    if uncovered > 0 {
                        self.uncovered.insert(line.product_id.clone(), uncovered);
                        report.shortfalls.push(Shortfall {
                            product_id: line.product_id.clone(),
                            in_cart: line.quantity,
                            in_stock: line.quantity - uncovered,
                        });
                    }
                }
                None => report.missing.push(line.product_id.clone()),
            }
        }

        if report.is_consistent() {
            tracing::debug!(products = report.products, "stock snapshot replaced");
        } else {
            tracing::warn!(
                products = report.products,
                shortfalls = report.shortfalls.len(),
                missing = report.missing.len(),
                "stock snapshot no longer covers the open cart"
            );
        }

        report
    }

    /// Process one scan.
    ///
    /// `Ok(None)` means the scan repeated the last accepted barcode inside the
    /// cooldown window and was dropped. Errors leave all state untouched.
    pub fn submit_scan(&mut self, event: &ScanEvent) -> Result<Option<CartMutation>, ScanError> {
        let barcode = event.barcode.trim();
        if barcode.is_empty() {
            return Err(ScanError::InvalidInput("barcode is empty".to_string()));
        }

        if self.dedupe.is_duplicate(barcode, event.at) {
            tracing::trace!(barcode, source = %event.source, "duplicate scan suppressed");
            return Ok(None);
        }

        let product_id = ProductId::new(barcode);
        let product = self
            .products
            .get_mut(&product_id)
            .ok_or_else(|| ScanError::NotFound(product_id.clone()))?;

        // `available` already excludes what the cart holds, so one more unit
        // fits exactly when it is non-zero.
        if product.available() == 0 {
            return Err(ScanError::InsufficientStock {
                product_id,
                available: 0,
            });
        }
        product.take_one();

        let line = match self.cart.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity += 1;
                line.clone()
            }
            None => {
                let line = CartLine {
                    product_id: product_id.clone(),
                    name: product.name().to_string(),
                    quantity: 1,
                    unit_price: product.unit_price(),
                };
                self.cart.push(line.clone());
                line
            }
        };

        self.dedupe.record(barcode, event.at);

        let total = self.total();
        tracing::debug!(
            product_id = %product_id,
            source = %event.source,
            quantity = line.quantity,
            total = %total,
            "scan accepted"
        );

        Ok(Some(CartMutation { line, total }))
    }

    /// Drop a line and give its covered quantity back to the snapshot.
    pub fn remove_line(&mut self, product_id: &ProductId) -> Option<CartLine> {
        let idx = self.cart.iter().position(|l| &l.product_id == product_id)?;
        let line = self.cart.remove(idx);
        self.restore_line(&line);
        Some(line)
    }

    /// Drop every line, restoring all covered quantities.
    pub fn clear_cart(&mut self) -> Vec<CartLine> {
        let lines = std::mem::take(&mut self.cart);
        for line in &lines {
            self.restore_line(line);
        }
        lines
    }

    fn restore_line(&mut self, line: &CartLine) {
        let uncovered = self.uncovered.remove(&line.product_id).unwrap_or(0);
        if let Some(product) = self.products.get_mut(&line.product_id) {
            product.restore(line.quantity.saturating_sub(uncovered));
        }
    }

    /// Copy of the cart for submission. The cart stays open.
    pub fn checkout(&self) -> CartSnapshot {
        CartSnapshot::from_lines(self.cart.clone())
    }

    /// Close out a sale the backend has confirmed.
    ///
    /// The sold quantities leave the cart without being restored (the stock is
    /// gone), anything scanned after `sold` was taken stays in the cart, and
    /// the snapshot is replaced with `products`.
    pub fn settle(
        &mut self,
        sold: &CartSnapshot,
        products: impl IntoIterator<Item = ProductSnapshot>,
    ) -> ResyncReport {
        self.release_sold(sold);
        self.initialize(products)
    }

    /// Remove `sold` from the cart without giving its stock back.
    ///
    /// The current snapshot stays in place; it already excludes the sold
    /// units. Used when a confirmed sale cannot be followed by a resync.
    pub fn release_sold(&mut self, sold: &CartSnapshot) {
        for sold_line in &sold.lines {
            if let Some(line) = self
                .cart
                .iter_mut()
                .find(|l| l.product_id == sold_line.product_id)
            {
                line.quantity = line.quantity.saturating_sub(sold_line.quantity);
            }
        }
        self.cart.retain(|l| l.quantity > 0);

        let cart = &self.cart;
        self.uncovered.retain(|id, units| {
            let left = cart
                .iter()
                .find(|l| &l.product_id == id)
                .map_or(0, |l| l.quantity);
            *units = (*units).min(left);
            *units > 0
        });
    }

    pub fn cart(&self) -> &[CartLine] {
        &self.cart
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    pub fn total(&self) -> Money {
        self.cart.iter().map(CartLine::line_total).sum()
    }

    pub fn cart_quantity(&self, product_id: &ProductId) -> u32 {
        self.cart
            .iter()
            .find(|l| &l.product_id == product_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    /// Units of this product in the cart that the snapshot does not back.
    pub fn uncovered(&self, product_id: &ProductId) -> u32 {
        self.uncovered.get(product_id).copied().unwrap_or(0)
    }

    pub fn product(&self, product_id: &ProductId) -> Option<&ProductSnapshot> {
        self.products.get(product_id)
    }

    pub fn products(&self) -> impl Iterator<Item = &ProductSnapshot> {
        self.products.values()
    }

    pub fn last_accepted_barcode(&self) -> Option<&str> {
        self.dedupe.last_accepted().map(|(code, _)| code)
    }
}
