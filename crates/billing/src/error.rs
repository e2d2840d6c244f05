use thiserror::Error;

use stockdesk_core::ProductId;

/// Why a scan was not added to the cart.
///
/// All variants are recoverable and leave the reconciler untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("invalid barcode: {0}")]
    InvalidInput(String),
    #[error("product not found: {0}")]
    NotFound(ProductId),
    #[error("insufficient stock for {product_id}: {available} available")]
    InsufficientStock { product_id: ProductId, available: u32 },
}

impl ScanError {
    /// Short message for the counter display.
    pub fn user_message(&self) -> String {
        match self {
            ScanError::InvalidInput(_) => "Enter a product code".to_string(),
            ScanError::NotFound(_) => "Item not found!".to_string(),
            ScanError::InsufficientStock { available: 0, .. } => "Item is out of stock!".to_string(),
            ScanError::InsufficientStock { available, .. } => {
                format!("Only {available} in stock")
            }
        }
    }
}
