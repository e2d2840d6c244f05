use thiserror::Error;

use stockdesk_billing::ScanError;

pub type ClientResult<T> = Result<T, ClientError>;

/// Fallback shown when the backend gives no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("parse error: {0}")]
    Parse(String),
    /// The backend refused a bill because stock ran out elsewhere.
    #[error("stock conflict: {0}")]
    StockConflict(String),
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("cart is empty")]
    EmptyCart,
    /// Another checkout of the same cart is waiting on the backend.
    #[error("a checkout is already in progress")]
    CheckoutInProgress,
    #[error("billing session is closed")]
    SessionClosed,
    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl ClientError {
    /// Message suitable for an inline error label.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } | ClientError::StockConflict(message) => message.clone(),
            ClientError::Invalid(message) => message.clone(),
            ClientError::Scan(e) => e.user_message(),
            ClientError::EmptyCart => "Cart is empty.".to_string(),
            ClientError::CheckoutInProgress => "Checkout already in progress.".to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// The backend disagrees with the local stock snapshot: a bill was
    /// refused for stock, or a product no longer exists.
    pub fn needs_resync(&self) -> bool {
        matches!(
            self,
            ClientError::StockConflict(_) | ClientError::Api { status: 404, .. }
        )
    }
}

impl From<stockdesk_core::DomainError> for ClientError {
    fn from(value: stockdesk_core::DomainError) -> Self {
        ClientError::Invalid(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockdesk_core::ProductId;

    #[test]
    fn user_messages_prefer_backend_text() {
        let api = ClientError::Api {
            status: 401,
            message: "Invalid email or password".to_string(),
        };
        assert_eq!(api.user_message(), "Invalid email or password");
        assert_eq!(ClientError::Network("refused".into()).user_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(
            ClientError::from(ScanError::NotFound(ProductId::new("X"))).user_message(),
            "Item not found!"
        );
    }

    #[test]
    fn stock_refusals_and_missing_products_need_resync() {
        assert!(ClientError::StockConflict("Insufficient stock".into()).needs_resync());
        assert!(
            ClientError::Api {
                status: 404,
                message: "Product not found".into()
            }
            .needs_resync()
        );
        assert!(!ClientError::Network("down".into()).needs_resync());
        assert!(!ClientError::EmptyCart.needs_resync());
        assert!(!ClientError::CheckoutInProgress.needs_resync());
    }
}
