//! Stock request workflow: staff ask for restocks, admins decide.

use stockdesk_core::{DomainError, DomainResult, ProductId, StockRequestId};

use crate::backend::Backend;
use crate::error::ClientResult;
use crate::types::{NewStockRequest, ProductRecord, StockRequest, StockRequestStatus};

impl StockRequestStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, StockRequestStatus::Pending)
    }

    /// Only pending requests can be decided, and only once.
    pub fn transition(self, to: StockRequestStatus) -> DomainResult<StockRequestStatus> {
        match (self, to) {
            (StockRequestStatus::Pending, StockRequestStatus::Approved | StockRequestStatus::Declined) => {
                Ok(to)
            }
            (from, to) => Err(DomainError::conflict(format!(
                "stock request cannot move from {from:?} to {to:?}"
            ))),
        }
    }
}

impl NewStockRequest {
    pub fn for_product(product: &ProductRecord, quantity: u32) -> DomainResult<Self> {
        Self::new(product.id.clone(), product.name.clone(), quantity)
    }

    pub fn new(product_id: ProductId, product_name: impl Into<String>, quantity: u32) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("requested quantity must be at least 1"));
        }
        Ok(Self {
            product_id,
            product_name: product_name.into(),
            quantity,
        })
    }
}

pub async fn submit_request<B>(backend: &B, request: NewStockRequest) -> ClientResult<StockRequest>
where
    B: Backend + ?Sized,
{
    let created = backend.create_stock_request(&request).await?;
    tracing::info!(
        request_id = %created.id,
        product_id = %created.product_id,
        quantity = created.quantity,
        "stock request submitted"
    );
    Ok(created)
}

/// Approve or decline `request`, checking the transition locally first.
pub async fn decide<B>(
    backend: &B,
    request: &StockRequest,
    decision: StockRequestStatus,
) -> ClientResult<StockRequest>
where
    B: Backend + ?Sized,
{
    request.status.transition(decision)?;
    let updated = backend.update_stock_request(&request.id, decision).await?;
    tracing::info!(request_id = %updated.id, status = ?updated.status, "stock request decided");
    Ok(updated)
}

pub fn pending(requests: &[StockRequest]) -> impl Iterator<Item = &StockRequest> {
    requests.iter().filter(|r| r.status.is_pending())
}

pub fn find<'a>(requests: &'a [StockRequest], id: &StockRequestId) -> Option<&'a StockRequest> {
    requests.iter().find(|r| &r.id == id)
}
