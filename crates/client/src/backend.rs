//! Backend API seam.
//!
//! The counter only ever talks to the backend through this trait, so tests
//! (and alternative transports) can stand in for the HTTP client.

use async_trait::async_trait;

use stockdesk_billing::ProductSnapshot;
use stockdesk_core::{ProductId, StockRequestId};

use crate::auth::AuthSession;
use crate::error::ClientResult;
use crate::types::{
    Bill, BillRange, NewBill, NewProduct, NewStockRequest, NewUser, PasswordChange, ProductRecord,
    StockRequest, StockRequestStatus, UserAccount,
};

#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthSession>;

    async fn register(&self, user: &NewUser) -> ClientResult<UserAccount>;

    async fn change_password(&self, change: &PasswordChange) -> ClientResult<()>;

    async fn list_products(&self) -> ClientResult<Vec<ProductRecord>>;

    async fn create_product(&self, product: &NewProduct) -> ClientResult<ProductRecord>;

    async fn update_quantity(&self, id: &ProductId, quantity: u32) -> ClientResult<ProductRecord>;

    async fn low_stock_products(&self) -> ClientResult<Vec<ProductRecord>>;

    /// Submit a sale. A refusal because stock ran out must surface as
    /// [`ClientError::StockConflict`](crate::ClientError::StockConflict).
    async fn create_bill(&self, bill: &NewBill) -> ClientResult<Bill>;

    async fn list_bills(&self) -> ClientResult<Vec<Bill>>;

    async fn bills_in_range(&self, range: BillRange) -> ClientResult<Vec<Bill>>;

    async fn create_stock_request(&self, request: &NewStockRequest) -> ClientResult<StockRequest>;

    async fn list_stock_requests(&self) -> ClientResult<Vec<StockRequest>>;

    async fn update_stock_request(
        &self,
        id: &StockRequestId,
        status: StockRequestStatus,
    ) -> ClientResult<StockRequest>;
}

/// Fetch the product list as a reconciler snapshot.
pub async fn fetch_snapshot<B>(backend: &B) -> ClientResult<Vec<ProductSnapshot>>
where
    B: Backend + ?Sized,
{
    let products = backend.list_products().await?;
    Ok(products.into_iter().map(ProductSnapshot::from).collect())
}
