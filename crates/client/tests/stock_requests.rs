use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use stockdesk_client::requests::{decide, find, pending, submit_request};
use stockdesk_client::types::{
    Bill, BillRange, NewBill, NewProduct, NewStockRequest, NewUser, PasswordChange, ProductRecord,
    StockRequest, StockRequestStatus, UserAccount,
};
use stockdesk_client::{AuthSession, Backend, ClientError, ClientResult};
use stockdesk_core::{Money, ProductId, StockRequestId};

/// Backend double that only knows stock requests.
#[derive(Default)]
struct RequestDesk {
    requests: Mutex<Vec<StockRequest>>,
    updates: AtomicUsize,
}

impl RequestDesk {
    fn unsupported<T>() -> ClientResult<T> {
        Err(ClientError::Invalid("unsupported by fake".to_string()))
    }
}

#[async_trait]
impl Backend for RequestDesk {
    async fn login(&self, _email: &str, _password: &str) -> ClientResult<AuthSession> {
        Self::unsupported()
    }

    async fn register(&self, _user: &NewUser) -> ClientResult<UserAccount> {
        Self::unsupported()
    }

    async fn change_password(&self, _change: &PasswordChange) -> ClientResult<()> {
        Self::unsupported()
    }

    async fn list_products(&self) -> ClientResult<Vec<ProductRecord>> {
        Self::unsupported()
    }

    async fn create_product(&self, _product: &NewProduct) -> ClientResult<ProductRecord> {
        Self::unsupported()
    }

    async fn update_quantity(&self, _id: &ProductId, _quantity: u32) -> ClientResult<ProductRecord> {
        Self::unsupported()
    }

    async fn low_stock_products(&self) -> ClientResult<Vec<ProductRecord>> {
        Self::unsupported()
    }

    async fn create_bill(&self, _bill: &NewBill) -> ClientResult<Bill> {
        Self::unsupported()
    }

    async fn list_bills(&self) -> ClientResult<Vec<Bill>> {
        Self::unsupported()
    }

    async fn bills_in_range(&self, _range: BillRange) -> ClientResult<Vec<Bill>> {
        Self::unsupported()
    }

    async fn create_stock_request(&self, request: &NewStockRequest) -> ClientResult<StockRequest> {
        let mut requests = self.requests.lock().unwrap();
        let created = StockRequest {
            id: StockRequestId::new(format!("R{}", requests.len() + 1)),
            product_id: request.product_id.clone(),
            product_name: request.product_name.clone(),
            quantity: request.quantity,
            status: StockRequestStatus::Pending,
            requested_by: Some("staff@shop.test".to_string()),
            created_at: None,
        };
        requests.push(created.clone());
        Ok(created)
    }

    async fn list_stock_requests(&self) -> ClientResult<Vec<StockRequest>> {
        Ok(self.requests.lock().unwrap().clone())
    }

    async fn update_stock_request(
        &self,
        id: &StockRequestId,
        status: StockRequestStatus,
    ) -> ClientResult<StockRequest> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| ClientError::Api {
                status: 404,
                message: "Request not found".to_string(),
            })?;
        request.status = status;
        Ok(request.clone())
    }
}

fn webcam() -> ProductRecord {
    ProductRecord {
        id: ProductId::new("WC-505"),
        name: "1080p Webcam".to_string(),
        category: "Electronics".to_string(),
        price: Money::from_major(45),
        quantity: 5,
        min_stock_level: 10,
    }
}

#[tokio::test]
async fn submitted_request_comes_back_pending() {
    let desk = RequestDesk::default();

    let request = NewStockRequest::for_product(&webcam(), 20).unwrap();
    let created = submit_request(&desk, request).await.unwrap();

    assert_eq!(created.product_id, ProductId::new("WC-505"));
    assert_eq!(created.product_name, "1080p Webcam");
    assert_eq!(created.quantity, 20);
    assert!(created.status.is_pending());

    let listed = desk.list_stock_requests().await.unwrap();
    assert_eq!(find(&listed, &created.id), Some(&created));
}

#[tokio::test]
async fn pending_request_is_decided_once() {
    let desk = RequestDesk::default();
    let created = submit_request(&desk, NewStockRequest::for_product(&webcam(), 3).unwrap())
        .await
        .unwrap();

    let approved = decide(&desk, &created, StockRequestStatus::Approved).await.unwrap();
    assert_eq!(approved.status, StockRequestStatus::Approved);
    assert_eq!(desk.updates.load(Ordering::SeqCst), 1);

    let err = decide(&desk, &approved, StockRequestStatus::Declined).await.unwrap_err();
    assert!(matches!(err, ClientError::Invalid(_)));
    // Refused locally: the backend never saw the second decision.
    assert_eq!(desk.updates.load(Ordering::SeqCst), 1);
    let listed = desk.list_stock_requests().await.unwrap();
    assert_eq!(listed[0].status, StockRequestStatus::Approved);
}

#[tokio::test]
async fn pending_lists_only_undecided_requests() {
    let desk = RequestDesk::default();
    for quantity in [5, 10, 15] {
        submit_request(&desk, NewStockRequest::for_product(&webcam(), quantity).unwrap())
            .await
            .unwrap();
    }
    let listed = desk.list_stock_requests().await.unwrap();
    decide(&desk, &listed[1], StockRequestStatus::Declined).await.unwrap();

    let listed = desk.list_stock_requests().await.unwrap();
    let open: Vec<u32> = pending(&listed).map(|r| r.quantity).collect();

    assert_eq!(open, vec![5, 15]);
    assert!(find(&listed, &StockRequestId::new("R9")).is_none());
}
