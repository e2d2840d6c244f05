//! HTTP implementation of [`Backend`] over `reqwest`.

use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use stockdesk_core::{ProductId, StockRequestId};

use crate::auth::AuthSession;
use crate::backend::Backend;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, GENERIC_ERROR_MESSAGE};
use crate::types::{
    Bill, BillRange, ErrorBody, LoginRequest, NewBill, NewProduct, NewStockRequest, NewUser,
    PasswordChange, ProductRecord, QuantityUpdate, StockRequest, StockRequestStatus,
    StockRequestUpdate, UserAccount,
};

/// Client for the inventory/billing REST API.
///
/// Every request carries the bearer token when one is set; a successful
/// login replaces it.
#[derive(Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            token: RwLock::new(None),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let backend = Self::new(config.api_url.clone());
        if let Some(token) = &config.token {
            backend.set_token(Some(token.clone()));
        }
        backend
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut current) = self.token.write() {
            *current = token;
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> ClientResult<Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());

        tracing::debug!(status = status.as_u16(), %message, "backend returned an error");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let resp = self.send(req).await?;
        resp.json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }
}

fn is_stock_refusal(status: u16) -> bool {
    status == StatusCode::BAD_REQUEST.as_u16() || status == StatusCode::CONFLICT.as_u16()
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let session: AuthSession = self
            .send_json(
                self.request(Method::POST, "/users/login")
                    .json(&LoginRequest { email, password }),
            )
            .await?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    async fn register(&self, user: &NewUser) -> ClientResult<UserAccount> {
        self.send_json(self.request(Method::POST, "/users/register").json(user))
            .await
    }

    async fn change_password(&self, change: &PasswordChange) -> ClientResult<()> {
        self.send(self.request(Method::PUT, "/users/change-password").json(change))
            .await?;
        Ok(())
    }

    async fn list_products(&self) -> ClientResult<Vec<ProductRecord>> {
        self.send_json(self.request(Method::GET, "/products")).await
    }

    async fn create_product(&self, product: &NewProduct) -> ClientResult<ProductRecord> {
        product.validate()?;
        self.send_json(self.request(Method::POST, "/products").json(product))
            .await
    }

    async fn update_quantity(&self, id: &ProductId, quantity: u32) -> ClientResult<ProductRecord> {
        let path = format!("/products/{id}/quantity");
        self.send_json(
            self.request(Method::PUT, &path)
                .json(&QuantityUpdate { quantity }),
        )
        .await
    }

    async fn low_stock_products(&self) -> ClientResult<Vec<ProductRecord>> {
        self.send_json(self.request(Method::GET, "/products/low-stock"))
            .await
    }

    async fn create_bill(&self, bill: &NewBill) -> ClientResult<Bill> {
        match self
            .send_json(self.request(Method::POST, "/bills").json(bill))
            .await
        {
            Err(ClientError::Api { status, message }) if is_stock_refusal(status) => {
                Err(ClientError::StockConflict(message))
            }
            other => other,
        }
    }

    async fn list_bills(&self) -> ClientResult<Vec<Bill>> {
        self.send_json(self.request(Method::GET, "/bills")).await
    }

    async fn bills_in_range(&self, range: BillRange) -> ClientResult<Vec<Bill>> {
        self.send_json(self.request(Method::GET, "/bills/range").query(&range))
            .await
    }

    async fn create_stock_request(&self, request: &NewStockRequest) -> ClientResult<StockRequest> {
        self.send_json(self.request(Method::POST, "/stock-requests").json(request))
            .await
    }

    async fn list_stock_requests(&self) -> ClientResult<Vec<StockRequest>> {
        self.send_json(self.request(Method::GET, "/stock-requests"))
            .await
    }

    async fn update_stock_request(
        &self,
        id: &StockRequestId,
        status: StockRequestStatus,
    ) -> ClientResult<StockRequest> {
        let path = format!("/stock-requests/{id}");
        self.send_json(
            self.request(Method::PUT, &path)
                .json(&StockRequestUpdate { status }),
        )
        .await
    }
}
