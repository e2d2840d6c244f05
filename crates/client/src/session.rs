//! Billing session: one reconciler per counter, behind a request queue.
//!
//! Camera, keyboard and remote scanners all hold a [`SessionHandle`] and
//! submit through the same bounded queue. A single task owns the
//! [`ScanReconciler`] and applies requests strictly in arrival order, so the
//! reconciler itself never needs a lock.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use stockdesk_billing::event::{
    CartCleared, CheckedOut, ItemScanned, LineRemoved, Resynced, ScanRejected,
};
use stockdesk_billing::{
    BillingEvent, CartLine, CartMutation, CartSnapshot, Clock, ProductSnapshot, ResyncReport,
    ScanError, ScanEvent, ScanReconciler, ScanSource,
};
use stockdesk_core::{BillId, ProductId, SessionId};
use stockdesk_events::EventBus;

use crate::backend::{Backend, fetch_snapshot};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::remote::RemoteScan;
use crate::types::{Bill, NewBill};

/// Accepted scans kept for display.
pub const HISTORY_LIMIT: usize = 10;

/// One accepted scan, for the "recent scans" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub barcode: String,
    pub product_name: String,
    pub source: ScanSource,
    pub at: DateTime<Utc>,
}

type Respond<T> = oneshot::Sender<T>;

#[derive(Debug)]
enum SessionRequest {
    Scan {
        event: ScanEvent,
        respond_to: Respond<Result<Option<CartMutation>, ScanError>>,
    },
    RemoveLine {
        product_id: ProductId,
        respond_to: Respond<ClientResult<Option<CartLine>>>,
    },
    ClearCart {
        respond_to: Respond<ClientResult<Vec<CartLine>>>,
    },
    Checkout {
        respond_to: Respond<ClientResult<CartSnapshot>>,
    },
    Settle {
        sold: CartSnapshot,
        bill_id: Option<BillId>,
        /// `None` when the post-sale product fetch failed.
        products: Option<Vec<ProductSnapshot>>,
        respond_to: Respond<Option<ResyncReport>>,
    },
    /// The bill was not recorded; the cart opens up again.
    Abandon {
        products: Option<Vec<ProductSnapshot>>,
    },
    Resync {
        products: Vec<ProductSnapshot>,
        respond_to: Respond<ResyncReport>,
    },
    Cart {
        respond_to: Respond<CartSnapshot>,
    },
    History {
        respond_to: Respond<Vec<ScanRecord>>,
    },
    Close,
}

/// The task side of a billing session.
pub struct BillingSession<E> {
    id: SessionId,
    reconciler: ScanReconciler,
    history: VecDeque<ScanRecord>,
    /// Lines submitted as a bill that the backend has not answered yet.
    in_flight: Option<CartSnapshot>,
    bus: E,
}

impl<E> BillingSession<E>
where
    E: EventBus<BillingEvent> + 'static,
{
    /// Spawn the session task on the current tokio runtime.
    ///
    /// The task stops on [`SessionHandle::close`] or once every handle is
    /// dropped.
    pub fn spawn(
        reconciler: ScanReconciler,
        bus: E,
        clock: Arc<dyn Clock>,
        queue_capacity: usize,
    ) -> SessionHandle {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let id = SessionId::new();
        let session = Self {
            id,
            reconciler,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            in_flight: None,
            bus,
        };
        tokio::spawn(session.run(receiver));

        SessionHandle { id, sender, clock }
    }

    /// Fetch the product list and start a session on it.
    pub async fn open<B>(
        backend: &B,
        config: &ClientConfig,
        bus: E,
        clock: Arc<dyn Clock>,
    ) -> ClientResult<SessionHandle>
    where
        B: Backend + ?Sized,
    {
        let products = fetch_snapshot(backend).await?;
        let mut reconciler = ScanReconciler::with_cooldown(config.scan_cooldown);
        reconciler.initialize(products);
        Ok(Self::spawn(reconciler, bus, clock, config.queue_capacity))
    }

    async fn run(mut self, mut receiver: mpsc::Receiver<SessionRequest>) {
        tracing::info!(session_id = %self.id, "billing session started");

        while let Some(request) = receiver.recv().await {
            if matches!(request, SessionRequest::Close) {
                break;
            }
            self.handle(request);
        }

        tracing::info!(session_id = %self.id, "billing session closed");
    }

    fn handle(&mut self, request: SessionRequest) {
        match request {
            SessionRequest::Scan { event, respond_to } => {
                let result = self.scan(&event);
                let _ = respond_to.send(result);
            }
            SessionRequest::RemoveLine {
                product_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.remove_line(&product_id));
            }
            SessionRequest::ClearCart { respond_to } => {
                let _ = respond_to.send(self.clear_cart());
            }
            SessionRequest::Checkout { respond_to } => {
                let started = self.begin_checkout();
                let opened = started.is_ok();
                // Nobody is left to submit the bill.
                if respond_to.send(started).is_err() && opened {
                    self.in_flight = None;
                }
            }
            SessionRequest::Cart { respond_to } => {
                let _ = respond_to.send(self.reconciler.checkout());
            }
            SessionRequest::Settle {
                sold,
                bill_id,
                products,
                respond_to,
            } => {
                self.in_flight = None;
                let report = match products {
                    Some(products) => Some(self.reconciler.settle(&sold, products)),
                    None => {
                        self.reconciler.release_sold(&sold);
                        None
                    }
                };
                self.publish(BillingEvent::CheckedOut(CheckedOut {
                    session_id: self.id,
                    bill_id,
                    total: sold.total,
                    occurred_at: Utc::now(),
                }));
                if let Some(report) = &report {
                    self.publish_resynced(report);
                }
                let _ = respond_to.send(report);
            }
            SessionRequest::Abandon { products } => {
                self.in_flight = None;
                if let Some(products) = products {
                    let report = self.reconciler.initialize(products);
                    self.publish_resynced(&report);
                }
            }
            SessionRequest::Resync {
                products,
                respond_to,
            } => {
                let report = self.reconciler.initialize(products);
                self.publish_resynced(&report);
                let _ = respond_to.send(report);
            }
            SessionRequest::History { respond_to } => {
                let _ = respond_to.send(self.history.iter().cloned().collect());
            }
            SessionRequest::Close => {}
        }
    }

    fn begin_checkout(&mut self) -> ClientResult<CartSnapshot> {
        if self.in_flight.is_some() {
            return Err(ClientError::CheckoutInProgress);
        }
        let sold = self.reconciler.checkout();
        if !sold.is_empty() {
            self.in_flight = Some(sold.clone());
        }
        Ok(sold)
    }

    /// Lines being billed stay put until the backend answers.
    fn remove_line(&mut self, product_id: &ProductId) -> ClientResult<Option<CartLine>> {
        if let Some(sold) = &self.in_flight {
            if sold.quantity_of(product_id) > 0 {
                return Err(ClientError::CheckoutInProgress);
            }
        }
        let removed = self.reconciler.remove_line(product_id);
        if let Some(line) = &removed {
            self.publish(BillingEvent::LineRemoved(LineRemoved {
                session_id: self.id,
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                total: self.reconciler.total(),
                occurred_at: Utc::now(),
            }));
        }
        Ok(removed)
    }

    fn clear_cart(&mut self) -> ClientResult<Vec<CartLine>> {
        if self.in_flight.is_some() {
            return Err(ClientError::CheckoutInProgress);
        }
        let lines = self.reconciler.clear_cart();
        self.publish(BillingEvent::CartCleared(CartCleared {
            session_id: self.id,
            lines: lines.len(),
            occurred_at: Utc::now(),
        }));
        Ok(lines)
    }

    fn scan(&mut self, event: &ScanEvent) -> Result<Option<CartMutation>, ScanError> {
        match self.reconciler.submit_scan(event) {
            Ok(Some(mutation)) => {
                self.history.push_front(ScanRecord {
                    barcode: mutation.line.product_id.to_string(),
                    product_name: mutation.line.name.clone(),
                    source: event.source,
                    at: Utc::now(),
                });
                self.history.truncate(HISTORY_LIMIT);

                self.publish(BillingEvent::ItemScanned(ItemScanned {
                    session_id: self.id,
                    product_id: mutation.line.product_id.clone(),
                    source: event.source,
                    quantity: mutation.line.quantity,
                    total: mutation.total,
                    occurred_at: Utc::now(),
                }));
                Ok(Some(mutation))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::info!(
                    session_id = %self.id,
                    barcode = %event.barcode,
                    source = %event.source,
                    error = %e,
                    "scan rejected"
                );
                self.publish(BillingEvent::ScanRejected(ScanRejected {
                    session_id: self.id,
                    barcode: event.barcode.clone(),
                    source: event.source,
                    reason: e.user_message(),
                    occurred_at: Utc::now(),
                }));
                Err(e)
            }
        }
    }

    fn publish_resynced(&self, report: &ResyncReport) {
        self.publish(BillingEvent::Resynced(Resynced {
            session_id: self.id,
            products: report.products,
            shortfalls: report.shortfalls.clone(),
            missing: report.missing.clone(),
            occurred_at: Utc::now(),
        }));
    }

    fn publish(&self, event: BillingEvent) {
        if let Err(e) = self.bus.publish(event) {
            tracing::warn!(session_id = %self.id, error = ?e, "failed to publish billing event");
        }
    }
}

/// Cheap, clonable entry point into a running billing session.
///
/// Scans are stamped with the handle's clock when submitted, not when the
/// session gets to them, so queueing delay never affects the cooldown.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    sender: mpsc::Sender<SessionRequest>,
    clock: Arc<dyn Clock>,
}

impl core::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn call<T>(&self, make: impl FnOnce(Respond<T>) -> SessionRequest) -> ClientResult<T> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| ClientError::SessionClosed)?;
        response.await.map_err(|_| ClientError::SessionClosed)
    }

    /// Submit one scan. `Ok(None)` means it was a suppressed repeat.
    pub async fn scan(
        &self,
        barcode: impl Into<String>,
        source: ScanSource,
    ) -> ClientResult<Option<CartMutation>> {
        let event = ScanEvent::new(barcode, source, self.clock.now());
        let result = self
            .call(|respond_to| SessionRequest::Scan { event, respond_to })
            .await?;
        Ok(result?)
    }

    /// Decode a relayed `barcode-scanned` payload and submit it.
    pub async fn scan_remote(&self, payload: &str) -> ClientResult<Option<CartMutation>> {
        let remote = RemoteScan::decode(payload)?;
        self.scan(remote.barcode, ScanSource::Remote).await
    }

    /// Refused with [`ClientError::CheckoutInProgress`] while the line is
    /// part of a bill awaiting the backend.
    pub async fn remove_line(&self, product_id: &ProductId) -> ClientResult<Option<CartLine>> {
        let product_id = product_id.clone();
        self.call(|respond_to| SessionRequest::RemoveLine {
            product_id,
            respond_to,
        })
        .await?
    }

    /// Refused with [`ClientError::CheckoutInProgress`] while a bill awaits
    /// the backend.
    pub async fn clear_cart(&self) -> ClientResult<Vec<CartLine>> {
        self.call(|respond_to| SessionRequest::ClearCart { respond_to })
            .await?
    }

    pub async fn cart(&self) -> ClientResult<CartSnapshot> {
        self.call(|respond_to| SessionRequest::Cart { respond_to })
            .await
    }

    /// Most recent accepted scans, newest first.
    pub async fn history(&self) -> ClientResult<Vec<ScanRecord>> {
        self.call(|respond_to| SessionRequest::History { respond_to })
            .await
    }

    /// Replace the stock snapshot with the backend's current product list.
    pub async fn resync<B>(&self, backend: &B) -> ClientResult<ResyncReport>
    where
        B: Backend + ?Sized,
    {
        let products = fetch_snapshot(backend).await?;
        self.call(|respond_to| SessionRequest::Resync {
            products,
            respond_to,
        })
        .await
    }

    /// Submit the open cart as a bill.
    ///
    /// On success the sold lines leave the cart and the snapshot is resynced.
    /// When the backend refuses the bill for stock or a missing product, the
    /// snapshot is resynced and the cart is kept so the cashier can adjust
    /// it. Any other failure leaves everything as is.
    ///
    /// Only one checkout runs at a time per session; a second one, from any
    /// handle, gets [`ClientError::CheckoutInProgress`].
    pub async fn checkout<B>(&self, backend: &B) -> ClientResult<Bill>
    where
        B: Backend + ?Sized,
    {
        let sold = self
            .call(|respond_to| SessionRequest::Checkout { respond_to })
            .await??;
        if sold.is_empty() {
            return Err(ClientError::EmptyCart);
        }
        let mut pending = PendingCheckout::new(self);

        let bill = match backend.create_bill(&NewBill::from_snapshot(&sold)).await {
            Ok(bill) => bill,
            Err(e) if e.needs_resync() => {
                tracing::warn!(session_id = %self.id, error = %e, "bill refused; resyncing stock");
                let products = match fetch_snapshot(backend).await {
                    Ok(products) => Some(products),
                    Err(resync_err) => {
                        tracing::warn!(
                            session_id = %self.id,
                            error = %resync_err,
                            "resync after refused bill failed"
                        );
                        None
                    }
                };
                let _ = pending.close(SessionRequest::Abandon { products }).await;
                return Err(e);
            }
            Err(e) => {
                let _ = pending.close(SessionRequest::Abandon { products: None }).await;
                return Err(e);
            }
        };
        pending.billed(sold.clone(), bill.id.clone());

        let products = match fetch_snapshot(backend).await {
            Ok(products) => Some(products),
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "resync after checkout failed");
                None
            }
        };

        let (respond_to, settled) = oneshot::channel();
        pending
            .close(SessionRequest::Settle {
                sold,
                bill_id: Some(bill.id.clone()),
                products,
                respond_to,
            })
            .await?;
        settled.await.map_err(|_| ClientError::SessionClosed)?;

        tracing::info!(
            session_id = %self.id,
            bill_id = %bill.id,
            total = %bill.total,
            "checkout complete"
        );
        Ok(bill)
    }

    /// Stop the session task. Pending requests queued before this one are
    /// still answered.
    pub async fn close(&self) {
        let _ = self.sender.send(SessionRequest::Close).await;
    }
}

enum CheckoutStage {
    Submitting,
    Billed { sold: CartSnapshot, bill_id: BillId },
    Closed,
}

/// Ends a checkout in the session even if its future is dropped: a bill
/// that was never confirmed reopens the cart, a confirmed one is settled.
struct PendingCheckout<'a> {
    handle: &'a SessionHandle,
    stage: CheckoutStage,
}

impl<'a> PendingCheckout<'a> {
    fn new(handle: &'a SessionHandle) -> Self {
        Self {
            handle,
            stage: CheckoutStage::Submitting,
        }
    }

    fn billed(&mut self, sold: CartSnapshot, bill_id: BillId) {
        self.stage = CheckoutStage::Billed { sold, bill_id };
    }

    async fn close(&mut self, request: SessionRequest) -> ClientResult<()> {
        let permit = self
            .handle
            .sender
            .reserve()
            .await
            .map_err(|_| ClientError::SessionClosed)?;
        self.stage = CheckoutStage::Closed;
        permit.send(request);
        Ok(())
    }
}

impl Drop for PendingCheckout<'_> {
    fn drop(&mut self) {
        let request = match std::mem::replace(&mut self.stage, CheckoutStage::Closed) {
            CheckoutStage::Closed => return,
            CheckoutStage::Submitting => SessionRequest::Abandon { products: None },
            CheckoutStage::Billed { sold, bill_id } => SessionRequest::Settle {
                sold,
                bill_id: Some(bill_id),
                products: None,
                respond_to: oneshot::channel().0,
            },
        };
        if let Err(e) = self.handle.sender.try_send(request) {
            tracing::warn!(
                session_id = %self.handle.id,
                error = %e,
                "could not close out an interrupted checkout"
            );
        }
    }
}
