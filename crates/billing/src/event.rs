use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockdesk_core::{BillId, Money, ProductId, SessionId};
use stockdesk_events::Event;

use crate::reconciler::Shortfall;
use crate::scan::ScanSource;

/// Event: ItemScanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemScanned {
    pub session_id: SessionId,
    pub product_id: ProductId,
    pub source: ScanSource,
    /// Line quantity after the scan.
    pub quantity: u32,
    pub total: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ScanRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRejected {
    pub session_id: SessionId,
    pub barcode: String,
    pub source: ScanSource,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRemoved {
    pub session_id: SessionId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub total: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CartCleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCleared {
    pub session_id: SessionId,
    pub lines: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CheckedOut (backend accepted the bill).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckedOut {
    pub session_id: SessionId,
    pub bill_id: Option<BillId>,
    pub total: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: Resynced (snapshot replaced from the backend).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resynced {
    pub session_id: SessionId,
    pub products: usize,
    pub shortfalls: Vec<Shortfall>,
    pub missing: Vec<ProductId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingEvent {
    ItemScanned(ItemScanned),
    ScanRejected(ScanRejected),
    LineRemoved(LineRemoved),
    CartCleared(CartCleared),
    CheckedOut(CheckedOut),
    Resynced(Resynced),
}

impl BillingEvent {
    pub fn session_id(&self) -> SessionId {
        match self {
            BillingEvent::ItemScanned(e) => e.session_id,
            BillingEvent::ScanRejected(e) => e.session_id,
            BillingEvent::LineRemoved(e) => e.session_id,
            BillingEvent::CartCleared(e) => e.session_id,
            BillingEvent::CheckedOut(e) => e.session_id,
            BillingEvent::Resynced(e) => e.session_id,
        }
    }
}

impl Event for BillingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BillingEvent::ItemScanned(_) => "billing.cart.item_scanned",
            BillingEvent::ScanRejected(_) => "billing.cart.scan_rejected",
            BillingEvent::LineRemoved(_) => "billing.cart.line_removed",
            BillingEvent::CartCleared(_) => "billing.cart.cleared",
            BillingEvent::CheckedOut(_) => "billing.sale.checked_out",
            BillingEvent::Resynced(_) => "billing.stock.resynced",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BillingEvent::ItemScanned(e) => e.occurred_at,
            BillingEvent::ScanRejected(e) => e.occurred_at,
            BillingEvent::LineRemoved(e) => e.occurred_at,
            BillingEvent::CartCleared(e) => e.occurred_at,
            BillingEvent::CheckedOut(e) => e.occurred_at,
            BillingEvent::Resynced(e) => e.occurred_at,
        }
    }
}
