//! `stockdesk-counter`: a line-oriented billing counter.
//!
//! Each input line is a barcode, or one of `remove <code>`, `remote <json>`,
//! `cart`, `history`, `resync`, `clear`, `checkout`, `quit`.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use stockdesk_billing::{BillingEvent, CartMutation, CartSnapshot, ScanSource, SystemClock};
use stockdesk_client::reporting::{format_bill_date, format_currency};
use stockdesk_client::{
    BillingSession, ClientConfig, ClientError, ClientResult, Currency, HttpBackend, SessionHandle,
};
use stockdesk_core::ProductId;
use stockdesk_events::{Event, EventBus, InMemoryEventBus};
use stockdesk_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockdesk_observability::init(LogFormat::from_env());

    let config = ClientConfig::from_env();
    if config.token.is_none() {
        tracing::warn!("STOCKDESK_TOKEN not set; backend calls are unauthenticated");
    }
    let backend = HttpBackend::from_config(&config);

    let bus = Arc::new(InMemoryEventBus::<BillingEvent>::new());
    let events = bus.subscribe();
    tokio::task::spawn_blocking(move || {
        while let Ok(event) = events.recv() {
            tracing::debug!(
                event_type = event.event_type(),
                session_id = %event.session_id(),
                "billing event"
            );
        }
    });

    let session = BillingSession::open(&backend, &config, bus, Arc::new(SystemClock))
        .await
        .with_context(|| format!("failed to load products from {}", config.api_url))?;

    println!("Counter ready. Scan or type a product code.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "cart" => print_cart(&session, config.currency).await?,
            "history" => {
                for record in session.history().await? {
                    println!("  {} {} ({})", record.barcode, record.product_name, record.source);
                }
            }
            "resync" => match session.resync(&backend).await {
                Ok(report) if report.is_consistent() => println!("Stock refreshed."),
                Ok(report) => println!(
                    "Stock refreshed; {} line(s) short, {} product(s) gone.",
                    report.shortfalls.len(),
                    report.missing.len()
                ),
                Err(e) => println!("{}", e.user_message()),
            },
            "clear" => match session.clear_cart().await {
                Ok(_) => println!("Cart cleared."),
                Err(ClientError::SessionClosed) => anyhow::bail!("billing session stopped unexpectedly"),
                Err(e) => println!("{}", e.user_message()),
            },
            "remove" => {
                let id = ProductId::new(rest.trim());
                match session.remove_line(&id).await {
                    Ok(Some(line)) => println!("Removed {} x{}", line.name, line.quantity),
                    Ok(None) => println!("{id} is not in the cart."),
                    Err(ClientError::SessionClosed) => {
                        anyhow::bail!("billing session stopped unexpectedly")
                    }
                    Err(e) => println!("{}", e.user_message()),
                }
                print_cart(&session, config.currency).await?;
            }
            "checkout" => match session.checkout(&backend).await {
                Ok(bill) => println!(
                    "Bill {} saved: {} at {}",
                    bill.id,
                    format_currency(bill.total, config.currency),
                    format_bill_date(bill.created_at)
                ),
                Err(e) => println!("{}", e.user_message()),
            },
            "remote" => report_scan(session.scan_remote(rest).await, config.currency)?,
            _ => report_scan(session.scan(line, ScanSource::Manual).await, config.currency)?,
        }
    }

    session.close().await;
    Ok(())
}

fn report_scan(result: ClientResult<Option<CartMutation>>, currency: Currency) -> anyhow::Result<()> {
    match result {
        Ok(Some(mutation)) => {
            println!(
                "+ {} x{}  total {}",
                mutation.line.name,
                mutation.line.quantity,
                format_currency(mutation.total, currency)
            );
        }
        Ok(None) => {}
        Err(ClientError::SessionClosed) => {
            anyhow::bail!("billing session stopped unexpectedly");
        }
        Err(e) => println!("{}", e.user_message()),
    }
    Ok(())
}

async fn print_cart(session: &SessionHandle, currency: Currency) -> anyhow::Result<()> {
    let cart: CartSnapshot = session.cart().await?;
    if cart.is_empty() {
        println!("Cart is empty.");
        return Ok(());
    }
    for line in &cart.lines {
        println!(
            "  {:<24} {:>4} x {:>12} = {:>12}",
            line.name,
            line.quantity,
            format_currency(line.unit_price, currency),
            format_currency(line.line_total(), currency)
        );
    }
    println!("  Total: {}", format_currency(cart.total, currency));
    Ok(())
}
