//! Collection listings: orders, tables, invoices, scans.

use std::sync::Arc;
use std::time::Duration;

use tabled::Tabled;

use passline_core::stream::{InvoiceFilter, OrderFilter};
use passline_core::{Hub, Invoice, Order, ScanEvent, Table};

use crate::cli::{GlobalOpts, InvoicesCommand, OrdersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row types ─────────────────────────────────────────────────

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Items")]
    items: u64,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Placed")]
    placed: String,
}

#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Table")]
    name: String,
    #[tabled(rename = "Seats")]
    seats: String,
    #[tabled(rename = "Occupied")]
    occupied: String,
}

#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Order")]
    order: String,
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Paid")]
    paid: String,
}

#[derive(Tabled)]
struct ScanRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Device")]
    device: String,
}

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v:.2}"))
}

fn time(value: Option<chrono::DateTime<chrono::Utc>>) -> String {
    value.map_or_else(
        || "-".into(),
        |t| t.with_timezone(&chrono::Local).format("%H:%M").to_string(),
    )
}

fn order_row(o: &Arc<Order>, color: bool) -> OrderRow {
    OrderRow {
        id: o.id.to_string(),
        table: output::or_dash(o.table.as_deref()),
        items: o.item_count(),
        status: output::order_status(o.status, color),
        total: money(o.total),
        placed: time(o.created_at),
    }
}

fn invoice_row(i: &Arc<Invoice>, color: bool) -> InvoiceRow {
    InvoiceRow {
        id: i.id.to_string(),
        order: output::or_dash(i.order_id.as_ref()),
        table: output::or_dash(i.table.as_deref()),
        total: money(i.total),
        status: output::invoice_status(i.status, color),
        paid: time(i.paid_at),
    }
}

fn timeout(global: &GlobalOpts) -> Duration {
    Duration::from_secs(global.timeout)
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn orders(cmd: OrdersCommand, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let OrdersCommand::List { open, status, table } = cmd;
    let filter = match (open, status) {
        (true, _) => OrderFilter::Open,
        (false, Some(status)) => OrderFilter::ByStatus(status),
        (false, None) => OrderFilter::All,
    };
    let at_table = table.map(OrderFilter::ByTable);

    let snap = util::load(hub.orders(), timeout(global)).await?;
    let orders: Vec<Arc<Order>> = snap
        .iter()
        .filter(|o| filter.matches(o) && at_table.as_ref().is_none_or(|f| f.matches(o)))
        .cloned()
        .collect();

    let color = output::should_color(&global.color);
    let out = output::render_list(&global.output, &orders, |o| order_row(o, color), |o| o.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn tables(hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let snap = util::load(hub.tables(), timeout(global)).await?;
    let tables = snap.to_vec();
    let out = output::render_list(
        &global.output,
        &tables,
        |t: &Arc<Table>| TableRow {
            id: t.id.to_string(),
            name: t.display_name(),
            seats: output::or_dash(t.seats),
            occupied: if t.occupied { "yes" } else { "no" }.into(),
        },
        |t| t.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn invoices(cmd: InvoicesCommand, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let InvoicesCommand::List { unpaid, status } = cmd;
    let filter = match (unpaid, status) {
        (true, _) => InvoiceFilter::Unpaid,
        (false, Some(status)) => InvoiceFilter::ByStatus(status),
        (false, None) => InvoiceFilter::All,
    };

    let snap = util::load(hub.invoices(), timeout(global)).await?;
    let invoices: Vec<Arc<Invoice>> = snap.iter().filter(|i| filter.matches(i)).cloned().collect();

    let color = output::should_color(&global.color);
    let out = output::render_list(&global.output, &invoices, |i| invoice_row(i, color), |i| i.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn scans(hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let snap = util::load(hub.scans(), timeout(global)).await?;
    let scans = snap.to_vec();
    let out = output::render_list(
        &global.output,
        &scans,
        |s: &Arc<ScanEvent>| ScanRow {
            id: s.id.to_string(),
            table: output::or_dash(s.table.as_deref()),
            when: time(s.created_at),
            device: output::or_dash(s.user_agent.as_deref()),
        },
        |s| s.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
