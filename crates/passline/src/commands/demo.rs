//! `passline demo`: a short scripted service against an in-process store.
//!
//! A kitchen view and a server view are mounted at once over shared stores,
//! so each notification below fires once even though two views watch orders.

use std::sync::Arc;
use std::time::Duration;

use owo_colors::OwoColorize;
use serde_json::{Value, json};
use tokio::time::sleep;

use passline_core::feed::FeedLogEntry;
use passline_core::{
    Collection, Hub, NotificationDispatcher, NotificationSettings, RawDocument, ScriptedSource,
    SubscriptionCoordinator, ViewRole,
};

use crate::cli::{DemoArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;
use crate::surfaces;

use super::watch::{self, LogStyle};

fn doc(value: Value) -> Result<RawDocument, CliError> {
    serde_json::from_value(value).map_err(|e| CliError::Internal(format!("bad demo document: {e}")))
}

fn order(id: &str, table: &str, status: &str, items: &[(&str, u32)]) -> Result<RawDocument, CliError> {
    let items: Vec<Value> = items
        .iter()
        .map(|(name, quantity)| json!({ "name": name, "quantity": quantity }))
        .collect();
    doc(json!({
        "id": id,
        "table": table,
        "status": status,
        "items": items,
        "created_at": chrono::Utc::now(),
    }))
}

fn seed(source: &ScriptedSource) -> Result<(), CliError> {
    let tables = (1..=6)
        .map(|n| doc(json!({ "id": format!("table-{n}"), "number": n, "seats": 4 })))
        .collect::<Result<Vec<_>, _>>()?;
    source.replace(Collection::Tables, tables);
    source.upsert(
        Collection::Orders,
        order("order-100201", "2", "preparing", &[("risotto", 1), ("salad", 2)])?,
    );
    Ok(())
}

struct Step {
    narration: &'static str,
    run: fn(&ScriptedSource) -> Result<(), CliError>,
}

fn steps() -> Vec<Step> {
    vec![
        Step {
            narration: "table 4 places an order",
            run: |s| {
                s.upsert(
                    Collection::Orders,
                    order("order-100202", "4", "pending", &[("soup", 2), ("bread", 1)])?,
                );
                Ok(())
            },
        },
        Step {
            narration: "kitchen starts on table 4",
            run: |s| {
                s.upsert(
                    Collection::Orders,
                    order("order-100202", "4", "preparing", &[("soup", 2), ("bread", 1)])?,
                );
                Ok(())
            },
        },
        Step {
            narration: "table 2 is ready",
            run: |s| {
                s.upsert(
                    Collection::Orders,
                    order("order-100201", "2", "ready", &[("risotto", 1), ("salad", 2)])?,
                );
                Ok(())
            },
        },
        Step {
            narration: "table 4 is ready",
            run: |s| {
                s.upsert(
                    Collection::Orders,
                    order("order-100202", "4", "ready", &[("soup", 2), ("bread", 1)])?,
                );
                Ok(())
            },
        },
        Step {
            narration: "table 2 is served and billed",
            run: |s| {
                s.upsert(
                    Collection::Orders,
                    order("order-100201", "2", "served", &[("risotto", 1), ("salad", 2)])?,
                );
                s.upsert(
                    Collection::Invoices,
                    doc(json!({
                        "id": "invoice-3001",
                        "order_id": "order-100201",
                        "table": "2",
                        "total": 38.5,
                        "status": "pending",
                    }))?,
                );
                Ok(())
            },
        },
    ]
}

pub async fn handle(args: DemoArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let step = Duration::from_millis(args.step_ms);
    let style = LogStyle {
        color,
        quiet: global.quiet,
    };

    let source = ScriptedSource::new();
    seed(&source)?;

    let surfaces = surfaces::terminal(false, true, color);
    let dispatcher = NotificationDispatcher::new(
        surfaces.audio,
        surfaces.toasts,
        surfaces.platform,
        NotificationSettings::default(),
    );
    let hub = Arc::new(Hub::scripted(source.clone(), Arc::new(dispatcher))?);
    let coordinator = SubscriptionCoordinator::new(hub);

    let narrate = |text: &str| {
        if global.quiet {
            return;
        }
        if color {
            println!("{} {}", "»".magenta(), text.italic());
        } else {
            println!("> {text}");
        }
    };

    let kitchen = coordinator.clone();
    let kitchen_view = tokio::spawn(async move {
        let _mount = kitchen.mount_role(ViewRole::Kitchen).await;
        std::future::pending::<()>().await;
    });

    let script = async {
        sleep(step).await;
        for Step { narration, run } in steps() {
            narrate(narration);
            if let Err(e) = run(&source) {
                tracing::warn!(error = %e, "demo step failed");
            }
            sleep(step).await;
        }
    };
    watch::run_view(&coordinator, ViewRole::Server.collections(), style, script).await;
    kitchen_view.abort();
    // Let the aborted task drop its mount before reading the log.
    let _ = kitchen_view.await;

    if !global.quiet {
        let log = source.log();
        let opened = log.iter().filter(|e| matches!(e, FeedLogEntry::Opened(_))).count();
        let closed = log.iter().filter(|e| matches!(e, FeedLogEntry::Closed(_))).count();
        narrate(&format!("{opened} live queries opened, {closed} closed"));
    }
    Ok(())
}
