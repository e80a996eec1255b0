//! `passline watch`: mount a view and print transitions as they happen.

use std::future::Future;
use std::sync::Arc;

use chrono::Local;
use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinSet;

use passline_core::{
    Collection, Entity, EntityStore, Hub, Invoice, Order, ScanEvent, Staff,
    SubscriptionCoordinator, Table, Transition, ViewRole,
};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;
use crate::surfaces;

/// One-line description of an entity for the transition log.
pub trait Headline {
    fn headline(&self) -> String;
}

impl Headline for Order {
    fn headline(&self) -> String {
        self.label()
    }
}

impl Headline for Table {
    fn headline(&self) -> String {
        self.display_name()
    }
}

impl Headline for Invoice {
    fn headline(&self) -> String {
        let table = self.table.as_deref().map(|t| format!("table {t}"));
        let total = self.total.map(|t| format!("{t:.2}"));
        match (table, total) {
            (Some(table), Some(total)) => format!("{table}, {total}"),
            (Some(one), None) | (None, Some(one)) => one,
            (None, None) => format!("invoice {}", self.id.short()),
        }
    }
}

impl Headline for ScanEvent {
    fn headline(&self) -> String {
        self.table
            .as_deref()
            .map_or_else(|| "menu opened".into(), |t| format!("menu opened at table {t}"))
    }
}

impl Headline for Staff {
    fn headline(&self) -> String {
        format!("{} ({})", self.name, self.role)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LogStyle {
    pub color: bool,
    pub quiet: bool,
}

fn print_transition<T: Entity + Headline>(transition: &Transition<T>, style: LogStyle) {
    if style.quiet {
        return;
    }
    let time = Local::now().format("%H:%M:%S");
    let collection = format!("{:<8}", transition.collection);
    let id = transition.entity_id.short();
    let kind = transition.kind.to_string();
    let headline = transition.current.headline();
    if style.color {
        println!(
            "{} {} {} {:<22} {}",
            time.dimmed(),
            collection.cyan(),
            id.dimmed(),
            kind.bold(),
            headline
        );
    } else {
        println!("{time} {collection} {id} {kind:<22} {headline}");
    }
}

fn spawn_printer<T: Entity + Headline>(set: &mut JoinSet<()>, store: &EntityStore<T>, style: LogStyle) {
    let mut rx = store.transitions();
    set.spawn(async move {
        loop {
            match rx.recv().await {
                Ok(transition) => print_transition(&transition, style),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(collection = %T::COLLECTION, skipped, "transition log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Mount `collections`, log their transitions until `until` resolves, then
/// unmount.
pub async fn run_view(
    coordinator: &SubscriptionCoordinator,
    collections: &[Collection],
    style: LogStyle,
    until: impl Future<Output = ()>,
) {
    let hub = coordinator.hub();
    let mut printers = JoinSet::new();
    for collection in collections {
        match collection {
            Collection::Orders => spawn_printer(&mut printers, hub.orders(), style),
            Collection::Tables => spawn_printer(&mut printers, hub.tables(), style),
            Collection::Invoices => spawn_printer(&mut printers, hub.invoices(), style),
            Collection::Scans => spawn_printer(&mut printers, hub.scans(), style),
            Collection::Staff => spawn_printer(&mut printers, hub.staff(), style),
        }
    }

    let mount = coordinator.mount(collections).await;
    until.await;
    mount.unmount();
    printers.abort_all();
}

fn pick_collections(args: &WatchArgs, profile_role: Option<ViewRole>) -> Vec<Collection> {
    if args.collections.is_empty() {
        let role = args.role.or(profile_role).unwrap_or(ViewRole::Kitchen);
        role.collections().to_vec()
    } else {
        let mut picked = Vec::with_capacity(args.collections.len());
        for collection in &args.collections {
            if !picked.contains(collection) {
                picked.push(*collection);
            }
        }
        picked
    }
}

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let collections = pick_collections(&args, resolved.role()?);
    let color = output::should_color(&global.color);
    let settings = &resolved.sync.notifications;

    let surfaces = surfaces::terminal(
        settings.audio && !args.no_bell,
        settings.os_notifications,
        color,
    );
    let hub = Hub::connect(&resolved.sync, surfaces).map_err(|e| CliError::from(e).for_profile(&resolved.name))?;
    let coordinator = SubscriptionCoordinator::new(Arc::new(hub));

    if !global.quiet {
        let names: Vec<_> = collections.iter().map(ToString::to_string).collect();
        eprintln!(
            "watching {} on {} (Ctrl-C to stop)",
            names.join(", "),
            resolved.profile.venue
        );
    }

    let style = LogStyle {
        color,
        quiet: global.quiet,
    };
    run_view(&coordinator, &collections, style, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "could not listen for Ctrl-C");
        }
    })
    .await;
    Ok(())
}
