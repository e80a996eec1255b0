//! Command handlers, one module per command group.

pub mod config_cmd;
pub mod demo;
pub mod list;
pub mod login;
pub mod staff;
pub mod util;
pub mod watch;

use passline_core::{Hub, Surfaces};

use crate::cli::{Command, GlobalOpts, ListOnly};
use crate::config;
use crate::error::CliError;

/// Run a command that reads or writes the store without mounting a view.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let hub = Hub::connect(&resolved.sync, Surfaces::default())
        .map_err(|e| CliError::from(e).for_profile(&resolved.name))?;

    let result = match cmd {
        Command::Orders(args) => list::orders(args.command, &hub, global).await,
        Command::Tables(args) => match args.command {
            ListOnly::List => list::tables(&hub, global).await,
        },
        Command::Invoices(args) => list::invoices(args.command, &hub, global).await,
        Command::Scans(args) => match args.command {
            ListOnly::List => list::scans(&hub, global).await,
        },
        Command::Staff(args) => staff::handle(args.command, &hub, global).await,
        other => Err(CliError::Internal(format!("{other:?} does not use a store connection"))),
    };
    result.map_err(|e| e.for_profile(&resolved.name))
}
