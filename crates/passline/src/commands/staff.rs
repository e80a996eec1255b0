//! Staff account handlers. Writes go through the store so the local view
//! updates before the next feed event.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value, json};
use tabled::Tabled;

use passline_core::stream::StaffFilter;
use passline_core::{EntityId, Hub, Staff, StaffRole};

use crate::cli::{GlobalOpts, StaffCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct StaffRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Active")]
    active: String,
}

fn staff_row(s: &Arc<Staff>) -> StaffRow {
    StaffRow {
        id: s.id.to_string(),
        name: s.name.clone(),
        role: s.role.to_string(),
        active: if s.active { "yes" } else { "no" }.into(),
    }
}

fn new_staff_fields(name: &str, role: StaffRole, active: bool) -> Result<Map<String, Value>, CliError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::Validation {
            field: "name".into(),
            reason: "must not be empty".into(),
        });
    }
    let mut fields = Map::new();
    fields.insert("name".into(), json!(name));
    fields.insert("role".into(), json!(role));
    fields.insert("active".into(), json!(active));
    Ok(fields)
}

pub async fn handle(cmd: StaffCommand, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let timeout = Duration::from_secs(global.timeout);
    let store = hub.staff();

    match cmd {
        StaffCommand::List { active, role } => {
            let snap = util::load(store, timeout).await?;
            let by_role = role.map(StaffFilter::ByRole);
            let staff: Vec<Arc<Staff>> = snap
                .iter()
                .filter(|s| !active || StaffFilter::Active.matches(s))
                .filter(|s| by_role.as_ref().is_none_or(|f| f.matches(s)))
                .cloned()
                .collect();
            let out = output::render_list(&global.output, &staff, staff_row, |s| s.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StaffCommand::Add { name, role, inactive } => {
            let fields = new_staff_fields(&name, role, !inactive)?;
            let id = store.create(fields).await?;
            tracing::info!(%id, "staff account created");
            let created = json!({ "id": id, "name": name.trim(), "role": role, "active": !inactive });
            let out = output::render_single(
                &global.output,
                &created,
                |_| format!("Created {} ({role}) as {id}", name.trim()),
                |_| id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StaffCommand::Remove { id } => {
            if !util::confirm(&format!("Remove staff account {id}?"), global.yes)? {
                return Ok(());
            }
            let id = EntityId::new(id);
            store.delete(&id).await?;
            if !global.quiet {
                eprintln!("Removed {id}");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_trimmed_and_typed() {
        let fields = new_staff_fields("  Ana ", StaffRole::Kitchen, true).unwrap();
        assert_eq!(fields["name"], "Ana");
        assert_eq!(fields["role"], "kitchen");
        assert_eq!(fields["active"], true);
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = new_staff_fields("   ", StaffRole::Admin, true).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "name"));
    }
}
