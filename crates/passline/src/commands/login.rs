//! PIN login and logout. The session token lives in the system keyring,
//! keyed by profile.

use secrecy::SecretString;

use passline_core::Authenticator;

use crate::cli::GlobalOpts;
use crate::config::{self, Resolved};
use crate::error::CliError;

pub async fn login(global: &GlobalOpts) -> Result<(), CliError> {
    let Resolved { name, mut sync, .. } = config::resolve(global)?;
    // A stale token must not ride along on the login request.
    sync.token = None;
    let client = sync.client()?;

    let pin = rpassword::prompt_password("Staff PIN: ").map(SecretString::from)?;
    let session = client.login(&pin).await?;
    passline_config::store_token(&name, &session.token)?;

    if !global.quiet {
        let until = session.expires_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M");
        eprintln!(
            "Logged in as {} ({}) on profile '{name}' until {until}",
            session.name, session.role
        );
    }
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let name = config::active_profile_name(global, &cfg);
    let removed = passline_config::clear_token(&name)?;
    if !global.quiet {
        if removed {
            eprintln!("Logged out of profile '{name}'");
        } else {
            eprintln!("No stored session for profile '{name}'");
        }
    }
    Ok(())
}
