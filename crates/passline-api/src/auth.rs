// PIN login against the collection store.
//
// Staff authenticate with a short numeric PIN. The store answers with an
// opaque, time-bounded bearer token plus the staff member's identity and
// role claim.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::client::{StoreClient, check, parse_json};
use crate::error::Error;

/// Successful PIN login.
#[derive(Debug, Clone)]
pub struct PinLogin {
    pub token: SecretString,
    pub staff_id: String,
    pub name: String,
    /// Role claim as sent by the store (`"kitchen"`, `"server"`, `"admin"`, …).
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct PinLoginBody {
    token: String,
    staff_id: String,
    name: String,
    role: String,
    expires_at: DateTime<Utc>,
}

impl StoreClient {
    /// Exchange a PIN for a session token.
    ///
    /// `401` maps to [`Error::Authentication`] (unknown PIN) and `403` to
    /// [`Error::AccountInactive`]; everything else goes through the usual
    /// status mapping.
    pub async fn login_pin(&self, pin: &SecretString) -> Result<PinLogin, Error> {
        let url = self.venue_url("auth/pin")?;
        debug!(%url, "PIN login");

        let resp = self
            .http()
            .post(url)
            .json(&serde_json::json!({ "pin": pin.expose_secret() }))
            .send()
            .await?;

        match resp.status().as_u16() {
            401 => {
                return Err(Error::Authentication {
                    message: "PIN not recognised".into(),
                });
            }
            403 => return Err(Error::AccountInactive),
            _ => {}
        }

        let body: PinLoginBody = parse_json(check(resp).await?).await?;
        debug!(staff_id = %body.staff_id, role = %body.role, "PIN login accepted");

        Ok(PinLogin {
            token: SecretString::from(body.token),
            staff_id: body.staff_id,
            name: body.name,
            role: body.role,
            expires_at: body.expires_at,
        })
    }
}
