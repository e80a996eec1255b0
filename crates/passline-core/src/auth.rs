// ── Staff authentication ──
//
// PIN login against the store's auth endpoint. Rejections are a typed
// result for the UI, never an opaque error.

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, warn};

use passline_api::{PinLogin, StoreClient};

use crate::coordinator::ViewRole;
use crate::model::{EntityId, StaffRole};

pub const MIN_PIN_LEN: usize = 4;
pub const MAX_PIN_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthRejection {
    #[error("PIN not recognized")]
    InvalidPin,

    #[error("staff account is inactive")]
    Inactive,

    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}

/// An authenticated staff member and their time-bounded credential.
#[derive(Debug, Clone)]
pub struct Session {
    pub staff_id: EntityId,
    pub name: String,
    pub role: StaffRole,
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn view_role(&self) -> ViewRole {
        ViewRole::from(self.role)
    }
}

impl TryFrom<PinLogin> for Session {
    type Error = AuthRejection;

    fn try_from(login: PinLogin) -> Result<Self, Self::Error> {
        let role = login.role.parse::<StaffRole>().map_err(|_| {
            AuthRejection::Unavailable(format!("unrecognized role claim '{}'", login.role))
        })?;
        Ok(Self {
            staff_id: EntityId::from(login.staff_id),
            name: login.name,
            role,
            token: login.token,
            expires_at: login.expires_at,
        })
    }
}

/// Check PIN shape before it leaves the process.
pub fn validate_pin(pin: &SecretString) -> Result<(), AuthRejection> {
    let pin = pin.expose_secret();
    let well_formed = (MIN_PIN_LEN..=MAX_PIN_LEN).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit());
    if well_formed {
        Ok(())
    } else {
        Err(AuthRejection::InvalidPin)
    }
}

pub trait Authenticator: Send + Sync {
    fn login<'a>(&'a self, pin: &'a SecretString) -> BoxFuture<'a, Result<Session, AuthRejection>>;
}

impl Authenticator for StoreClient {
    fn login<'a>(&'a self, pin: &'a SecretString) -> BoxFuture<'a, Result<Session, AuthRejection>> {
        async move {
            validate_pin(pin)?;
            let login = self.login_pin(pin).await.map_err(|e| match e {
                passline_api::Error::Authentication { .. } => AuthRejection::InvalidPin,
                passline_api::Error::AccountInactive => AuthRejection::Inactive,
                other => {
                    warn!(error = %other, "PIN login failed");
                    AuthRejection::Unavailable(other.to_string())
                }
            })?;
            let session = Session::try_from(login)?;
            info!(staff = %session.staff_id, role = %session.role, "staff logged in");
            Ok(session)
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[test]
    fn pin_shape() {
        assert!(validate_pin(&secret("1234")).is_ok());
        assert!(validate_pin(&secret("12345678")).is_ok());
        assert_eq!(validate_pin(&secret("123")), Err(AuthRejection::InvalidPin));
        assert_eq!(validate_pin(&secret("123456789")), Err(AuthRejection::InvalidPin));
        assert_eq!(validate_pin(&secret("12a4")), Err(AuthRejection::InvalidPin));
    }

    #[test]
    fn session_from_login() {
        let login = PinLogin {
            token: secret("tok"),
            staff_id: "s1".into(),
            name: "Mika".into(),
            role: "kitchen".into(),
            expires_at: "2026-03-01T20:00:00Z".parse().unwrap(),
        };
        let session = Session::try_from(login).unwrap();
        assert_eq!(session.view_role(), ViewRole::Kitchen);
        assert!(session.is_expired_at("2026-03-01T20:00:00Z".parse().unwrap()));
        assert!(!session.is_expired_at("2026-03-01T19:59:59Z".parse().unwrap()));
    }

    #[test]
    fn unknown_role_claim_is_rejected() {
        let login = PinLogin {
            token: secret("tok"),
            staff_id: "s1".into(),
            name: "Mika".into(),
            role: "owner".into(),
            expires_at: Utc::now(),
        };
        assert!(matches!(Session::try_from(login), Err(AuthRejection::Unavailable(_))));
    }
}
