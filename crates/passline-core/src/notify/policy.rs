//! Which transitions produce which effects.

use super::{Cue, Effect, NotificationSettings, OsNotice, Toast, ToastAction};
use crate::detect::Transition;
use crate::model::{Order, OrderStatus};

pub const ORDER_READY_TITLE: &str = "Order ready";
pub const ORDER_READY_BODY: &str = "An order is ready to be served.";
pub const ORDER_READY_ICON: &str = "passline-order-ready";
pub const ACKNOWLEDGE: &str = "Got it";

/// - reached `ready`: cue, toast, platform notice
/// - created as `pending`: cue only
/// - anything else: nothing
pub fn order_effects(transition: &Transition<Order>, settings: &NotificationSettings) -> Vec<Effect> {
    let mut effects = Vec::new();

    if transition.reached(OrderStatus::Ready) {
        if settings.audio {
            effects.push(Effect::Cue(Cue::OrderReady));
        }
        effects.push(Effect::Toast(Toast {
            message: format!("Ready: {}", transition.current.label()),
            duration: settings.toast_duration,
            action: Some(ToastAction {
                label: ACKNOWLEDGE.into(),
            }),
        }));
        if settings.os_notifications {
            effects.push(Effect::Os(OsNotice {
                title: ORDER_READY_TITLE.into(),
                body: ORDER_READY_BODY.into(),
                icon: ORDER_READY_ICON.into(),
            }));
        }
    } else if transition.created_as(OrderStatus::Pending) && settings.audio {
        effects.push(Effect::Cue(Cue::NewOrder));
    }

    effects
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::detect::classify;
    use crate::model::Entity;
    use passline_api::ChangeKind;
    use serde_json::json;
    use std::sync::Arc;

    fn order(status: &str) -> Arc<Order> {
        let doc = serde_json::from_value(json!({"id": "o1", "table": "4", "status": status, "items": [{"name": "Soup"}]})).unwrap();
        Arc::new(Order::from_document(&doc).unwrap())
    }

    fn effects_for(from: Option<&str>, to: &str, settings: &NotificationSettings) -> Vec<Effect> {
        let previous = from.map(order);
        let current = order(to);
        let kind = if previous.is_some() {
            ChangeKind::Modified
        } else {
            ChangeKind::Added
        };
        let transition = classify(kind, previous.as_ref(), Some(&current)).unwrap();
        order_effects(&transition, settings)
    }

    #[test]
    fn ready_produces_triple() {
        let effects = effects_for(Some("preparing"), "ready", &NotificationSettings::default());
        assert_eq!(effects.len(), 3);
        assert_eq!(effects[0], Effect::Cue(Cue::OrderReady));
        let Effect::Toast(toast) = &effects[1] else {
            panic!("expected toast, got {:?}", effects[1]);
        };
        assert_eq!(toast.message, "Ready: table 4 (1 item)");
        assert_eq!(toast.duration, std::time::Duration::from_secs(10));
        assert!(matches!(effects[2], Effect::Os(ref n) if n.title == ORDER_READY_TITLE));
    }

    #[test]
    fn new_pending_order_is_cue_only() {
        let effects = effects_for(None, "pending", &NotificationSettings::default());
        assert_eq!(effects, vec![Effect::Cue(Cue::NewOrder)]);
    }

    #[test]
    fn served_produces_nothing() {
        assert!(effects_for(Some("ready"), "served", &NotificationSettings::default()).is_empty());
        assert!(effects_for(Some("pending"), "preparing", &NotificationSettings::default()).is_empty());
    }

    #[test]
    fn settings_drop_disabled_effects() {
        let settings = NotificationSettings {
            audio: false,
            os_notifications: false,
            ..NotificationSettings::default()
        };
        let effects = effects_for(Some("preparing"), "ready", &settings);
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Toast(_)));
        assert!(effects_for(None, "pending", &settings).is_empty());
    }
}
