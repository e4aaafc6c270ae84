//! Alert notification seam
//!
//! Each generated alert is announced once, at generation time, through an
//! [`AlertNotifier`]. Frontends plug in their own sink (terminal, desktop
//! toast); the library ships a tracing sink and a silent one.

use tracing::{error, warn};

use crate::types::Alert;

/// Event announced for one generated alert
#[derive(Debug, Clone, Copy)]
pub enum AlertEvent<'a> {
    CriticalAlertRaised(&'a Alert),
    WarningAlertRaised(&'a Alert),
}

impl<'a> AlertEvent<'a> {
    pub fn for_alert(alert: &'a Alert) -> Self {
        if alert.is_critical() {
            AlertEvent::CriticalAlertRaised(alert)
        } else {
            AlertEvent::WarningAlertRaised(alert)
        }
    }

    pub fn alert(&self) -> &'a Alert {
        match self {
            AlertEvent::CriticalAlertRaised(alert) | AlertEvent::WarningAlertRaised(alert) => alert,
        }
    }
}

/// Sink for alert events
pub trait AlertNotifier {
    fn notify(&self, event: AlertEvent<'_>);
}

/// Announce every alert in order; returns how many were announced
pub fn notify_all(notifier: &dyn AlertNotifier, alerts: &[Alert]) -> usize {
    for alert in alerts {
        notifier.notify(AlertEvent::for_alert(alert));
    }
    alerts.len()
}

/// Logs critical alerts at error level and warnings at warn level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl AlertNotifier for TracingNotifier {
    fn notify(&self, event: AlertEvent<'_>) {
        match event {
            AlertEvent::CriticalAlertRaised(alert) => error!(
                panel = %alert.panel_id,
                source = %alert.source.label(),
                at = %alert.occurred_at,
                "{}", alert.message
            ),
            AlertEvent::WarningAlertRaised(alert) => warn!(
                panel = %alert.panel_id,
                source = %alert.source.label(),
                at = %alert.occurred_at,
                "{}", alert.message
            ),
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl AlertNotifier for NullNotifier {
    fn notify(&self, _event: AlertEvent<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AlertSource;
    use chrono::Utc;
    use pv_model::Severity;
    use std::cell::RefCell;
    use tracing_test::traced_test;
    use uuid::Uuid;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(bool, String)>>,
    }

    impl AlertNotifier for Recorder {
        fn notify(&self, event: AlertEvent<'_>) {
            let critical = matches!(event, AlertEvent::CriticalAlertRaised(_));
            self.seen
                .borrow_mut()
                .push((critical, event.alert().message.clone()));
        }
    }

    fn alert(message: &str, severity: Severity) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            panel_id: "PV001".to_string(),
            reading_id: 1,
            message: message.to_string(),
            severity,
            occurred_at: Utc::now(),
            source: AlertSource::Offline,
        }
    }

    #[test]
    fn test_notify_all_in_order() {
        let recorder = Recorder::default();
        let alerts = vec![
            alert("first", Severity::Critical),
            alert("second", Severity::Warning),
        ];

        assert_eq!(notify_all(&recorder, &alerts), 2);
        assert_eq!(
            *recorder.seen.borrow(),
            vec![(true, "first".to_string()), (false, "second".to_string())]
        );
    }

    #[test]
    #[traced_test]
    fn test_tracing_notifier() {
        TracingNotifier.notify(AlertEvent::for_alert(&alert(
            "PV001 offline - possible theft or disconnection",
            Severity::Critical,
        )));
        assert!(logs_contain("PV001 offline"));
        assert!(logs_contain("ERROR"));
    }
}
