//! Severity and urgency derivation rules.
//!
//! Severity is never set by callers; these functions derive it from
//! domain thresholds. The thresholds are load-bearing — controllers,
//! dashboards, and the mobile client all assume them.

use chrono::{DateTime, Duration, Utc};

use farmhub_core::events::{BreedingEventKind, HealthStatus};
use farmhub_core::types::severity::Severity;

/// Derived classification for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derived {
    /// Urgency level.
    pub severity: Severity,
    /// Whether the notification demands user action.
    pub action_required: bool,
}

/// Classify an animal health change by its new status.
pub fn health_change(current: HealthStatus) -> Derived {
    let severity = match current {
        HealthStatus::Critical | HealthStatus::Emergency => Severity::Critical,
        HealthStatus::Sick | HealthStatus::Injured => Severity::High,
        HealthStatus::Monitoring | HealthStatus::Treatment => Severity::Medium,
        HealthStatus::Healthy | HealthStatus::Recovering => Severity::Low,
    };
    Derived {
        severity,
        action_required: severity.demands_action(),
    }
}

/// Classify a low feed stock event.
///
/// High when the stock has fallen to half the reorder point or below;
/// restocking is always actionable.
pub fn feed_stock(current_stock: f64, reorder_point: f64) -> Derived {
    let severity = if current_stock <= reorder_point * 0.5 {
        Severity::High
    } else {
        Severity::Medium
    };
    Derived {
        severity,
        action_required: true,
    }
}

/// Classify a feed expiry event by days remaining.
pub fn feed_expiry(days_until_expiry: i64) -> Derived {
    let severity = if days_until_expiry <= 3 {
        Severity::High
    } else if days_until_expiry <= 7 {
        Severity::Medium
    } else {
        Severity::Low
    };
    Derived {
        severity,
        action_required: days_until_expiry <= 7,
    }
}

/// Classify a veterinary appointment reminder by hours remaining.
pub fn veterinary(hours_until: f64) -> Derived {
    let severity = if hours_until <= 2.0 {
        Severity::High
    } else if hours_until <= 24.0 {
        Severity::Medium
    } else {
        Severity::Low
    };
    Derived {
        severity,
        action_required: hours_until <= 24.0,
    }
}

/// Classify a breeding lifecycle event.
pub fn breeding(kind: BreedingEventKind) -> Derived {
    let severity = match kind {
        BreedingEventKind::BirthExpected | BreedingEventKind::BirthOccurred => Severity::High,
        _ => Severity::Medium,
    };
    Derived {
        severity,
        action_required: matches!(
            kind,
            BreedingEventKind::BirthExpected | BreedingEventKind::WeaningDue
        ),
    }
}

/// Classify a system alert from the caller-requested level.
pub fn system(requested: Option<Severity>) -> Derived {
    let severity = requested.unwrap_or(Severity::Medium);
    Derived {
        severity,
        action_required: severity.demands_action(),
    }
}

/// Default expiry for health-change notifications.
pub fn health_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(24)
}

/// Default expiry for feed stock notifications.
pub fn feed_stock_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(7)
}

/// Default expiry for breeding notifications.
pub fn breeding_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(30)
}

/// Default expiry for system alerts.
pub fn system_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_severity_table() {
        let cases = [
            (HealthStatus::Critical, Severity::Critical, true),
            (HealthStatus::Emergency, Severity::Critical, true),
            (HealthStatus::Sick, Severity::High, true),
            (HealthStatus::Injured, Severity::High, true),
            (HealthStatus::Monitoring, Severity::Medium, false),
            (HealthStatus::Treatment, Severity::Medium, false),
            (HealthStatus::Healthy, Severity::Low, false),
            (HealthStatus::Recovering, Severity::Low, false),
        ];
        for (status, severity, action) in cases {
            let d = health_change(status);
            assert_eq!(d.severity, severity, "status {status}");
            assert_eq!(d.action_required, action, "status {status}");
        }
    }

    #[test]
    fn test_health_change_uses_new_status_only() {
        // healthy → critical is critical; sick → healthy is low.
        assert_eq!(health_change(HealthStatus::Critical).severity, Severity::Critical);
        assert_eq!(health_change(HealthStatus::Healthy).severity, Severity::Low);
    }

    #[test]
    fn test_feed_stock_thresholds() {
        let d = feed_stock(50.0, 200.0);
        assert_eq!(d.severity, Severity::High);
        assert!(d.action_required);

        let d = feed_stock(150.0, 200.0);
        assert_eq!(d.severity, Severity::Medium);
        assert!(d.action_required);

        // Exactly half the reorder point is still high.
        assert_eq!(feed_stock(100.0, 200.0).severity, Severity::High);
    }

    #[test]
    fn test_feed_expiry_thresholds() {
        let d = feed_expiry(2);
        assert_eq!(d.severity, Severity::High);
        assert!(d.action_required);

        let d = feed_expiry(7);
        assert_eq!(d.severity, Severity::Medium);
        assert!(d.action_required);

        let d = feed_expiry(13);
        assert_eq!(d.severity, Severity::Low);
        assert!(!d.action_required);
    }

    #[test]
    fn test_veterinary_thresholds() {
        let d = veterinary(1.5);
        assert_eq!(d.severity, Severity::High);
        assert!(d.action_required);

        let d = veterinary(12.0);
        assert_eq!(d.severity, Severity::Medium);
        assert!(d.action_required);

        let d = veterinary(48.0);
        assert_eq!(d.severity, Severity::Low);
        assert!(!d.action_required);
    }

    #[test]
    fn test_breeding_table() {
        assert_eq!(
            breeding(BreedingEventKind::BirthExpected),
            Derived {
                severity: Severity::High,
                action_required: true
            }
        );
        assert_eq!(
            breeding(BreedingEventKind::BirthOccurred),
            Derived {
                severity: Severity::High,
                action_required: false
            }
        );
        assert_eq!(
            breeding(BreedingEventKind::WeaningDue),
            Derived {
                severity: Severity::Medium,
                action_required: true
            }
        );
        assert_eq!(
            breeding(BreedingEventKind::PregnancyConfirmed),
            Derived {
                severity: Severity::Medium,
                action_required: false
            }
        );
    }

    #[test]
    fn test_system_alert_defaults_to_medium() {
        let d = system(None);
        assert_eq!(d.severity, Severity::Medium);
        assert!(!d.action_required);

        let d = system(Some(Severity::Critical));
        assert_eq!(d.severity, Severity::Critical);
        assert!(d.action_required);

        let d = system(Some(Severity::Low));
        assert_eq!(d.severity, Severity::Low);
        assert!(!d.action_required);
    }
}
