//! Health score and component labels.
//!
//! Start from 100 and subtract a fixed amount per threshold breach:
//!
//! | reading            | breach   | deduction |
//! |--------------------|----------|-----------|
//! | CPU usage          | > 80 %   | 20        |
//! | memory usage       | > 85 %   | 25        |
//! | disk usage         | > 90 %   | 30        |
//! | network type       | unknown  | 15        |
//!
//! The result never drops below 0. A reading within ten points under its
//! threshold is labelled `warning`; low battery is reported but not scored.

use serde_json::Value;

use crate::collector::{
    BatteryReading, CpuReading, DiskReading, MemoryReading, NetworkReading, Readings,
};
use crate::types::{ComponentReport, ComponentStatus, Issue, Severity};
use util::system_health::ConnectionType;

pub const CPU_LIMIT: f64 = 80.0;
pub const MEMORY_LIMIT: f64 = 85.0;
pub const DISK_LIMIT: f64 = 90.0;
pub const CPU_DEDUCTION: u8 = 20;
pub const MEMORY_DEDUCTION: u8 = 25;
pub const DISK_DEDUCTION: u8 = 30;
pub const UNKNOWN_NETWORK_DEDUCTION: u8 = 15;
pub const WARNING_MARGIN: f64 = 10.0;
pub const LOW_BATTERY: f64 = 20.0;

fn usage_status(usage: f64, limit: f64) -> ComponentStatus {
    if usage > limit {
        ComponentStatus::Critical
    } else if usage > limit - WARNING_MARGIN {
        ComponentStatus::Warning
    } else {
        ComponentStatus::Normal
    }
}

pub fn cpu_status(r: &CpuReading) -> ComponentStatus {
    usage_status(r.usage_percent, CPU_LIMIT)
}

pub fn memory_status(r: &MemoryReading) -> ComponentStatus {
    usage_status(r.usage_percent, MEMORY_LIMIT)
}

pub fn disk_status(r: &DiskReading) -> ComponentStatus {
    usage_status(r.usage_percent, DISK_LIMIT)
}

pub fn network_status(r: &NetworkReading) -> ComponentStatus {
    if !r.online {
        ComponentStatus::Critical
    } else if r.connection_type == ConnectionType::Unknown {
        ComponentStatus::Warning
    } else {
        ComponentStatus::Normal
    }
}

pub fn battery_status(r: &BatteryReading) -> ComponentStatus {
    if r.level_percent < LOW_BATTERY && !r.charging {
        ComponentStatus::Warning
    } else {
        ComponentStatus::Normal
    }
}

fn metrics<T: serde::Serialize>(reading: &T) -> Value {
    serde_json::to_value(reading)
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| Value::Object(Default::default()))
}

pub fn cpu_report(r: &CpuReading) -> ComponentReport {
    ComponentReport {
        status: cpu_status(r),
        metrics: metrics(r),
    }
}

pub fn memory_report(r: &MemoryReading) -> ComponentReport {
    ComponentReport {
        status: memory_status(r),
        metrics: metrics(r),
    }
}

pub fn disk_report(r: &DiskReading) -> ComponentReport {
    ComponentReport {
        status: disk_status(r),
        metrics: metrics(r),
    }
}

pub fn network_report(r: &NetworkReading) -> ComponentReport {
    ComponentReport {
        status: network_status(r),
        metrics: metrics(r),
    }
}

pub fn battery_report(r: &BatteryReading) -> ComponentReport {
    ComponentReport {
        status: battery_status(r),
        metrics: metrics(r),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub health_score: u8,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<String>,
}

pub fn assess(readings: &Readings) -> Assessment {
    let mut score: u8 = 100;
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    let mut breach = |deduction: u8, issue: Issue, advice: &str| {
        score = score.saturating_sub(deduction);
        issues.push(issue);
        recommendations.push(advice.to_owned());
    };

    if readings.cpu.usage_percent > CPU_LIMIT {
        breach(
            CPU_DEDUCTION,
            Issue {
                category: "cpu".into(),
                severity: Severity::High,
                description: format!(
                    "CPU usage is {:.0}% (limit {CPU_LIMIT:.0}%)",
                    readings.cpu.usage_percent
                ),
            },
            "Check for runaway processes and clean the CPU cooler",
        );
    }
    if readings.memory.usage_percent > MEMORY_LIMIT {
        breach(
            MEMORY_DEDUCTION,
            Issue {
                category: "memory".into(),
                severity: Severity::High,
                description: format!(
                    "Memory usage is {:.0}% (limit {MEMORY_LIMIT:.0}%)",
                    readings.memory.usage_percent
                ),
            },
            "Close unused applications or add more RAM",
        );
    }
    if readings.disk.usage_percent > DISK_LIMIT {
        breach(
            DISK_DEDUCTION,
            Issue {
                category: "disk".into(),
                severity: Severity::Critical,
                description: format!(
                    "Disk usage is {:.0}% (limit {DISK_LIMIT:.0}%)",
                    readings.disk.usage_percent
                ),
            },
            "Free up disk space or move data to external storage",
        );
    }
    if readings.network.connection_type == ConnectionType::Unknown {
        let severity = if readings.network.online {
            Severity::Medium
        } else {
            Severity::High
        };
        breach(
            UNKNOWN_NETWORK_DEDUCTION,
            Issue {
                category: "network".into(),
                severity,
                description: "Network connection type could not be determined".into(),
            },
            "Check the network adapter and cabling",
        );
    }

    if let Some(battery) = &readings.battery {
        if battery_status(battery) == ComponentStatus::Warning {
            issues.push(Issue {
                category: "battery".into(),
                severity: Severity::Low,
                description: format!("Battery at {:.0}% and discharging", battery.level_percent),
            });
            recommendations.push("Connect the charger".into());
        }
    }

    Assessment {
        health_score: score,
        issues,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::SimulatedCollector;

    fn healthy() -> Readings {
        SimulatedCollector::new().readings().clone()
    }

    #[test]
    fn healthy_machine_scores_full_marks() {
        let a = assess(&healthy());
        assert_eq!(a.health_score, 100);
        assert!(a.issues.is_empty());
        assert!(a.recommendations.is_empty());
    }

    #[test]
    fn each_breach_deducts_once() {
        let mut r = healthy();
        r.cpu.usage_percent = 80.5;
        assert_eq!(assess(&r).health_score, 80);

        r.memory.usage_percent = 86.0;
        assert_eq!(assess(&r).health_score, 55);

        r.disk.usage_percent = 95.0;
        assert_eq!(assess(&r).health_score, 25);

        r.network.connection_type = ConnectionType::Unknown;
        let a = assess(&r);
        assert_eq!(a.health_score, 10);
        assert_eq!(a.issues.len(), 4);
        assert_eq!(a.recommendations.len(), 4);
    }

    #[test]
    fn thresholds_are_strict() {
        let mut r = healthy();
        r.cpu.usage_percent = 80.0;
        r.memory.usage_percent = 85.0;
        r.disk.usage_percent = 90.0;
        assert_eq!(assess(&r).health_score, 100);
    }

    #[test]
    fn labels_warn_within_margin() {
        let cpu = |usage| CpuReading {
            usage_percent: usage,
            cores: 4,
            model: None,
            frequency_mhz: None,
        };
        assert_eq!(cpu_status(&cpu(50.0)), ComponentStatus::Normal);
        assert_eq!(cpu_status(&cpu(75.0)), ComponentStatus::Warning);
        assert_eq!(cpu_status(&cpu(81.0)), ComponentStatus::Critical);
    }

    #[test]
    fn offline_network_is_critical() {
        let mut n = healthy().network;
        n.online = false;
        assert_eq!(network_status(&n), ComponentStatus::Critical);
        n.online = true;
        n.connection_type = ConnectionType::Unknown;
        assert_eq!(network_status(&n), ComponentStatus::Warning);
    }

    #[test]
    fn low_battery_is_reported_but_free() {
        let mut r = healthy();
        r.battery = Some(BatteryReading {
            level_percent: 12.0,
            charging: false,
        });
        let a = assess(&r);
        assert_eq!(a.health_score, 100);
        assert_eq!(a.issues.len(), 1);
        assert_eq!(a.issues[0].severity, Severity::Low);
    }

    #[test]
    fn reports_carry_object_metrics() {
        let report = cpu_report(&healthy().cpu);
        assert!(report.metrics.is_object());
        assert_eq!(report.metrics["cores"], 8);
    }
}
