//! Sources of hardware readings for a diagnostic run.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use util::system_health::{self, ConnectionType};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuReading {
    pub usage_percent: f64,
    pub cores: usize,
    pub model: Option<String>,
    pub frequency_mhz: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryReading {
    pub usage_percent: f64,
    pub total_bytes: u64,
    pub used_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskReading {
    pub usage_percent: f64,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub volumes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkReading {
    pub online: bool,
    pub connection_type: ConnectionType,
    pub interfaces: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryReading {
    pub level_percent: f64,
    pub charging: bool,
}

/// Everything one run collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub cpu: CpuReading,
    pub memory: MemoryReading,
    pub disk: DiskReading,
    pub network: NetworkReading,
    pub battery: Option<BatteryReading>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Cpu,
    Memory,
    Disk,
    Network,
    Battery,
}

impl Component {
    pub const ALL: [Component; 5] = [
        Component::Cpu,
        Component::Memory,
        Component::Disk,
        Component::Network,
        Component::Battery,
    ];
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Cpu => "cpu",
            Component::Memory => "memory",
            Component::Disk => "disk",
            Component::Network => "network",
            Component::Battery => "battery",
        };
        f.write_str(name)
    }
}

#[async_trait]
pub trait MetricsCollector: Send + Sync {
    async fn collect_cpu(&self) -> Result<CpuReading, AppError>;

    async fn collect_memory(&self) -> Result<MemoryReading, AppError>;

    async fn collect_disk(&self) -> Result<DiskReading, AppError>;

    async fn collect_network(&self) -> Result<NetworkReading, AppError>;

    /// `None` on hosts without a battery.
    async fn collect_battery(&self) -> Result<Option<BatteryReading>, AppError> {
        Ok(None)
    }

    /// Simulated collectors get a cosmetic progress ticker instead of
    /// per-component progress.
    fn is_simulated(&self) -> bool {
        false
    }
}

/// Reads the current host through `sysinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCollector;

async fn blocking<T, F>(component: Component, f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Collection(format!("{component} sampler panicked: {e}")))
}

#[async_trait]
impl MetricsCollector for SystemCollector {
    async fn collect_cpu(&self) -> Result<CpuReading, AppError> {
        let sample = blocking(Component::Cpu, system_health::sample_cpu).await?;
        Ok(CpuReading {
            usage_percent: f64::from(sample.usage_percent),
            cores: sample.cores,
            model: Some(sample.brand).filter(|b| !b.is_empty()),
            frequency_mhz: Some(sample.frequency_mhz).filter(|f| *f > 0),
        })
    }

    async fn collect_memory(&self) -> Result<MemoryReading, AppError> {
        let sample = blocking(Component::Memory, system_health::sample_memory).await?;
        if sample.total == 0 {
            return Err(AppError::Collection("memory total reported as zero".into()));
        }
        Ok(MemoryReading {
            usage_percent: f64::from(sample.usage_percent),
            total_bytes: sample.total,
            used_bytes: sample.used,
        })
    }

    async fn collect_disk(&self) -> Result<DiskReading, AppError> {
        let sample = blocking(Component::Disk, system_health::sample_disks).await?;
        Ok(DiskReading {
            usage_percent: f64::from(sample.usage_percent),
            total_bytes: sample.total,
            available_bytes: sample.available,
            volumes: sample.disks.len(),
        })
    }

    async fn collect_network(&self) -> Result<NetworkReading, AppError> {
        let sample = blocking(Component::Network, system_health::sample_network).await?;
        Ok(NetworkReading {
            online: sample.online,
            connection_type: sample.connection_type,
            interfaces: sample.interfaces.len(),
        })
    }
}

/// Fixed readings returned after a fixed delay each.
#[derive(Debug, Clone)]
pub struct SimulatedCollector {
    readings: Readings,
    delay: Duration,
    fail_at: Option<Component>,
}

impl Default for SimulatedCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCollector {
    pub fn new() -> Self {
        Self {
            readings: Readings {
                cpu: CpuReading {
                    usage_percent: 45.0,
                    cores: 8,
                    model: Some("Simulated 8-core CPU".into()),
                    frequency_mhz: Some(3200),
                },
                memory: MemoryReading {
                    usage_percent: 62.0,
                    total_bytes: 16 * 1024 * 1024 * 1024,
                    used_bytes: 10_651_518_894,
                },
                disk: DiskReading {
                    usage_percent: 71.0,
                    total_bytes: 512 * 1000 * 1000 * 1000,
                    available_bytes: 148_480_000_000,
                    volumes: 1,
                },
                network: NetworkReading {
                    online: true,
                    connection_type: ConnectionType::Wifi,
                    interfaces: 2,
                },
                battery: Some(BatteryReading {
                    level_percent: 85.0,
                    charging: true,
                }),
            },
            delay: Duration::from_millis(500),
            fail_at: None,
        }
    }

    pub fn with_readings(mut self, readings: Readings) -> Self {
        self.readings = readings;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes the named component fail with a collection error.
    pub fn failing_at(mut self, component: Component) -> Self {
        self.fail_at = Some(component);
        self
    }

    pub fn readings(&self) -> &Readings {
        &self.readings
    }

    async fn step<T: Clone>(&self, component: Component, value: &T) -> Result<T, AppError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_at == Some(component) {
            return Err(AppError::Collection(format!("{component} probe failed")));
        }
        Ok(value.clone())
    }
}

#[async_trait]
impl MetricsCollector for SimulatedCollector {
    async fn collect_cpu(&self) -> Result<CpuReading, AppError> {
        self.step(Component::Cpu, &self.readings.cpu).await
    }

    async fn collect_memory(&self) -> Result<MemoryReading, AppError> {
        self.step(Component::Memory, &self.readings.memory).await
    }

    async fn collect_disk(&self) -> Result<DiskReading, AppError> {
        self.step(Component::Disk, &self.readings.disk).await
    }

    async fn collect_network(&self) -> Result<NetworkReading, AppError> {
        self.step(Component::Network, &self.readings.network).await
    }

    async fn collect_battery(&self) -> Result<Option<BatteryReading>, AppError> {
        self.step(Component::Battery, &self.readings.battery).await
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_collector_replays_its_readings() {
        let collector = SimulatedCollector::new().with_delay(Duration::ZERO);
        assert_eq!(collector.collect_cpu().await.unwrap().usage_percent, 45.0);
        assert!(collector.collect_battery().await.unwrap().is_some());
        assert!(collector.is_simulated());
    }

    #[tokio::test]
    async fn simulated_collector_fails_where_told() {
        let collector = SimulatedCollector::new()
            .with_delay(Duration::ZERO)
            .failing_at(Component::Disk);
        assert!(collector.collect_memory().await.is_ok());
        let err = collector.collect_disk().await.unwrap_err();
        assert_eq!(err.to_string(), "metric collection failed: disk probe failed");
    }

    #[tokio::test]
    async fn system_collector_reads_this_host() {
        let cpu = SystemCollector.collect_cpu().await.unwrap();
        assert!(cpu.cores > 0);
        assert!((0.0..=100.0).contains(&cpu.usage_percent));
        assert!(SystemCollector.collect_battery().await.unwrap().is_none());
    }
}
