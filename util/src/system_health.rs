//! Host metric sampling on top of `sysinfo`.
//!
//! Each sampler is blocking (CPU usage needs two refreshes separated by
//! `MINIMUM_CPU_UPDATE_INTERVAL`); async callers should run them on
//! `spawn_blocking`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sysinfo::{Disks, MINIMUM_CPU_UPDATE_INTERVAL, Networks, System};

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CpuSample {
    pub usage_percent: f32,
    pub cores: usize,
    pub per_core: Vec<f32>,
    pub brand: String,
    pub frequency_mhz: u64,
    pub load_one: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MemorySample {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub usage_percent: f32,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DiskSummary {
    pub name: String,
    pub total: u64,
    pub available: u64,
    pub file_system: String,
    pub mount_point: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DiskSample {
    pub total: u64,
    pub available: u64,
    pub usage_percent: f32,
    pub disks: Vec<DiskSummary>,
}

/// Coarse classification of the active link.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Ethernet,
    Wifi,
    Cellular,
    Unknown,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct InterfaceSummary {
    pub name: String,
    pub connection_type: ConnectionType,
    pub received: u64,
    pub transmitted: u64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NetworkSample {
    pub online: bool,
    pub connection_type: ConnectionType,
    pub interfaces: Vec<InterfaceSummary>,
}

fn percent(part: u64, whole: u64) -> f32 {
    if whole == 0 {
        0.0
    } else {
        ((part as f64 / whole as f64) * 100.0) as f32
    }
}

/// De-duplicate disks across all OSes by (name, total, fs).
/// If multiple entries match, prefer mount_point "/", otherwise prefer the shortest path.
fn dedupe_disks(disks: Vec<DiskSummary>) -> Vec<DiskSummary> {
    fn mount_score(mp: &str) -> (u8, usize) {
        let root_rank = if mp == "/" { 0 } else { 1 };
        (root_rank, mp.len())
    }

    let mut pick: HashMap<(String, u64, String), DiskSummary> = HashMap::new();
    for d in disks {
        let key = (d.name.clone(), d.total, d.file_system.clone());
        let replace = match pick.get(&key) {
            None => true,
            Some(prev) => mount_score(&d.mount_point) < mount_score(&prev.mount_point),
        };
        if replace {
            pick.insert(key, d);
        }
    }
    let mut out: Vec<DiskSummary> = pick.into_values().collect();
    out.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
    out
}

/// Guesses the link type from the interface name.
pub fn classify_interface(name: &str) -> ConnectionType {
    let lower = name.to_lowercase();
    if lower.starts_with("wl") || lower.contains("wi-fi") || lower.contains("wifi") {
        ConnectionType::Wifi
    } else if lower.starts_with("eth") || lower.starts_with("en") || lower.contains("ethernet") {
        ConnectionType::Ethernet
    } else if lower.starts_with("wwan") || lower.starts_with("rmnet") || lower.starts_with("ppp") {
        ConnectionType::Cellular
    } else {
        ConnectionType::Unknown
    }
}

fn is_loopback(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower == "lo" || lower.starts_with("lo0") || lower.contains("loopback")
}

pub fn sample_cpu() -> CpuSample {
    let mut sys = System::new();
    sys.refresh_cpu_usage();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();

    let cpus = sys.cpus();
    let per_core: Vec<f32> = cpus.iter().map(|c| c.cpu_usage()).collect();
    let (brand, frequency_mhz) = cpus
        .first()
        .map(|c| (c.brand().trim().to_string(), c.frequency()))
        .unwrap_or_default();

    CpuSample {
        usage_percent: sys.global_cpu_usage(),
        cores: per_core.len(),
        per_core,
        brand,
        frequency_mhz,
        load_one: System::load_average().one,
    }
}

pub fn sample_memory() -> MemorySample {
    let mut sys = System::new();
    sys.refresh_memory();

    MemorySample {
        total: sys.total_memory(),
        used: sys.used_memory(),
        available: sys.available_memory(),
        swap_total: sys.total_swap(),
        swap_used: sys.used_swap(),
        usage_percent: percent(sys.used_memory(), sys.total_memory()),
    }
}

pub fn sample_disks() -> DiskSample {
    let disks = Disks::new_with_refreshed_list();
    let collected: Vec<DiskSummary> = disks
        .list()
        .iter()
        .map(|d| DiskSummary {
            name: d.name().to_string_lossy().to_string(),
            total: d.total_space(),
            available: d.available_space(),
            file_system: d.file_system().to_string_lossy().to_string(),
            mount_point: d.mount_point().to_string_lossy().to_string(),
        })
        .collect();

    let disks = dedupe_disks(collected);
    let total: u64 = disks.iter().map(|d| d.total).sum();
    let available: u64 = disks.iter().map(|d| d.available).sum();

    DiskSample {
        total,
        available,
        usage_percent: percent(total.saturating_sub(available), total),
        disks,
    }
}

pub fn sample_network() -> NetworkSample {
    let networks = Networks::new_with_refreshed_list();
    let mut interfaces: Vec<InterfaceSummary> = networks
        .list()
        .iter()
        .filter(|(name, _)| !is_loopback(name))
        .map(|(name, data)| InterfaceSummary {
            name: name.clone(),
            connection_type: classify_interface(name),
            received: data.total_received(),
            transmitted: data.total_transmitted(),
        })
        .collect();
    interfaces.sort_by(|a, b| b.received.cmp(&a.received));

    let active: Vec<&InterfaceSummary> = interfaces
        .iter()
        .filter(|i| i.received > 0 || i.transmitted > 0)
        .collect();
    let connection_type = active
        .first()
        .map(|i| i.connection_type)
        .unwrap_or(ConnectionType::Unknown);

    NetworkSample {
        online: !active.is_empty(),
        connection_type,
        interfaces,
    }
}
