//! Domain values exchanged between providers, the orchestrator and the API.
//!
//! Everything here is plain data. Storage rows from `db::models` are turned
//! into these through `From`/`TryFrom`, which is also where stored JSON gets
//! parsed and checked.

use chrono::{DateTime, Utc};
use db::models::{device, diagnostic};
use sea_orm::{ActiveValue::Set, NotSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::AppError;

pub use db::models::device::DeviceType;
pub use db::models::diagnostic::{ComponentStatus, DiagnosticStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub device_type: DeviceType,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub processor: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub last_diagnostic_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<device::Model> for Device {
    fn from(m: device::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            device_type: m.device_type,
            os_name: m.os_name,
            os_version: m.os_version,
            processor: m.processor,
            ram: m.ram,
            storage: m.storage,
            last_diagnostic_id: m.last_diagnostic_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewDevice {
    #[validate(length(min = 1, max = 120, message = "Device name must be 1-120 characters"))]
    pub name: String,
    #[serde(default)]
    pub device_type: DeviceType,
    #[validate(length(max = 120, message = "OS name is too long"))]
    pub os_name: Option<String>,
    #[validate(length(max = 60, message = "OS version is too long"))]
    pub os_version: Option<String>,
    #[validate(length(max = 200, message = "Processor description is too long"))]
    pub processor: Option<String>,
    #[validate(length(max = 60, message = "RAM description is too long"))]
    pub ram: Option<String>,
    #[validate(length(max = 60, message = "Storage description is too long"))]
    pub storage: Option<String>,
}

impl NewDevice {
    pub fn named(name: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            name: name.into(),
            device_type,
            ..Default::default()
        }
    }

    pub fn into_active_model(self, user_id: &str) -> device::ActiveModel {
        let now = Utc::now();
        device::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_owned()),
            name: Set(self.name.trim().to_owned()),
            device_type: Set(self.device_type),
            os_name: Set(self.os_name),
            os_version: Set(self.os_version),
            processor: Set(self.processor),
            ram: Set(self.ram),
            storage: Set(self.storage),
            last_diagnostic_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

/// Partial device update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct DeviceUpdate {
    #[validate(length(min = 1, max = 120, message = "Device name must be 1-120 characters"))]
    pub name: Option<String>,
    pub device_type: Option<DeviceType>,
    #[validate(length(max = 120, message = "OS name is too long"))]
    pub os_name: Option<String>,
    #[validate(length(max = 60, message = "OS version is too long"))]
    pub os_version: Option<String>,
    #[validate(length(max = 200, message = "Processor description is too long"))]
    pub processor: Option<String>,
    #[validate(length(max = 60, message = "RAM description is too long"))]
    pub ram: Option<String>,
    #[validate(length(max = 60, message = "Storage description is too long"))]
    pub storage: Option<String>,
    pub last_diagnostic_id: Option<String>,
}

impl DeviceUpdate {
    pub fn last_diagnostic(diagnostic_id: impl Into<String>) -> Self {
        Self {
            last_diagnostic_id: Some(diagnostic_id.into()),
            ..Default::default()
        }
    }

    /// Applies the set fields on top of `device`.
    pub fn apply_to(&self, device: &mut Device) {
        if let Some(name) = &self.name {
            device.name = name.trim().to_owned();
        }
        if let Some(device_type) = self.device_type {
            device.device_type = device_type;
        }
        if let Some(v) = &self.os_name {
            device.os_name = Some(v.clone());
        }
        if let Some(v) = &self.os_version {
            device.os_version = Some(v.clone());
        }
        if let Some(v) = &self.processor {
            device.processor = Some(v.clone());
        }
        if let Some(v) = &self.ram {
            device.ram = Some(v.clone());
        }
        if let Some(v) = &self.storage {
            device.storage = Some(v.clone());
        }
        if let Some(v) = &self.last_diagnostic_id {
            device.last_diagnostic_id = Some(v.clone());
        }
        device.updated_at = Utc::now();
    }
}

/// Label plus the raw readings for one hardware component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReport {
    pub status: ComponentStatus,
    pub metrics: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub category: String,
    pub severity: Severity,
    pub description: String,
}

/// Who brought the device in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Body of `POST /api/v1/diagnostic/full`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullDiagnosticRequest {
    pub device_id: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_phone: Option<String>,
}

impl FullDiagnosticRequest {
    pub fn client(&self) -> ClientInfo {
        ClientInfo {
            name: self.client_name.clone(),
            phone: self.client_phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub id: String,
    pub device_id: String,
    pub user_id: String,
    pub status: DiagnosticStatus,
    pub cpu: Option<ComponentReport>,
    pub memory: Option<ComponentReport>,
    pub disk: Option<ComponentReport>,
    pub network: Option<ComponentReport>,
    pub battery: Option<ComponentReport>,
    pub antivirus: Option<Value>,
    pub driver: Option<Value>,
    pub health_score: Option<u8>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub raw_data: Option<Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiagnosticResult {
    /// A fresh record for a run that has not started yet.
    pub fn pending(device_id: &str, user_id: &str, client: &ClientInfo) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: device_id.to_owned(),
            user_id: user_id.to_owned(),
            status: DiagnosticStatus::Pending,
            cpu: None,
            memory: None,
            disk: None,
            network: None,
            battery: None,
            antivirus: None,
            driver: None,
            health_score: None,
            issues: Vec::new(),
            recommendations: Vec::new(),
            client_name: client.name.clone(),
            client_phone: client.phone.clone(),
            raw_data: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Structural checks every record must pass before it is stored or
    /// handed to a caller.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.trim().is_empty() {
            return Err(AppError::Validation("diagnostic id is empty".into()));
        }
        if self.device_id.trim().is_empty() {
            return Err(AppError::Validation("diagnostic has no device".into()));
        }

        match (self.status, self.health_score) {
            (DiagnosticStatus::Completed, None) => {
                return Err(AppError::Validation(
                    "completed diagnostic has no health score".into(),
                ));
            }
            (DiagnosticStatus::Completed, Some(score)) if score > 100 => {
                return Err(AppError::Validation(format!(
                    "health score {score} is out of range"
                )));
            }
            (status, Some(_)) if status != DiagnosticStatus::Completed => {
                return Err(AppError::Validation(format!(
                    "{status} diagnostic must not carry a health score"
                )));
            }
            _ => {}
        }

        let reports = [
            ("cpu", &self.cpu),
            ("memory", &self.memory),
            ("disk", &self.disk),
            ("network", &self.network),
            ("battery", &self.battery),
        ];
        for (name, report) in reports {
            if let Some(report) = report {
                if !report.metrics.is_object() {
                    return Err(AppError::Validation(format!(
                        "{name} metrics must be a JSON object"
                    )));
                }
            }
        }
        for (name, blob) in [("antivirus", &self.antivirus), ("driver", &self.driver)] {
            if blob.as_ref().is_some_and(|v| !v.is_object()) {
                return Err(AppError::Validation(format!(
                    "{name} metrics must be a JSON object"
                )));
            }
        }
        Ok(())
    }

    /// Full column set, for inserts and whole-row updates.
    pub fn to_active_model(&self) -> Result<diagnostic::ActiveModel, AppError> {
        let (cpu_status, cpu_metrics) = split_report(&self.cpu);
        let (memory_status, memory_metrics) = split_report(&self.memory);
        let (disk_status, disk_metrics) = split_report(&self.disk);
        let (network_status, network_metrics) = split_report(&self.network);
        let (battery_status, battery_metrics) = split_report(&self.battery);

        Ok(diagnostic::ActiveModel {
            id: Set(self.id.clone()),
            device_id: Set(self.device_id.clone()),
            user_id: Set(self.user_id.clone()),
            status: Set(self.status),
            cpu_status: Set(cpu_status),
            memory_status: Set(memory_status),
            disk_status: Set(disk_status),
            network_status: Set(network_status),
            battery_status: Set(battery_status),
            cpu_metrics: Set(cpu_metrics),
            memory_metrics: Set(memory_metrics),
            disk_metrics: Set(disk_metrics),
            network_metrics: Set(network_metrics),
            battery_metrics: Set(battery_metrics),
            antivirus_metrics: Set(self.antivirus.clone()),
            driver_metrics: Set(self.driver.clone()),
            health_score: Set(self.health_score.map(i32::from)),
            issues: Set(to_json(&self.issues)?),
            recommendations: Set(to_json(&self.recommendations)?),
            client_name: Set(self.client_name.clone()),
            client_phone: Set(self.client_phone.clone()),
            raw_data: Set(self.raw_data.clone()),
            error_message: Set(self.error_message.clone()),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
        })
    }

    /// Like [`Self::to_active_model`] but leaves identity and creation
    /// columns alone.
    pub fn to_update_model(&self) -> Result<diagnostic::ActiveModel, AppError> {
        let mut active = self.to_active_model()?;
        active.device_id = NotSet;
        active.user_id = NotSet;
        active.created_at = NotSet;
        Ok(active)
    }
}

fn split_report(report: &Option<ComponentReport>) -> (Option<ComponentStatus>, Option<Value>) {
    match report {
        Some(r) => (Some(r.status), Some(r.metrics.clone())),
        None => (None, None),
    }
}

fn join_report(status: Option<ComponentStatus>, metrics: Option<Value>) -> Option<ComponentReport> {
    status.map(|status| ComponentReport {
        status,
        metrics: metrics.unwrap_or_else(|| Value::Object(Default::default())),
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Validation(e.to_string()))
}

impl TryFrom<diagnostic::Model> for DiagnosticResult {
    type Error = AppError;

    fn try_from(m: diagnostic::Model) -> Result<Self, Self::Error> {
        let malformed = |what: &str, e: &dyn std::fmt::Display| {
            AppError::MalformedResponse(format!("stored diagnostic {}: {what}: {e}", m.id))
        };

        let health_score = match m.health_score {
            Some(score) => Some(u8::try_from(score).map_err(|e| malformed("health_score", &e))?),
            None => None,
        };
        let issues: Vec<Issue> =
            serde_json::from_value(m.issues.clone()).map_err(|e| malformed("issues", &e))?;
        let recommendations: Vec<String> = serde_json::from_value(m.recommendations.clone())
            .map_err(|e| malformed("recommendations", &e))?;

        let result = Self {
            id: m.id,
            device_id: m.device_id,
            user_id: m.user_id,
            status: m.status,
            cpu: join_report(m.cpu_status, m.cpu_metrics),
            memory: join_report(m.memory_status, m.memory_metrics),
            disk: join_report(m.disk_status, m.disk_metrics),
            network: join_report(m.network_status, m.network_metrics),
            battery: join_report(m.battery_status, m.battery_metrics),
            antivirus: m.antivirus_metrics,
            driver: m.driver_metrics,
            health_score,
            issues,
            recommendations,
            client_name: m.client_name,
            client_phone: m.client_phone,
            raw_data: m.raw_data,
            error_message: m.error_message,
            created_at: m.created_at,
            updated_at: m.updated_at,
        };
        result
            .validate()
            .map_err(|e| AppError::MalformedResponse(e.to_string()))?;
        Ok(result)
    }
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

/// Query for one page of diagnostic history. Also the query string of
/// `GET /api/v1/diagnostic/history/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryFilter {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DiagnosticStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            device_id: None,
            status: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl HistoryFilter {
    pub const MAX_LIMIT: u64 = 100;
    /// Highest page whose row offset still fits a SQL `OFFSET`.
    pub const MAX_PAGE: u64 = i64::MAX as u64 / Self::MAX_LIMIT;

    pub fn page(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit,
            ..Default::default()
        }
    }

    /// `1 <= page <= MAX_PAGE`, `1 <= limit <= MAX_LIMIT`.
    pub fn normalized(&self) -> Self {
        Self {
            page: self.page.clamp(1, Self::MAX_PAGE),
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
            ..self.clone()
        }
    }

    pub fn matches(&self, d: &DiagnosticResult) -> bool {
        self.device_id.as_deref().is_none_or(|id| d.device_id == id)
            && self.status.is_none_or(|s| d.status == s)
            && self.start_date.is_none_or(|start| d.created_at >= start)
            && self.end_date.is_none_or(|end| d.created_at <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl<T> HistoryPage<T> {
    pub fn new(data: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        Self {
            data,
            total,
            page: page.max(1),
            limit,
            pages: total.div_ceil(limit),
        }
    }

    /// Slices one page out of an already filtered and sorted list.
    pub fn paginate(items: Vec<T>, page: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total = items.len() as u64;
        let skip = usize::try_from((page - 1).saturating_mul(limit)).unwrap_or(usize::MAX);
        let data = items.into_iter().skip(skip).take(limit as usize).collect();
        Self::new(data, total, page, limit)
    }

    pub fn empty(page: u64, limit: u64) -> Self {
        Self::new(Vec::new(), 0, page, limit)
    }
}
