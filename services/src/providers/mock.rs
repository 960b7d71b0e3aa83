//! Fixed fixtures served when no real backend answers.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::error::AppError;
use crate::provider::DataProvider;
use crate::session::Context;
use crate::types::{
    ComponentReport, ComponentStatus, Device, DeviceType, DeviceUpdate, DiagnosticResult,
    DiagnosticStatus, HistoryFilter, HistoryPage, Issue, NewDevice, Severity,
};

pub const MOCK_USER_ID: &str = "mock-user";

fn epoch() -> DateTime<Utc> {
    // 2025-01-15T10:00:00Z
    DateTime::from_timestamp(1_736_935_200, 0).unwrap_or_default()
}

fn report(status: ComponentStatus, metrics: serde_json::Value) -> Option<ComponentReport> {
    Some(ComponentReport { status, metrics })
}

/// Read-only fixtures: two devices and three diagnostics.
///
/// With `fabricate_writes` the provider also "accepts" writes by echoing
/// back an invented record; nothing is stored.
#[derive(Debug, Clone)]
pub struct MockProvider {
    devices: Vec<Device>,
    diagnostics: Vec<DiagnosticResult>,
    fabricate_writes: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        let t0 = epoch();
        let devices = vec![
            Device {
                id: "mock-device-1".into(),
                user_id: MOCK_USER_ID.into(),
                name: "Front Desk PC".into(),
                device_type: DeviceType::Desktop,
                os_name: Some("Windows".into()),
                os_version: Some("11 Pro".into()),
                processor: Some("Intel Core i5-12400".into()),
                ram: Some("16 GB".into()),
                storage: Some("512 GB SSD".into()),
                last_diagnostic_id: Some("mock-diagnostic-1".into()),
                created_at: t0,
                updated_at: t0 + Duration::days(2),
            },
            Device {
                id: "mock-device-2".into(),
                user_id: MOCK_USER_ID.into(),
                name: "Technician Laptop".into(),
                device_type: DeviceType::Laptop,
                os_name: Some("macOS".into()),
                os_version: Some("14.5".into()),
                processor: Some("Apple M2".into()),
                ram: Some("8 GB".into()),
                storage: Some("256 GB SSD".into()),
                last_diagnostic_id: Some("mock-diagnostic-2".into()),
                created_at: t0,
                updated_at: t0 + Duration::days(1),
            },
        ];

        let diagnostics = vec![
            DiagnosticResult {
                id: "mock-diagnostic-1".into(),
                device_id: "mock-device-1".into(),
                user_id: MOCK_USER_ID.into(),
                status: DiagnosticStatus::Completed,
                cpu: report(ComponentStatus::Normal, json!({ "usage_percent": 34.0, "cores": 6 })),
                memory: report(ComponentStatus::Normal, json!({ "usage_percent": 58.0 })),
                disk: report(ComponentStatus::Normal, json!({ "usage_percent": 61.0 })),
                network: report(
                    ComponentStatus::Normal,
                    json!({ "online": true, "connection_type": "ethernet" }),
                ),
                battery: None,
                antivirus: Some(json!({ "enabled": true, "up_to_date": true })),
                driver: None,
                health_score: Some(100),
                issues: Vec::new(),
                recommendations: Vec::new(),
                client_name: Some("Walk-in".into()),
                client_phone: None,
                raw_data: None,
                error_message: None,
                created_at: t0 + Duration::days(2),
                updated_at: t0 + Duration::days(2),
            },
            DiagnosticResult {
                id: "mock-diagnostic-2".into(),
                device_id: "mock-device-2".into(),
                user_id: MOCK_USER_ID.into(),
                status: DiagnosticStatus::Completed,
                cpu: report(ComponentStatus::Normal, json!({ "usage_percent": 41.0, "cores": 8 })),
                memory: report(ComponentStatus::Critical, json!({ "usage_percent": 91.0 })),
                disk: report(ComponentStatus::Warning, json!({ "usage_percent": 84.0 })),
                network: report(
                    ComponentStatus::Normal,
                    json!({ "online": true, "connection_type": "wifi" }),
                ),
                battery: report(
                    ComponentStatus::Normal,
                    json!({ "level_percent": 76.0, "charging": false }),
                ),
                antivirus: None,
                driver: None,
                health_score: Some(75),
                issues: vec![Issue {
                    category: "memory".into(),
                    severity: Severity::High,
                    description: "Memory usage is 91% (limit 85%)".into(),
                }],
                recommendations: vec![
                    "Close unused applications or add more RAM".into(),
                ],
                client_name: Some("Naledi M.".into()),
                client_phone: Some("+27 82 555 0134".into()),
                raw_data: None,
                error_message: None,
                created_at: t0 + Duration::days(1),
                updated_at: t0 + Duration::days(1),
            },
            DiagnosticResult {
                id: "mock-diagnostic-3".into(),
                device_id: "mock-device-1".into(),
                user_id: MOCK_USER_ID.into(),
                status: DiagnosticStatus::Failed,
                cpu: report(ComponentStatus::Normal, json!({ "usage_percent": 22.0, "cores": 6 })),
                memory: None,
                disk: None,
                network: None,
                battery: None,
                antivirus: None,
                driver: None,
                health_score: None,
                issues: Vec::new(),
                recommendations: Vec::new(),
                client_name: None,
                client_phone: None,
                raw_data: None,
                error_message: Some("memory probe timed out".into()),
                created_at: t0,
                updated_at: t0,
            },
        ];

        Self {
            devices,
            diagnostics,
            fabricate_writes: false,
        }
    }

    pub fn fabricating_writes(mut self, enabled: bool) -> Self {
        self.fabricate_writes = enabled;
        self
    }

    pub fn devices(&self) -> Vec<Device> {
        self.devices.clone()
    }

    pub fn device(&self, id: &str) -> Result<Device, AppError> {
        self.devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("device {id}")))
    }

    /// Newest first.
    pub fn diagnostics(&self) -> Vec<DiagnosticResult> {
        let mut list = self.diagnostics.clone();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn diagnostic(&self, id: &str) -> Result<DiagnosticResult, AppError> {
        self.diagnostics
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("diagnostic {id}")))
    }

    pub fn history(&self, filter: &HistoryFilter) -> HistoryPage<DiagnosticResult> {
        let filter = filter.normalized();
        let matching: Vec<DiagnosticResult> = self
            .diagnostics()
            .into_iter()
            .filter(|d| filter.matches(d))
            .collect();
        HistoryPage::paginate(matching, filter.page, filter.limit)
    }

    fn ensure_writable(&self, op: &str) -> Result<(), AppError> {
        if self.fabricate_writes {
            tracing::warn!(op, "mock provider fabricating a successful write");
            Ok(())
        } else {
            Err(AppError::Unsupported(format!(
                "mock data is read-only ({op})"
            )))
        }
    }
}

#[async_trait]
impl DataProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_devices(&self, _ctx: &Context) -> Result<Vec<Device>, AppError> {
        Ok(self.devices())
    }

    async fn get_device(&self, _ctx: &Context, id: &str) -> Result<Device, AppError> {
        self.device(id)
    }

    async fn create_device(&self, ctx: &Context, new: &NewDevice) -> Result<Device, AppError> {
        self.ensure_writable("create_device")?;
        let now = Utc::now();
        Ok(Device {
            id: format!("mock-{}", uuid::Uuid::new_v4()),
            user_id: ctx
                .session()
                .map(|s| s.user_id().to_owned())
                .unwrap_or_else(|| MOCK_USER_ID.into()),
            name: new.name.trim().to_owned(),
            device_type: new.device_type,
            os_name: new.os_name.clone(),
            os_version: new.os_version.clone(),
            processor: new.processor.clone(),
            ram: new.ram.clone(),
            storage: new.storage.clone(),
            last_diagnostic_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_device(
        &self,
        _ctx: &Context,
        id: &str,
        patch: &DeviceUpdate,
    ) -> Result<Device, AppError> {
        self.ensure_writable("update_device")?;
        let mut device = self.device(id)?;
        patch.apply_to(&mut device);
        Ok(device)
    }

    async fn delete_device(&self, _ctx: &Context, id: &str) -> Result<(), AppError> {
        self.ensure_writable("delete_device")?;
        self.device(id).map(|_| ())
    }

    async fn get_diagnostics(&self, _ctx: &Context) -> Result<Vec<DiagnosticResult>, AppError> {
        Ok(self.diagnostics())
    }

    async fn get_diagnostic(&self, _ctx: &Context, id: &str) -> Result<DiagnosticResult, AppError> {
        self.diagnostic(id)
    }

    async fn save_diagnostic(
        &self,
        _ctx: &Context,
        diagnostic: &DiagnosticResult,
    ) -> Result<DiagnosticResult, AppError> {
        self.ensure_writable("save_diagnostic")?;
        Ok(diagnostic.clone())
    }

    async fn update_diagnostic(
        &self,
        _ctx: &Context,
        diagnostic: &DiagnosticResult,
    ) -> Result<DiagnosticResult, AppError> {
        self.ensure_writable("update_diagnostic")?;
        let mut echoed = diagnostic.clone();
        echoed.updated_at = Utc::now();
        Ok(echoed)
    }

    async fn get_diagnostic_history(
        &self,
        _ctx: &Context,
        filter: &HistoryFilter,
    ) -> Result<HistoryPage<DiagnosticResult>, AppError> {
        Ok(self.history(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_hold_their_own_invariants() {
        let mock = MockProvider::new();
        assert_eq!(mock.devices().len(), 2);
        for d in mock.diagnostics() {
            d.validate().unwrap();
        }
        for device in mock.devices() {
            let last = mock.diagnostic(device.last_diagnostic_id.as_deref().unwrap()).unwrap();
            assert_eq!(last.device_id, device.id);
        }
    }

    #[test]
    fn history_filters_by_device() {
        let mock = MockProvider::new();
        let page = mock.history(&HistoryFilter {
            device_id: Some("mock-device-1".into()),
            ..Default::default()
        });
        assert_eq!(page.total, 2);
        assert!(page.data.iter().all(|d| d.device_id == "mock-device-1"));
        assert_eq!(page.data[0].id, "mock-diagnostic-1");
    }

    #[tokio::test]
    async fn writes_are_refused_unless_fabricating() {
        let ctx = Context::anonymous();
        let new = NewDevice::named("Till", DeviceType::Desktop);

        let err = MockProvider::new().create_device(&ctx, &new).await.unwrap_err();
        assert!(matches!(err, AppError::Unsupported(_)));

        let made = MockProvider::new()
            .fabricating_writes(true)
            .create_device(&ctx, &new)
            .await
            .unwrap();
        assert_eq!(made.name, "Till");
        assert!(made.id.starts_with("mock-"));
    }
}
