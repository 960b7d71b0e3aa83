//! Provider over the local sea-orm database. Every row is scoped to the
//! session's user, so a live session is required for all operations.

use async_trait::async_trait;
use chrono::Utc;
use db::models::{device, diagnostic};
use db::repository::Repository;
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, Set};
use util::filters::FilterParam;
use validator::Validate;

use crate::error::AppError;
use crate::provider::DataProvider;
use crate::session::Context;
use crate::types::{
    Device, DeviceUpdate, DiagnosticResult, DiagnosticStatus, HistoryFilter, HistoryPage,
    NewDevice,
};

type DiagnosticRepository = Repository<diagnostic::Entity, diagnostic::Column>;

#[derive(Clone)]
pub struct DatabaseProvider {
    db: DatabaseConnection,
}

impl DatabaseProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn load_device(&self, user_id: &str, id: &str) -> Result<device::Model, AppError> {
        device::Model::find_for_user(&self.db, user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("device {id}")))
    }

    async fn load_diagnostic(&self, user_id: &str, id: &str) -> Result<diagnostic::Model, AppError> {
        diagnostic::Model::find_for_user(&self.db, user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("diagnostic {id}")))
    }
}

fn history_filters(user_id: &str, filter: &HistoryFilter) -> Vec<FilterParam> {
    let mut params = vec![FilterParam::eq("user_id", user_id)];
    if let Some(device_id) = &filter.device_id {
        params.push(FilterParam::eq("device_id", device_id.as_str()));
    }
    if let Some(status) = filter.status {
        params.push(FilterParam::eq("status", status.to_string()));
    }
    if let Some(start) = filter.start_date {
        params.push(FilterParam::gte("created_at", start));
    }
    if let Some(end) = filter.end_date {
        params.push(FilterParam::lte("created_at", end));
    }
    params
}

#[async_trait]
impl DataProvider for DatabaseProvider {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn get_devices(&self, ctx: &Context) -> Result<Vec<Device>, AppError> {
        let session = ctx.require_session()?;
        let rows = device::Model::find_all_for_user(&self.db, session.user_id()).await?;
        Ok(rows.into_iter().map(Device::from).collect())
    }

    async fn get_device(&self, ctx: &Context, id: &str) -> Result<Device, AppError> {
        let session = ctx.require_session()?;
        Ok(self.load_device(session.user_id(), id).await?.into())
    }

    async fn create_device(&self, ctx: &Context, new: &NewDevice) -> Result<Device, AppError> {
        let session = ctx.require_session()?;
        new.validate()?;

        let created = new
            .clone()
            .into_active_model(session.user_id())
            .insert(&self.db)
            .await?;
        tracing::info!(device_id = %created.id, "device created");
        Ok(created.into())
    }

    async fn update_device(
        &self,
        ctx: &Context,
        id: &str,
        patch: &DeviceUpdate,
    ) -> Result<Device, AppError> {
        let session = ctx.require_session()?;
        patch.validate()?;
        let existing = self.load_device(session.user_id(), id).await?;

        if let Some(diagnostic_id) = &patch.last_diagnostic_id {
            let target = self.load_diagnostic(session.user_id(), diagnostic_id).await?;
            if target.device_id != existing.id {
                return Err(AppError::Validation(format!(
                    "diagnostic {diagnostic_id} belongs to another device"
                )));
            }
        }

        let mut merged = Device::from(existing.clone());
        patch.apply_to(&mut merged);

        let mut active = existing.into_active_model();
        active.name = Set(merged.name);
        active.device_type = Set(merged.device_type);
        active.os_name = Set(merged.os_name);
        active.os_version = Set(merged.os_version);
        active.processor = Set(merged.processor);
        active.ram = Set(merged.ram);
        active.storage = Set(merged.storage);
        active.last_diagnostic_id = Set(merged.last_diagnostic_id);
        active.updated_at = Set(merged.updated_at);

        Ok(active.update(&self.db).await?.into())
    }

    async fn delete_device(&self, ctx: &Context, id: &str) -> Result<(), AppError> {
        let session = ctx.require_session()?;
        match device::Model::delete_for_user(&self.db, session.user_id(), id).await? {
            0 => Err(AppError::NotFound(format!("device {id}"))),
            _ => {
                tracing::info!(device_id = %id, "device deleted");
                Ok(())
            }
        }
    }

    async fn get_diagnostics(&self, ctx: &Context) -> Result<Vec<DiagnosticResult>, AppError> {
        let session = ctx.require_session()?;
        diagnostic::Model::find_all_for_user(&self.db, session.user_id())
            .await?
            .into_iter()
            .map(DiagnosticResult::try_from)
            .collect()
    }

    async fn get_diagnostic(&self, ctx: &Context, id: &str) -> Result<DiagnosticResult, AppError> {
        let session = ctx.require_session()?;
        self.load_diagnostic(session.user_id(), id).await?.try_into()
    }

    async fn save_diagnostic(
        &self,
        ctx: &Context,
        diagnostic: &DiagnosticResult,
    ) -> Result<DiagnosticResult, AppError> {
        let session = ctx.require_session()?;
        if diagnostic.status != DiagnosticStatus::Pending {
            return Err(AppError::Validation(format!(
                "new diagnostics must be pending, got {}",
                diagnostic.status
            )));
        }
        diagnostic.validate()?;
        self.load_device(session.user_id(), &diagnostic.device_id).await?;

        let mut record = diagnostic.clone();
        record.user_id = session.user_id().to_owned();

        let inserted = record.to_active_model()?.insert(&self.db).await?;
        tracing::debug!(diagnostic_id = %inserted.id, "diagnostic stored");
        inserted.try_into()
    }

    async fn update_diagnostic(
        &self,
        ctx: &Context,
        diagnostic: &DiagnosticResult,
    ) -> Result<DiagnosticResult, AppError> {
        let session = ctx.require_session()?;
        diagnostic.validate()?;

        let existing = self.load_diagnostic(session.user_id(), &diagnostic.id).await?;
        if !existing.status.can_transition_to(diagnostic.status) {
            return Err(AppError::InvalidTransition {
                from: existing.status,
                to: diagnostic.status,
            });
        }
        if existing.device_id != diagnostic.device_id {
            return Err(AppError::Validation(
                "a diagnostic cannot move to another device".into(),
            ));
        }

        let mut record = diagnostic.clone();
        record.updated_at = Utc::now();
        let updated = record.to_update_model()?.update(&self.db).await?;
        updated.try_into()
    }

    async fn get_diagnostic_history(
        &self,
        ctx: &Context,
        filter: &HistoryFilter,
    ) -> Result<HistoryPage<DiagnosticResult>, AppError> {
        let session = ctx.require_session()?;
        let filter = filter.normalized();
        let params = history_filters(session.user_id(), &filter);

        let (rows, total) = DiagnosticRepository::filter(
            &self.db,
            &params,
            filter.page,
            filter.limit,
            Some("-created_at"),
        )
        .await?;

        let data = rows
            .into_iter()
            .map(DiagnosticResult::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HistoryPage::new(data, total, filter.page, filter.limit))
    }
}
