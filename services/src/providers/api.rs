//! Provider speaking JSON to the primary API.
//!
//! Responses come wrapped in `{ success, data, message }`. Anything that does
//! not decode into the expected shape, or decodes into a diagnostic that
//! fails [`DiagnosticResult::validate`], is reported as `MalformedResponse`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use util::config;
use util::http::{Liveness, probe};

use crate::error::AppError;
use crate::provider::DataProvider;
use crate::session::Context;
use crate::types::{
    ClientInfo, Device, DeviceUpdate, DiagnosticResult, FullDiagnosticRequest, HistoryFilter,
    HistoryPage, NewDevice,
};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct ApiProvider {
    client: Client,
    base_url: String,
}

impl ApiProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    /// Uses `API_URL` and `API_TIMEOUT_SECS`.
    pub fn from_config() -> Result<Self, AppError> {
        Self::new(
            config::api_url(),
            Duration::from_secs(config::api_timeout_secs()),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, ctx: &Context, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match ctx.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_body(builder: RequestBuilder) -> Result<(StatusCode, Vec<u8>), AppError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }

    fn error_for(status: StatusCode, body: &[u8]) -> AppError {
        let message = serde_json::from_slice::<Envelope<serde_json::Value>>(body)
            .map(|e| e.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());
        match status {
            StatusCode::UNAUTHORIZED => AppError::NotAuthenticated,
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            StatusCode::CONFLICT => AppError::Conflict(message),
            StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => {
                AppError::Validation(message)
            }
            other => AppError::Http {
                status: other.as_u16(),
                message,
            },
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AppError> {
        let (status, body) = Self::read_body(builder).await?;
        if !status.is_success() {
            return Err(Self::error_for(status, &body));
        }

        let envelope: Envelope<T> = serde_json::from_slice(&body)
            .map_err(|e| AppError::MalformedResponse(e.to_string()))?;
        if !envelope.success {
            return Err(AppError::MalformedResponse(format!(
                "success=false on HTTP {status}: {}",
                envelope.message
            )));
        }
        envelope
            .data
            .ok_or_else(|| AppError::MalformedResponse("response has no data".into()))
    }

    /// For endpoints whose `data` carries nothing useful.
    async fn send_unit(&self, builder: RequestBuilder) -> Result<(), AppError> {
        let (status, body) = Self::read_body(builder).await?;
        if !status.is_success() {
            return Err(Self::error_for(status, &body));
        }
        Ok(())
    }

    async fn send_diagnostic(&self, builder: RequestBuilder) -> Result<DiagnosticResult, AppError> {
        let diagnostic: DiagnosticResult = self.send(builder).await?;
        checked(diagnostic)
    }

    /// `GET /health`.
    pub async fn health(&self) -> Liveness {
        probe(&self.client, &format!("{}/health", self.base_url)).await
    }

    /// Runs a diagnostic on the API host. Primary only, never falls back.
    pub async fn run_full_diagnostic(
        &self,
        ctx: &Context,
        device_id: &str,
        client: &ClientInfo,
    ) -> Result<DiagnosticResult, AppError> {
        let body = FullDiagnosticRequest {
            device_id: device_id.to_owned(),
            client_name: client.name.clone(),
            client_phone: client.phone.clone(),
        };
        self.send_diagnostic(
            self.request(ctx, Method::POST, "/api/v1/diagnostic/full")
                .json(&body),
        )
        .await
    }
}

fn checked(diagnostic: DiagnosticResult) -> Result<DiagnosticResult, AppError> {
    diagnostic
        .validate()
        .map_err(|e| AppError::MalformedResponse(e.to_string()))?;
    Ok(diagnostic)
}

#[async_trait]
impl DataProvider for ApiProvider {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn get_devices(&self, ctx: &Context) -> Result<Vec<Device>, AppError> {
        self.send(self.request(ctx, Method::GET, "/api/v1/devices"))
            .await
    }

    async fn get_device(&self, ctx: &Context, id: &str) -> Result<Device, AppError> {
        self.send(self.request(ctx, Method::GET, &format!("/api/v1/devices/{id}")))
            .await
    }

    async fn create_device(&self, ctx: &Context, device: &NewDevice) -> Result<Device, AppError> {
        self.send(self.request(ctx, Method::POST, "/api/v1/devices").json(device))
            .await
    }

    async fn update_device(
        &self,
        ctx: &Context,
        id: &str,
        patch: &DeviceUpdate,
    ) -> Result<Device, AppError> {
        self.send(
            self.request(ctx, Method::PUT, &format!("/api/v1/devices/{id}"))
                .json(patch),
        )
        .await
    }

    async fn delete_device(&self, ctx: &Context, id: &str) -> Result<(), AppError> {
        self.send_unit(self.request(ctx, Method::DELETE, &format!("/api/v1/devices/{id}")))
            .await
    }

    async fn get_diagnostics(&self, ctx: &Context) -> Result<Vec<DiagnosticResult>, AppError> {
        let list: Vec<DiagnosticResult> = self
            .send(self.request(ctx, Method::GET, "/api/v1/diagnostics"))
            .await?;
        list.into_iter().map(checked).collect()
    }

    async fn get_diagnostic(&self, ctx: &Context, id: &str) -> Result<DiagnosticResult, AppError> {
        self.send_diagnostic(self.request(ctx, Method::GET, &format!("/api/v1/diagnostics/{id}")))
            .await
    }

    async fn save_diagnostic(
        &self,
        ctx: &Context,
        diagnostic: &DiagnosticResult,
    ) -> Result<DiagnosticResult, AppError> {
        self.send_diagnostic(
            self.request(ctx, Method::POST, "/api/v1/diagnostics")
                .json(diagnostic),
        )
        .await
    }

    async fn update_diagnostic(
        &self,
        ctx: &Context,
        diagnostic: &DiagnosticResult,
    ) -> Result<DiagnosticResult, AppError> {
        self.send_diagnostic(
            self.request(
                ctx,
                Method::PUT,
                &format!("/api/v1/diagnostics/{}", diagnostic.id),
            )
            .json(diagnostic),
        )
        .await
    }

    async fn get_diagnostic_history(
        &self,
        ctx: &Context,
        filter: &HistoryFilter,
    ) -> Result<HistoryPage<DiagnosticResult>, AppError> {
        let page: HistoryPage<DiagnosticResult> = self
            .send(
                self.request(ctx, Method::GET, "/api/v1/diagnostic/history/")
                    .query(&filter.normalized()),
            )
            .await?;
        if page.data.len() as u64 > page.limit || page.pages != page.total.div_ceil(page.limit.max(1))
        {
            return Err(AppError::MalformedResponse(
                "history page metadata is inconsistent".into(),
            ));
        }
        let data = page.data.into_iter().map(checked).collect::<Result<_, _>>()?;
        Ok(HistoryPage { data, ..page })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses_map_to_domain_errors() {
        let body = br#"{"success":false,"data":null,"message":"Device not found"}"#;
        assert!(matches!(
            ApiProvider::error_for(StatusCode::NOT_FOUND, body),
            AppError::NotFound(m) if m == "Device not found"
        ));
        assert!(matches!(
            ApiProvider::error_for(StatusCode::UNAUTHORIZED, body),
            AppError::NotAuthenticated
        ));
        assert!(matches!(
            ApiProvider::error_for(StatusCode::BAD_GATEWAY, b"upstream down"),
            AppError::Http { status: 502, message } if message == "upstream down"
        ));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let provider = ApiProvider::new("http://127.0.0.1:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.base_url(), "http://127.0.0.1:3000");
    }

    #[tokio::test]
    async fn unreachable_primary_is_a_network_error() {
        let provider = ApiProvider::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = provider.get_devices(&Context::anonymous()).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)), "got {err:?}");
        assert!(!provider.health().await.alive);
    }
}
