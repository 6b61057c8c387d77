//! HTTP implementation of [`RecordGateway`]

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::ApiError;
use crate::gateway::{ApiResult, RecordGateway};
use crate::record::{NewRecord, Record, RecordId, RecordPatch};

/// Collection endpoint used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/transporte";

/// Connection settings for [`HttpGateway`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Collection URL (e.g. "http://127.0.0.1:8000/transporte")
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("transport-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Some endpoints wrap the record as `{ "message": ..., "data": record }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "message")]
    detail: Option<serde_json::Value>,
}

/// reqwest-backed gateway against a REST collection endpoint.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn collection_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn item_url(&self, id: &RecordId) -> String {
        format!("{}/{}", self.collection_url(), id)
    }

    /// Map a status >= 400 into an [`ApiError`], reading the server's
    /// `detail`/`message` field when one is present.
    async fn check(
        response: reqwest::Response,
        id: Option<&RecordId>,
    ) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if !status.is_client_error() && !status.is_server_error() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(ApiError::NotFound { id: id.to_string() });
            }
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .map(|detail| match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        warn!(status = status.as_u16(), %message, "Gateway request failed");
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ApiResult<T> {
        let envelope: Envelope<T> = serde_json::from_slice(bytes)?;
        Ok(envelope.into_inner())
    }
}

#[async_trait]
impl RecordGateway for HttpGateway {
    #[instrument(skip_all, fields(url = %self.config.base_url))]
    async fn list(&self) -> ApiResult<Vec<Record>> {
        let response = self.client.get(self.collection_url()).send().await?;
        let response = Self::check(response, None).await?;
        let bytes = response.bytes().await?;
        let records: Vec<Record> = Self::decode(&bytes)?;
        debug!(count = records.len(), "Listed records");
        Ok(records)
    }

    #[instrument(skip_all, fields(name = %record.name))]
    async fn create(&self, record: &NewRecord) -> ApiResult<Record> {
        let response = self
            .client
            .post(self.collection_url())
            .json(record)
            .send()
            .await?;
        let response = Self::check(response, None).await?;
        let bytes = response.bytes().await?;
        let created: Record = Self::decode(&bytes)?;
        info!(id = %created.id, "Record created");
        Ok(created)
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> ApiResult<Option<Record>> {
        let response = self
            .client
            .put(self.item_url(id))
            .json(patch)
            .send()
            .await?;
        let response = Self::check(response, Some(id)).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        match Self::decode::<Record>(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // Acknowledgement-only bodies carry no record.
                debug!(error = %e, "Update response carried no record");
                Ok(None)
            }
        }
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn delete(&self, id: &RecordId) -> ApiResult<()> {
        let response = self.client.delete(self.item_url(id)).send().await?;
        Self::check(response, Some(id)).await?;
        info!("Record deleted");
        Ok(())
    }
}
