// HTTP persistence gateway against the dashboards-document endpoints
use crate::application::persistence_gateway::{PersistenceError, PersistenceGateway};
use crate::domain::dashboard::DashboardsDocument;
use async_trait::async_trait;
use serde::Deserialize;

pub const DOCUMENT_PATH: &str = "/dashboards-document";

#[derive(Debug, Clone)]
pub struct HttpPersistenceGateway {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

impl HttpPersistenceGateway {
    /// The endpoint is resolved under `base_url`'s path, so `http://host/app`
    /// talks to `http://host/app/dashboards-document`.
    pub fn new(client: reqwest::Client, base_url: &reqwest::Url) -> Result<Self, PersistenceError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(DOCUMENT_PATH.trim_start_matches('/'))
            .map_err(|e| PersistenceError::Unavailable(format!("bad base url {base_url}: {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PersistenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%status, %body, "Document store rejected request");
    Err(PersistenceError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl PersistenceGateway for HttpPersistenceGateway {
    async fn fetch_state(&self) -> Result<DashboardsDocument, PersistenceError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header("Accept", "application/json")
            .send()
            .await?;
        let document = check_status(response).await?.json().await?;
        Ok(document)
    }

    async fn commit_state(&self, next: &DashboardsDocument) -> Result<(), PersistenceError> {
        let response = self
            .client
            .put(self.endpoint.clone())
            .json(next)
            .send()
            .await?;
        check_status(response).await?;
        tracing::debug!(active_id = %next.active_id, "Dashboards document committed");
        Ok(())
    }

    async fn create_dashboard(&self, name: &str) -> Result<String, PersistenceError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;
        let created: CreatedResponse = check_status(response).await?.json().await?;
        Ok(created.id)
    }
}
