// Document service - Use cases behind the dashboards-document endpoints
use crate::application::document_repository::DocumentRepository;
use crate::domain::dashboard::{Dashboard, DashboardsDocument};
use rand::RngCore;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

const MAX_NAME_LEN: usize = 40;
const DEFAULT_NEW_NAME: &str = "New";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("failed to read document: {0}")]
    Read(#[source] anyhow::Error),

    #[error("failed to write document: {0}")]
    Write(#[source] anyhow::Error),
}

#[derive(Clone)]
pub struct DocumentService {
    repository: Arc<dyn DocumentRepository>,
    // Serializes read-modify-write cycles
    write_lock: Arc<Mutex<()>>,
}

impl DocumentService {
    pub fn new(repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            repository,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load may seed the file, so it holds the write lock too.
    pub async fn get_document(&self) -> Result<DashboardsDocument, DocumentError> {
        let _guard = self.write_lock.lock().await;
        self.repository.load().await.map_err(DocumentError::Read)
    }

    /// Replace the whole document. The payload must carry a `dashboards` array.
    pub async fn replace_document(&self, payload: Value) -> Result<(), DocumentError> {
        let document = parse_document(payload)?;

        let _guard = self.write_lock.lock().await;
        self.repository
            .save(&document)
            .await
            .map_err(DocumentError::Write)?;

        tracing::info!(
            dashboards = document.dashboards.len(),
            active_id = %document.active_id,
            "Dashboards document replaced"
        );
        Ok(())
    }

    /// Append an empty dashboard, make it active, return its id.
    pub async fn create_dashboard(&self, name: Option<&str>) -> Result<String, DocumentError> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.repository.load().await.map_err(DocumentError::Read)?;
        let id = new_dashboard_id();
        let name = normalize_name(name);

        document.dashboards.push(Dashboard::new(id.clone(), name));
        document.active_id = id.clone();

        self.repository
            .save(&document)
            .await
            .map_err(DocumentError::Write)?;

        tracing::info!(%id, "Dashboard created");
        Ok(id)
    }
}

fn parse_document(payload: Value) -> Result<DashboardsDocument, DocumentError> {
    if !payload.get("dashboards").is_some_and(Value::is_array) {
        return Err(DocumentError::InvalidPayload(
            "missing dashboards array".to_string(),
        ));
    }
    serde_json::from_value(payload).map_err(|e| DocumentError::InvalidPayload(e.to_string()))
}

fn normalize_name(name: Option<&str>) -> String {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return DEFAULT_NEW_NAME.to_string();
    }
    name.chars().take(MAX_NAME_LEN).collect()
}

fn new_dashboard_id() -> String {
    let mut bytes = [0u8; 6];
    rand::thread_rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("d{hex}")
}
