// Gateway trait for durable dashboard state
use crate::domain::dashboard::DashboardsDocument;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("request to document store failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("document store rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Fetch the full persisted document
    async fn fetch_state(&self) -> Result<DashboardsDocument, PersistenceError>;

    /// Atomically replace the persisted document; no partial write on failure
    async fn commit_state(&self, next: &DashboardsDocument) -> Result<(), PersistenceError>;

    /// Create an empty dashboard server-side, make it active, return its id
    async fn create_dashboard(&self, name: &str) -> Result<String, PersistenceError>;
}
