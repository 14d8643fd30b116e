// Repository trait for the on-disk dashboards document
use crate::domain::dashboard::DashboardsDocument;
use async_trait::async_trait;

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Load the document, seeding the default one if none exists yet
    async fn load(&self) -> anyhow::Result<DashboardsDocument>;

    /// Durably replace the document
    async fn save(&self, document: &DashboardsDocument) -> anyhow::Result<()>;
}
