// File-backed document repository
use crate::application::document_repository::DocumentRepository;
use crate::domain::dashboard::DashboardsDocument;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const FILE_NAME: &str = "dashboards.json";

#[derive(Debug, Clone)]
pub struct FileDocumentRepository {
    data_dir: PathBuf,
}

impl FileDocumentRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(FILE_NAME)
    }

    fn tmp_path(&self) -> PathBuf {
        self.data_dir.join(format!("{FILE_NAME}.tmp"))
    }

    async fn ensure_seeded(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.data_dir.display()))?;

        if !tokio::fs::try_exists(self.path()).await? {
            tracing::info!(path = %self.path().display(), "Seeding default dashboards document");
            self.write_atomically(&DashboardsDocument::default()).await?;
        }
        Ok(())
    }

    async fn write_atomically(&self, document: &DashboardsDocument) -> Result<()> {
        let body = serde_json::to_vec_pretty(document)?;
        let tmp = self.tmp_path();

        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        rename(&tmp, &self.path()).await
    }
}

async fn rename(from: &Path, to: &Path) -> Result<()> {
    tokio::fs::rename(from, to)
        .await
        .with_context(|| format!("Failed to move {} to {}", from.display(), to.display()))
}

#[async_trait]
impl DocumentRepository for FileDocumentRepository {
    async fn load(&self) -> Result<DashboardsDocument> {
        self.ensure_seeded().await?;

        let raw = tokio::fs::read(self.path())
            .await
            .with_context(|| format!("Failed to read {}", self.path().display()))?;
        let document = serde_json::from_slice(&raw).context("Failed to parse dashboards document")?;
        Ok(document)
    }

    async fn save(&self, document: &DashboardsDocument) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        self.write_atomically(document).await?;
        tracing::debug!(path = %self.path().display(), "Dashboards document saved");
        Ok(())
    }
}
