// Dashboard store - Single-writer container for committed client state
use crate::application::persistence_gateway::{PersistenceError, PersistenceGateway};
use crate::domain::dashboard::DashboardsDocument;
use std::sync::Arc;

/// Holds the last committed document. Readers get an immutable snapshot;
/// the only way to change it is [`DashboardStore::commit`], which persists
/// first and swaps the snapshot only on success.
pub struct DashboardStore {
    gateway: Arc<dyn PersistenceGateway>,
    committed: Arc<DashboardsDocument>,
}

impl DashboardStore {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            committed: Arc::new(DashboardsDocument::default()),
        }
    }

    pub fn gateway(&self) -> &Arc<dyn PersistenceGateway> {
        &self.gateway
    }

    pub fn snapshot(&self) -> Arc<DashboardsDocument> {
        Arc::clone(&self.committed)
    }

    /// Replace local state with whatever the gateway currently holds.
    pub async fn reload(&mut self) -> Result<Arc<DashboardsDocument>, PersistenceError> {
        let document = self.gateway.fetch_state().await?;
        self.committed = Arc::new(document);
        Ok(self.snapshot())
    }

    pub async fn commit(
        &mut self,
        next: DashboardsDocument,
    ) -> Result<Arc<DashboardsDocument>, PersistenceError> {
        self.gateway.commit_state(&next).await?;
        self.committed = Arc::new(next);
        Ok(self.snapshot())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory gateway with a failure switch.
    #[derive(Default)]
    pub struct MemoryGateway {
        pub document: Mutex<DashboardsDocument>,
        pub fail: AtomicBool,
        pub commits: AtomicUsize,
    }

    impl MemoryGateway {
        pub fn with_document(document: DashboardsDocument) -> Self {
            Self {
                document: Mutex::new(document),
                ..Self::default()
            }
        }

        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        pub fn commit_count(&self) -> usize {
            self.commits.load(Ordering::SeqCst)
        }

        pub fn stored(&self) -> DashboardsDocument {
            self.document.lock().unwrap().clone()
        }

        fn check(&self) -> Result<(), PersistenceError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PersistenceError::Unavailable("offline".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PersistenceGateway for MemoryGateway {
        async fn fetch_state(&self) -> Result<DashboardsDocument, PersistenceError> {
            self.check()?;
            Ok(self.stored())
        }

        async fn commit_state(&self, next: &DashboardsDocument) -> Result<(), PersistenceError> {
            self.check()?;
            self.commits.fetch_add(1, Ordering::SeqCst);
            *self.document.lock().unwrap() = next.clone();
            Ok(())
        }

        async fn create_dashboard(&self, name: &str) -> Result<String, PersistenceError> {
            self.check()?;
            let mut doc = self.document.lock().unwrap();
            let id = format!("d{}", doc.dashboards.len() + 1);
            doc.dashboards
                .push(crate::domain::dashboard::Dashboard::new(id.clone(), name));
            doc.active_id = id.clone();
            Ok(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryGateway;
    use super::*;

    #[tokio::test]
    async fn test_commit_swaps_snapshot_only_on_success() {
        let gateway = Arc::new(MemoryGateway::default());
        let mut store = DashboardStore::new(gateway.clone());
        let before = store.snapshot();

        let mut next = (*before).clone();
        next.dashboards[0].name = "Reef".to_string();

        gateway.set_failing(true);
        assert!(store.commit(next.clone()).await.is_err());
        assert_eq!(*store.snapshot(), *before);

        gateway.set_failing(false);
        store.commit(next).await.unwrap();
        assert_eq!(store.snapshot().dashboards[0].name, "Reef");
        // Old snapshot held by a reader is untouched.
        assert_eq!(before.dashboards[0].name, "Main");
    }

    #[tokio::test]
    async fn test_reload_reads_gateway_state() {
        let mut doc = DashboardsDocument::default();
        doc.dashboards[0].name = "Remote".to_string();
        let mut store = DashboardStore::new(Arc::new(MemoryGateway::with_document(doc)));

        let snapshot = store.reload().await.unwrap();
        assert_eq!(snapshot.dashboards[0].name, "Remote");
    }
}
