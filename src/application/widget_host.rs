// Widget host - Reconciles mounted widget instances against the item list
use crate::application::canvas::{ContainerLookup, WidgetContainer};
use crate::application::widget_registry::{WidgetContext, WidgetInstance, WidgetRegistry, WidgetServices};
use crate::domain::dashboard::DashboardsDocument;
use crate::domain::item::Item;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

struct Mounted {
    kind: String,
    container: WidgetContainer,
    instance: Box<dyn WidgetInstance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub mounted: usize,
    pub updated: usize,
    pub unmounted: usize,
    pub unknown_type: usize,
    pub missing_container: usize,
}

/// Keeps at most one live instance per item id. Every mount is paired with
/// exactly one unmount, either on removal, remount or [`WidgetHost::dispose`].
pub struct WidgetHost {
    registry: WidgetRegistry,
    services: Arc<WidgetServices>,
    mounted: HashMap<String, Mounted>,
}

impl WidgetHost {
    pub fn new(registry: WidgetRegistry, services: Arc<WidgetServices>) -> Self {
        Self {
            registry,
            services,
            mounted: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn services(&self) -> &Arc<WidgetServices> {
        &self.services
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_mounted(&self, item_id: &str) -> bool {
        self.mounted.contains_key(item_id)
    }

    pub fn sync(
        &mut self,
        items: &[Item],
        containers: &dyn ContainerLookup,
        document: &Arc<DashboardsDocument>,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        // 1) Drop instances whose item is gone
        let present: HashSet<&str> = items.iter().map(|it| it.id.as_str()).collect();
        let stale: Vec<String> = self
            .mounted
            .keys()
            .filter(|id| !present.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            if self.unmount(&id) {
                report.unmounted += 1;
            }
        }

        // 2) Mount or update what is present
        for item in items {
            let Some(module) = self.registry.get(&item.kind) else {
                tracing::warn!(item_id = %item.id, kind = %item.kind, "Unknown widget type, skipping");
                report.unknown_type += 1;
                continue;
            };
            let Some(container) = containers.container(&item.id) else {
                tracing::debug!(item_id = %item.id, "Container not ready, retrying on next sync");
                report.missing_container += 1;
                continue;
            };

            let ctx = WidgetContext {
                item: item.clone(),
                document: Arc::clone(document),
                services: Arc::clone(&self.services),
            };

            let needs_remount = match self.mounted.get(&item.id) {
                None => true,
                Some(m) => m.kind != item.kind || !m.container.same_as(&container),
            };

            if needs_remount {
                if self.unmount(&item.id) {
                    report.unmounted += 1;
                }
                container.clear();
                let instance = module.mount(&container, ctx);
                self.mounted.insert(
                    item.id.clone(),
                    Mounted {
                        kind: item.kind.clone(),
                        container,
                        instance,
                    },
                );
                report.mounted += 1;
            } else if let Some(m) = self.mounted.get_mut(&item.id) {
                module.update(m.instance.as_mut(), ctx);
                report.updated += 1;
            }
        }

        tracing::debug!(?report, "Widget host synced");
        report
    }

    /// Unmount everything.
    pub fn dispose(&mut self) {
        let ids: Vec<String> = self.mounted.keys().cloned().collect();
        for id in ids {
            self.unmount(&id);
        }
    }

    fn unmount(&mut self, item_id: &str) -> bool {
        let Some(mut m) = self.mounted.remove(item_id) else {
            return false;
        };
        match self.registry.get(&m.kind) {
            Some(module) => module.unmount(m.instance.as_mut()),
            None => m.instance.unmount(),
        }
        true
    }
}

impl Drop for WidgetHost {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::application::widget_registry::{WidgetMeta, WidgetModule, WidgetSize};
    use serde_json::{Map, json};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Mount(String),
        Update(String),
        Unmount(String),
    }

    pub type CallLog = Arc<Mutex<Vec<Call>>>;

    pub struct RecordingModule {
        meta: WidgetMeta,
        log: CallLog,
    }

    struct RecordingInstance {
        item_id: String,
        log: CallLog,
        live: bool,
    }

    impl RecordingModule {
        pub fn new(kind: &'static str, log: CallLog) -> Self {
            Self {
                meta: WidgetMeta {
                    kind,
                    label: kind,
                    size: WidgetSize { w: 1, h: 1 },
                    defaults: Map::new(),
                    fields: Vec::new(),
                },
                log,
            }
        }
    }

    impl WidgetModule for RecordingModule {
        fn meta(&self) -> &WidgetMeta {
            &self.meta
        }

        fn mount(&self, container: &WidgetContainer, ctx: WidgetContext) -> Box<dyn WidgetInstance> {
            container.render(json!({"mounted": ctx.item.id}));
            self.log.lock().unwrap().push(Call::Mount(ctx.item.id.clone()));
            Box::new(RecordingInstance {
                item_id: ctx.item.id,
                log: Arc::clone(&self.log),
                live: true,
            })
        }
    }

    impl WidgetInstance for RecordingInstance {
        fn update(&mut self, ctx: WidgetContext) {
            self.log.lock().unwrap().push(Call::Update(ctx.item.id));
        }

        fn unmount(&mut self) {
            if std::mem::replace(&mut self.live, false) {
                self.log.lock().unwrap().push(Call::Unmount(self.item_id.clone()));
            }
        }
    }

    pub fn services() -> Arc<WidgetServices> {
        Arc::new(WidgetServices::new(
            reqwest::Url::parse("http://127.0.0.1:9").unwrap(),
        ))
    }

    pub fn recording_registry(log: &CallLog) -> WidgetRegistry {
        let mut registry = WidgetRegistry::new();
        registry.register(Arc::new(RecordingModule::new("value1x1", Arc::clone(log))));
        registry.register(Arc::new(RecordingModule::new("gauge3x3", Arc::clone(log))));
        registry
    }
}
