use course_tracker::training::{InMemoryRecordStore, ReportConfig, TrainingService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type InMemoryTrainingService = TrainingService<InMemoryRecordStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// A service backed by a fresh, empty in-memory store.
pub(crate) fn in_memory_service(report: ReportConfig) -> Arc<InMemoryTrainingService> {
    let store = Arc::new(InMemoryRecordStore::new());
    Arc::new(TrainingService::new(store, report))
}
