use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::queue::WorkQueue;
use crate::infrastructure::storage::ObjectStorage;
use crate::modules::video::producer::JobProducer;
use crate::modules::video::repository::VideoStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn VideoStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub producer: JobProducer,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn VideoStore>,
        queue: Arc<dyn WorkQueue>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let producer = JobProducer::new(store.clone(), queue, config.upload_dir.clone());
        Self {
            config,
            store,
            storage,
            producer,
        }
    }
}
