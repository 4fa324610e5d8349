use crate::config::EngineConfig;
use crate::storage_manager::StorageManager;
use buffer::buffer::BufferPoolManager;
use disk::errors::DiskResult;
use disk::file_disk_manager::FileDiskManager;
use std::sync::Arc;

/// Owner of the singleton-like instances that are needed for the entire
/// lifetime of the engine.
#[derive(Debug)]
pub struct EngineEnvironment {
    pub disk_manager: Arc<FileDiskManager>,
    pub buffer_pool: Arc<BufferPoolManager<FileDiskManager>>,
    pub storage: Arc<StorageManager<FileDiskManager>>,
    pub engine_config: EngineConfig,
}

impl EngineEnvironment {
    pub fn new(config: EngineConfig) -> DiskResult<Self> {
        let data_file = config.storage.data_dir.join("ferrodb.db");
        let disk_manager = Arc::new(FileDiskManager::new(data_file)?);
        let buffer_pool = Arc::new(BufferPoolManager::new(
            config.storage.buffer_pages.get(),
            Arc::clone(&disk_manager),
            config.storage.k_dist.get(),
        ));
        let storage = Arc::new(StorageManager::new(Arc::clone(&buffer_pool)));

        tracing::info!(
            frames = config.storage.buffer_pages.get(),
            k_dist = config.storage.k_dist.get(),
            data_file = %disk_manager.path().display(),
            "storage engine initialized"
        );

        Ok(Self {
            disk_manager,
            buffer_pool,
            storage,
            engine_config: config,
        })
    }
}
