use crate::storage::KeyValueStore;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<KeyValueStore>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: KeyValueStore) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
        }
    }
}
