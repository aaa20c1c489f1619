//! Trained-model cache with per-key single-flight training.
//!
//! Hits only take the shared read lock, so they never wait on a training run.
//! A miss takes the key's own mutex, re-checks the map and trains while holding
//! it: concurrent cold requests for one key train once, different keys train in
//! parallel. Failures are returned to the caller that triggered them and are not
//! stored, so the next request retries.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::AppError;

pub struct ModelCache<M> {
    models: RwLock<HashMap<String, Arc<M>>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<M> Default for ModelCache<M> {
    fn default() -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<M> ModelCache<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<M>> {
        self.models.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// Cached model for `key`, training it with `train` on a miss.
    pub fn get_or_train<F>(&self, key: &str, train: F) -> Result<Arc<M>, AppError>
    where
        F: FnOnce() -> Result<M, AppError>,
    {
        if let Some(model) = self.get(key) {
            return Ok(model);
        }

        let key_lock = Arc::clone(self.locks.lock().entry(key.to_string()).or_default());
        let _guard = key_lock.lock();

        // Another caller may have finished training while we waited.
        if let Some(model) = self.get(key) {
            return Ok(model);
        }

        log::info!("Training model for building {key}");
        let model = Arc::new(train()?);
        self.models
            .write()
            .insert(key.to_string(), Arc::clone(&model));
        Ok(model)
    }
}
