use super::ImageService;
use crate::models::EncodedImage;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub struct MockImageProcessor {
    prepared_paths: Arc<Mutex<Vec<PathBuf>>>,
    encoded: EncodedImage,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            prepared_paths: Arc::new(Mutex::new(Vec::new())),
            encoded: EncodedImage {
                data: "bW9jay1pbWFnZQ==".to_string(),
                width: 1,
                height: 1,
            },
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_encoded(mut self, encoded: EncodedImage) -> Self {
        self.encoded = encoded;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_prepare_count(&self) -> usize {
        self.prepared_paths.lock().unwrap().len()
    }

    pub fn prepared_paths(&self) -> Vec<PathBuf> {
        self.prepared_paths.lock().unwrap().clone()
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for MockImageProcessor {
    async fn prepare(&self, path: &Path) -> Result<EncodedImage> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::ImageLoad {
                path: path.to_path_buf(),
                detail: "Mock failure".to_string(),
            });
        }

        self.prepared_paths
            .lock()
            .unwrap()
            .push(path.to_path_buf());

        Ok(self.encoded.clone())
    }
}
