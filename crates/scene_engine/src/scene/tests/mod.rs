//! Scene manager integration tests
//!
//! Scenes load against an in-memory asset loader that parks background
//! requests until the test completes them, and the headless render backend.

mod scene_loading;
mod streaming_integration;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::assets::{AssetError, AssetLoader, ImageData, LoadFailure, LoadSuccess};
use crate::core::config::{AssetPaths, SceneConfig};
use crate::render::headless::dds_header;
use crate::render::{HeadlessBackend, MeshDesc};
use crate::scene::SceneManager;

/// Asset loader backed by a map of files
///
/// Synchronous reads answer at once. Background reads wait in a queue until
/// [`MemoryLoader::complete_all`] runs their callbacks.
#[derive(Default)]
pub(crate) struct MemoryLoader {
    files: Mutex<HashMap<String, Vec<u8>>>,
    parked: Mutex<Vec<(String, LoadSuccess, LoadFailure)>>,
    reads: Mutex<HashMap<String, usize>>,
}

impl MemoryLoader {
    pub(crate) fn insert(&self, path: impl Into<String>, data: Vec<u8>) {
        self.files.lock().unwrap().insert(path.into(), data);
    }

    pub(crate) fn parked_paths(&self) -> Vec<String> {
        self.parked.lock().unwrap().iter().map(|(p, _, _)| p.clone()).collect()
    }

    /// Synchronous reads of `path` so far, found or not
    pub(crate) fn sync_reads(&self, path: &str) -> usize {
        self.reads.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Answer every parked request; returns how many succeeded
    pub(crate) fn complete_all(&self) -> usize {
        let parked = std::mem::take(&mut *self.parked.lock().unwrap());
        let mut ok = 0;
        for (path, on_success, on_failure) in parked {
            let data = self.files.lock().unwrap().get(&path).cloned();
            match data {
                Some(data) => {
                    ok += 1;
                    on_success(data);
                }
                None => on_failure(),
            }
        }
        ok
    }
}

impl AssetLoader for MemoryLoader {
    fn read_file_sync(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        *self.reads.lock().unwrap().entry(path.to_string()).or_default() += 1;
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }

    fn load_async(&self, path: &str, on_success: LoadSuccess, on_failure: LoadFailure) {
        self.parked
            .lock()
            .unwrap()
            .push((path.to_string(), on_success, on_failure));
    }
}

pub(crate) fn paths() -> AssetPaths {
    AssetPaths::default()
}

/// Unit cube mesh file
pub(crate) fn cube_mesh(bones: Option<u32>) -> Vec<u8> {
    MeshDesc {
        bbox_min: [-1.0; 3],
        bbox_max: [1.0; 3],
        groups: vec![String::new()],
        bones,
    }
    .to_bytes()
}

/// Unit cube split into `count` triangle groups
pub(crate) fn grouped_cube_mesh(count: usize) -> Vec<u8> {
    MeshDesc {
        bbox_min: [-1.0; 3],
        bbox_max: [1.0; 3],
        groups: vec![String::new(); count],
        bones: None,
    }
    .to_bytes()
}

pub(crate) fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    ImageData::solid_color(width, height, color).to_png().unwrap()
}

pub(crate) fn dds(size: u32) -> Vec<u8> {
    dds_header(size, size)
}

/// Loader with a unit cube at `models/cube`
pub(crate) fn loader_with_cube() -> Arc<MemoryLoader> {
    let loader = Arc::new(MemoryLoader::default());
    loader.insert(paths().model("cube"), cube_mesh(None));
    loader
}

pub(crate) fn manager(config: SceneConfig, loader: &Arc<MemoryLoader>) -> SceneManager {
    crate::foundation::logging::init_for_tests();
    let io: Arc<dyn AssetLoader> = loader.clone();
    SceneManager::new(config, Box::new(HeadlessBackend::new()), io).unwrap()
}
