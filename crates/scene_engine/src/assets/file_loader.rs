//! Filesystem loader with a small pool of I/O threads
//!
//! Reads are queued on an unbounded channel and picked up by whichever worker
//! is free. Each worker owns a clone of the receiver, so no lock is held
//! while a file is being read.

use std::fs;
use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::assets::{AssetError, AssetLoader, LoadFailure, LoadSuccess};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// [`AssetLoader`] over the local filesystem
pub struct FileAssetLoader {
    root: PathBuf,
    workers: Vec<Worker>,
    sender: Option<Sender<Job>>,
}

impl FileAssetLoader {
    /// Start `threads` I/O workers (at least one); paths resolve as given
    pub fn new(threads: usize) -> Result<Self, AssetError> {
        Self::with_root("", threads)
    }

    /// Start workers that resolve relative paths against `root`
    pub fn with_root(root: impl Into<PathBuf>, threads: usize) -> Result<Self, AssetError> {
        let (sender, receiver) = unbounded::<Job>();
        let workers = (0..threads.max(1))
            .map(|id| Worker::spawn(id, receiver.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("Started {} asset I/O threads", workers.len());
        Ok(Self {
            root: root.into(),
            workers,
            sender: Some(sender),
        })
    }

    /// Number of worker threads
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl AssetLoader for FileAssetLoader {
    fn read_file_sync(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(full.display().to_string()),
            _ => AssetError::IoError(e),
        })
    }

    fn load_async(&self, path: &str, on_success: LoadSuccess, on_failure: LoadFailure) {
        let full = self.resolve(path);
        let job: Job = Box::new(move || match fs::read(&full) {
            Ok(data) => on_success(data),
            Err(e) => {
                log::warn!("Failed to read {}: {e}", full.display());
                on_failure();
            }
        });

        let Some(sender) = &self.sender else {
            return;
        };
        if let Err(rejected) = sender.send(job) {
            // Workers are gone; run inline so a callback still fires.
            (rejected.into_inner())();
        }
    }
}

impl Drop for FileAssetLoader {
    fn drop(&mut self) {
        // Closing the channel lets workers finish queued reads and exit.
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            if worker.thread.join().is_err() {
                log::error!("Asset I/O thread {} panicked", worker.id);
            }
        }
    }
}

struct Worker {
    id: usize,
    thread: thread::JoinHandle<()>,
}

impl Worker {
    fn spawn(id: usize, receiver: Receiver<Job>) -> Result<Self, AssetError> {
        let thread = thread::Builder::new()
            .name(format!("asset-io-{id}"))
            .spawn(move || {
                for job in receiver.iter() {
                    job();
                }
            })?;
        Ok(Self { id, thread })
    }
}
