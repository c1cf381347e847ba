//! Background-to-main-thread completion queue
//!
//! Asset reads finish on loader threads, but only the thread that owns the
//! [`SceneManager`] may touch scene state. Completion callbacks therefore
//! never mutate anything: they wrap their result in a [`Task`] and push it on
//! a channel that [`SceneManager::process_pending_tasks`] drains once per
//! frame.
//!
//! Every task carries a weak reference to the token of the scene that issued
//! it. Clearing a scene replaces the token, so tasks from an earlier scene
//! fail the check (on the loader thread, and again before running) and are
//! counted as dropped instead of touching the new scene.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::assets::{AssetLoader, TextureRef};
use crate::render::TextureParams;
use crate::scene::SceneManager;

/// Identity of one loaded scene
#[derive(Debug)]
pub struct SceneToken {
    generation: u64,
}

impl SceneToken {
    /// Counts scene clears since the manager was created
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Deferred work for the owning thread
pub struct Task {
    token: Weak<SceneToken>,
    run: Box<dyn FnOnce(&mut SceneManager) + Send + 'static>,
}

impl Task {
    /// False once the issuing scene was cleared
    pub fn is_live(&self) -> bool {
        self.token.strong_count() > 0
    }

    pub(crate) fn run(self, manager: &mut SceneManager) {
        (self.run)(manager);
    }
}

/// Task queue plus per-scene bookkeeping of in-flight texture requests
pub struct StreamingBridge {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
    token: Arc<SceneToken>,
    dropped: Arc<AtomicUsize>,
    textures_in_flight: HashSet<String>,
}

impl Default for StreamingBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingBridge {
    /// Empty queue for generation 0
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            token: Arc::new(SceneToken { generation: 0 }),
            dropped: Arc::new(AtomicUsize::new(0)),
            textures_in_flight: HashSet::new(),
        }
    }

    /// Current scene generation
    pub fn generation(&self) -> u64 {
        self.token.generation
    }

    /// Invalidate everything issued so far
    pub fn reset(&mut self) {
        let generation = self.token.generation + 1;
        self.token = Arc::new(SceneToken { generation });
        if !self.textures_in_flight.is_empty() {
            log::debug!("Abandoning {} texture loads", self.textures_in_flight.len());
        }
        self.textures_in_flight.clear();
    }

    /// Completions discarded because their scene was gone
    pub fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Take every queued task
    pub(crate) fn drain(&self) -> Vec<Task> {
        self.receiver.try_iter().collect()
    }

    pub(crate) fn note_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Texture requests still outstanding for this scene
    pub fn textures_in_flight(&self) -> usize {
        self.textures_in_flight.len()
    }

    /// Whether a request for `name` is outstanding
    pub fn is_texture_in_flight(&self, name: &str) -> bool {
        self.textures_in_flight.contains(name)
    }

    /// Mark a texture request finished; returns how many remain
    pub fn finish_texture(&mut self, name: &str) -> usize {
        self.textures_in_flight.remove(name);
        self.textures_in_flight.len()
    }

    /// Wrap `f` so it can be called from any thread and runs later on the
    /// owning thread, unless the current scene is cleared first
    pub fn deferred<A, F>(&self, f: F) -> impl FnOnce(A) + Send + 'static
    where
        A: Send + 'static,
        F: FnOnce(&mut SceneManager, A) + Send + 'static,
    {
        let token = Arc::downgrade(&self.token);
        let sender = self.sender.clone();
        let dropped = Arc::clone(&self.dropped);

        move |arg: A| {
            if token.strong_count() == 0 {
                dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("Discarding completion for a cleared scene");
                return;
            }
            let task = Task {
                token,
                run: Box::new(move |manager: &mut SceneManager| f(manager, arg)),
            };
            if sender.send(task).is_err() {
                dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Read a texture in the background and install it when it arrives
    ///
    /// The success path holds `texture` until its task runs; the task skips
    /// the upload if that is the last handle outside the cache.
    pub fn request_texture(&mut self, io: &dyn AssetLoader, texture: TextureRef, params: TextureParams) {
        let name = texture.name().to_string();
        self.textures_in_flight.insert(name.clone());

        let on_success = self.deferred(move |manager: &mut SceneManager, data: Vec<u8>| {
            manager.on_texture_loaded(&texture, &data, &params);
        });
        let failed_name = name.clone();
        let on_failure = self.deferred(move |manager: &mut SceneManager, (): ()| {
            manager.on_texture_failed(&failed_name);
        });

        io.load_async(&name, Box::new(on_success), Box::new(move || on_failure(())));
    }

    /// Stream one face of a light probe's cached cubemap
    pub fn request_probe_face(&self, io: &dyn AssetLoader, path: &str, probe: u32, face: usize) {
        let on_success = self.deferred(move |manager: &mut SceneManager, data: Vec<u8>| {
            manager.on_probe_face_loaded(probe, face, &data);
        });
        let failed_path = path.to_string();
        io.load_async(
            path,
            Box::new(on_success),
            Box::new(move || log::error!("Failed to load probe {probe} face {face} ({failed_path})")),
        );
    }
}
