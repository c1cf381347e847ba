//! Scene Manager - loads, saves and owns the current scene
//!
//! The manager is the single writer of all scene state: entities, component
//! storages, resource caches and allocators. It must stay on one thread.
//! Background loaders report back through the task queue, which the owner
//! drains with [`SceneManager::process_pending_tasks`] once per frame.
//!
//! Loading walks the document in one pass:
//!
//! 1. clear the previous scene and read the level name
//! 2. request the level's lightmap textures and read the environment
//! 3. for every object node, create each registered component found in it,
//!    run its post-load hook and union the bounds the hooks report into the
//!    object's Transform
//! 4. stream the probe cache, finalize the decal atlas and rebuild the
//!    spatial index
//!
//! Any error along the way clears the scene again before it is returned, so
//! callers never observe a partially loaded level.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::assets::{AssetLoader, ResourceContext, TextureRef};
use crate::core::config::SceneConfig;
use crate::ecs::components::{AnimState, Decal, Drawable, LightProbe, LightSource, Lightmap, Occluder, Transform};
use crate::ecs::{slot, CompStorage, ComponentRegistry, DefaultCompStorage, EntityId, SceneComponent, SceneObject};
use crate::foundation::collections::INVALID_INDEX;
use crate::foundation::math::AABB;
use crate::render::{RenderBackend, TextureFlags, TextureParams};
use crate::scene::error::SceneError;
use crate::scene::post_load::{
    post_load_decal, post_load_drawable, post_load_light_probe, post_load_light_source, post_load_lightmap,
    post_load_occluder, typed_hook, BoxedHook, PostLoadContext,
};
use crate::scene::resolver::SceneResources;
use crate::scene::scene_data::{Environment, SceneData};
use crate::spatial::{LinearIndex, ProbeLevelReader, SpatialIndex};

/// Owner of the loaded scene and everything it references
pub struct SceneManager {
    config: SceneConfig,
    registry: ComponentRegistry<BoxedHook>,
    data: SceneData,
    spatial: Box<dyn SpatialIndex>,
    resources: SceneResources,
}

impl SceneManager {
    /// Create a manager with the built-in components registered
    pub fn new(
        config: SceneConfig,
        backend: Box<dyn RenderBackend>,
        io: Arc<dyn AssetLoader>,
    ) -> Result<Self, SceneError> {
        config.validate()?;

        let mut manager = Self {
            registry: ComponentRegistry::new(),
            data: SceneData::new(&config),
            spatial: Box::new(LinearIndex::new()),
            resources: SceneResources::new(backend, io, config.paths.clone()),
            config,
        };
        manager.register_default_components()?;
        Ok(manager)
    }

    fn register_default_components(&mut self) -> Result<(), SceneError> {
        self.register_component(slot::TRANSFORM, DefaultCompStorage::<Transform>::boxed(), None)?;
        self.register_component(
            slot::DRAWABLE,
            DefaultCompStorage::<Drawable>::boxed(),
            Some(typed_hook::<Drawable, _>(post_load_drawable)),
        )?;
        self.register_component(
            slot::OCCLUDER,
            DefaultCompStorage::<Occluder>::boxed(),
            Some(typed_hook::<Occluder, _>(post_load_occluder)),
        )?;
        self.register_component(
            slot::LIGHTMAP,
            DefaultCompStorage::<Lightmap>::boxed(),
            Some(typed_hook::<Lightmap, _>(post_load_lightmap)),
        )?;
        self.register_component(
            slot::LIGHT_SOURCE,
            DefaultCompStorage::<LightSource>::boxed(),
            Some(typed_hook::<LightSource, _>(post_load_light_source)),
        )?;
        self.register_component(
            slot::DECAL,
            DefaultCompStorage::<Decal>::boxed(),
            Some(typed_hook::<Decal, _>(post_load_decal)),
        )?;
        self.register_component(
            slot::LIGHT_PROBE,
            DefaultCompStorage::<LightProbe>::boxed(),
            Some(typed_hook::<LightProbe, _>(post_load_light_probe)),
        )?;
        self.register_component(slot::ANIM_STATE, DefaultCompStorage::<AnimState>::boxed(), None)?;
        Ok(())
    }

    /// Install a component storage and optional hook in `slot`
    ///
    /// Only possible before the first scene load.
    pub fn register_component(
        &mut self,
        slot: usize,
        storage: Box<dyn CompStorage>,
        hook: Option<BoxedHook>,
    ) -> Result<(), SceneError> {
        Ok(self.registry.register(slot, storage, hook)?)
    }

    /// Active configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Scene state
    pub fn scene_data(&self) -> &SceneData {
        &self.data
    }

    /// Component registry
    pub fn registry(&self) -> &ComponentRegistry<BoxedHook> {
        &self.registry
    }

    /// Resource caches
    pub fn resources(&self) -> &ResourceContext {
        self.resources.context()
    }

    /// Resource caches, loader and streaming queue
    pub fn scene_resources(&mut self) -> &mut SceneResources {
        &mut self.resources
    }

    /// Spatial index over entity world bounds
    pub fn spatial_index(&self) -> &dyn SpatialIndex {
        self.spatial.as_ref()
    }

    /// Number of entities
    pub fn entity_count(&self) -> usize {
        self.data.objects.len()
    }

    /// Entity by index
    pub fn object(&self, entity: EntityId) -> Option<&SceneObject> {
        self.data.object(entity)
    }

    /// Entity by name
    pub fn find_entity(&self, name: &str) -> Option<EntityId> {
        self.data.find(name)
    }

    /// Typed component of an entity
    pub fn component<T: SceneComponent>(&self, entity: EntityId, slot: usize) -> Option<&T> {
        let index = self.data.object(entity)?.component(slot)?;
        self.registry.get::<T>(slot, index)
    }

    /// Mutable typed component of an entity
    pub fn component_mut<T: SceneComponent>(&mut self, entity: EntityId, slot: usize) -> Option<&mut T> {
        let index = self.data.object(entity)?.component(slot)?;
        self.registry.get_mut::<T>(slot, index)
    }

    /// Texture loads issued by this scene that have not completed
    pub fn pending_texture_loads(&self) -> usize {
        self.resources.bridge().textures_in_flight()
    }

    /// Background completions discarded because their scene was cleared
    pub fn dropped_tasks(&self) -> usize {
        self.resources.bridge().dropped_count()
    }

    /// Load a scene from JSON text
    pub fn load_scene_from_str(&mut self, text: &str) -> Result<(), SceneError> {
        let doc: JsonValue = match serde_json::from_str(text) {
            Ok(doc) => doc,
            Err(e) => {
                self.clear_scene();
                return Err(e.into());
            }
        };
        self.load_scene(&doc)
    }

    /// Replace the current scene with the one described by `doc`
    pub fn load_scene(&mut self, doc: &JsonValue) -> Result<(), SceneError> {
        log::info!("SceneManager: Loading scene!");
        self.clear_scene();
        self.registry.seal();

        if let Err(e) = self.load_document(doc) {
            log::error!("Scene load failed: {e}");
            self.clear_scene();
            return Err(e);
        }

        log::info!(
            "SceneManager: Loaded scene '{}' with {} objects",
            self.data.name,
            self.data.objects.len()
        );
        Ok(())
    }

    fn load_document(&mut self, doc: &JsonValue) -> Result<(), SceneError> {
        let root = doc
            .as_object()
            .ok_or_else(|| SceneError::Malformed("scene document is not an object".into()))?;

        self.data.name = match root.get("name") {
            Some(JsonValue::String(name)) => name.clone(),
            Some(_) => return Err(SceneError::Malformed("scene name is not a string".into())),
            None => return Err(SceneError::MissingName),
        };

        self.data.env = match root.get("environment") {
            Some(node) => Environment::from_json(node)?,
            None => Environment::default(),
        };
        self.load_lightmap_textures();
        if !self.data.env.env_map_name.is_empty() {
            let env_map = self.data.env.env_map_name.clone();
            self.data.env.env_map = self.resources.load_env_cube(&env_map);
        }

        let objects = match root.get("objects") {
            Some(JsonValue::Array(objects)) => objects.as_slice(),
            Some(_) => return Err(SceneError::Malformed("objects is not an array".into())),
            None => &[],
        };

        let mut decal_textures = HashMap::new();
        for (index, node) in objects.iter().enumerate() {
            self.load_object(index, node, &mut decal_textures)?;
        }

        self.load_probe_cache();
        self.data.decals_atlas.finalize();

        log::info!("SceneManager: Rebuilding spatial index");
        self.rebuild_spatial_index();
        Ok(())
    }

    fn load_lightmap_textures(&mut self) {
        let base = format!("lightmaps/{}", self.data.name);
        let ext = self.config.paths.texture_ext.clone();

        let direct = self
            .resources
            .load_texture(&format!("{base}_lm_direct{ext}"), TextureFlags::empty());
        self.data.env.lm_direct = Some(direct);
        for (sh_l, slot) in self.data.env.lm_indir_sh.iter_mut().enumerate() {
            *slot = Some(
                self.resources
                    .load_texture(&format!("{base}_lm_sh_{sh_l}{ext}"), TextureFlags::empty()),
            );
        }
    }

    fn load_object(
        &mut self,
        index: usize,
        node: &JsonValue,
        decal_textures: &mut HashMap<String, [f32; 4]>,
    ) -> Result<(), SceneError> {
        let fields = node
            .as_object()
            .ok_or_else(|| SceneError::Malformed(format!("object {index} is not an object")))?;

        let entity = self.data.objects.len() as EntityId;
        let mut obj = SceneObject::new();
        let mut obj_bbox = AABB::empty();

        let Self {
            registry,
            data,
            resources,
            ..
        } = self;

        for (key, comp_node) in fields {
            if !comp_node.is_object() {
                continue;
            }
            let Some(slot) = registry.find_slot(key) else {
                log::trace!("Object {index}: ignoring unknown key '{key}'");
                continue;
            };
            let Some((storage, hook)) = registry.parts_mut(slot) else {
                continue;
            };

            let comp_index = storage.create();
            obj.attach(slot, comp_index);
            storage.read_from_serialized(comp_index, comp_node)?;

            if let Some(hook) = hook {
                let component = storage
                    .get_mut(comp_index)
                    .ok_or_else(|| SceneError::Malformed(format!("{key} vanished after creation")))?;
                let mut ctx = PostLoadContext {
                    resources: &mut *resources,
                    data: &mut *data,
                    decal_textures: &mut *decal_textures,
                    entity,
                    component: comp_index,
                };
                hook.post_load(&mut ctx, comp_node, component, &mut obj_bbox)?;
            }
        }

        let tr_index = obj
            .component(slot::TRANSFORM)
            .ok_or(SceneError::MissingTransform(index))?;
        let tr = registry
            .get_mut::<Transform>(slot::TRANSFORM, tr_index)
            .ok_or(SceneError::MissingTransform(index))?;
        tr.bbox = obj_bbox;
        tr.update_bbox();

        if let Some(JsonValue::String(name)) = fields.get("name") {
            if let Some(previous) = data.name_to_object.insert(name.clone(), entity) {
                log::warn!("Duplicate object name '{name}': entity {entity} replaces {previous}");
            }
            obj.name = Some(name.clone());
        }

        data.objects.push(obj);
        Ok(())
    }

    fn load_probe_cache(&mut self) {
        let Some(storage) = self.registry.storage(slot::LIGHT_PROBE) else {
            return;
        };

        let mut requests = Vec::new();
        let mut id = storage.first();
        while id != INVALID_INDEX {
            let layer = storage
                .get(id)
                .and_then(|c| c.downcast_ref::<LightProbe>())
                .and_then(|p| p.layer_index);
            if let Some(layer) = layer {
                requests.push((id, layer));
            }
            id = storage.next(id);
        }

        let paths = &self.config.paths;
        for (probe, layer) in requests {
            for face in 0..6 {
                let path = paths.texture(&format!(
                    "probes_cache/{}{layer}_{face}{}",
                    self.data.name, paths.texture_ext
                ));
                self.resources
                    .bridge()
                    .request_probe_face(self.resources.io().as_ref(), &path, probe, face);
            }
        }
    }

    fn world_bounds(&self) -> Vec<(EntityId, AABB)> {
        self.data
            .objects
            .iter()
            .enumerate()
            .filter_map(|(i, obj)| {
                let tr = self.registry.get::<Transform>(slot::TRANSFORM, obj.component(slot::TRANSFORM)?)?;
                Some((i as EntityId, tr.bbox_ws))
            })
            .collect()
    }

    /// Rebuild the spatial index from the current Transform bounds
    pub fn rebuild_spatial_index(&mut self) {
        let items = self.world_bounds();
        self.spatial.rebuild(&items);
    }

    /// Serialize the current scene
    ///
    /// Components are written under their registered names in slot order.
    pub fn save_scene(&self) -> Result<JsonValue, SceneError> {
        let mut root = JsonMap::new();
        root.insert("name".into(), JsonValue::String(self.data.name.clone()));
        root.insert("environment".into(), serde_json::to_value(self.data.env.to_desc())?);

        let mut objects = Vec::with_capacity(self.data.objects.len());
        for obj in &self.data.objects {
            let mut node = JsonMap::new();
            if let Some(name) = &obj.name {
                node.insert("name".into(), JsonValue::String(name.clone()));
            }
            for slot in obj.comp_mask.slots() {
                let (Some(storage), Some(index)) = (self.registry.storage(slot), obj.component(slot)) else {
                    continue;
                };
                node.insert(storage.name().to_string(), storage.write_to_serialized(index)?);
            }
            objects.push(JsonValue::Object(node));
        }
        root.insert("objects".into(), JsonValue::Array(objects));

        Ok(JsonValue::Object(root))
    }

    /// Serialize the current scene as pretty-printed JSON
    pub fn save_scene_to_string(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(&self.save_scene()?)?)
    }

    /// Drop the current scene
    ///
    /// Pending background loads of the old scene become no-ops and resources
    /// nothing refers to anymore are released.
    pub fn clear_scene(&mut self) {
        self.data.clear();
        self.registry.clear_storages();
        self.spatial.clear();
        self.resources.bridge_mut().reset();
        self.resources.context_mut().collect_unreferenced();
    }

    /// Detach one component from an entity and free its storage slot
    ///
    /// The Transform cannot be removed.
    pub fn remove_component(&mut self, entity: EntityId, slot: usize) -> Result<bool, SceneError> {
        if slot == slot::TRANSFORM {
            log::warn!("Refusing to remove the Transform of entity {entity}");
            return Ok(false);
        }
        let obj = self
            .data
            .objects
            .get_mut(entity as usize)
            .ok_or(SceneError::InvalidEntity(entity))?;
        let Some(index) = obj.component(slot) else {
            return Ok(false);
        };
        let storage = self
            .registry
            .storage_mut(slot)
            .ok_or(crate::ecs::ComponentError::Unregistered(slot))?;

        storage.delete(index);
        obj.detach(slot);
        Ok(true)
    }

    /// Run every completion queued by background loaders
    ///
    /// Tasks queued while this runs wait for the next call. Returns the
    /// number of tasks executed.
    pub fn process_pending_tasks(&mut self) -> usize {
        let tasks = self.resources.bridge().drain();
        let mut executed = 0;
        for task in tasks {
            if task.is_live() {
                task.run(self);
                executed += 1;
            } else {
                self.resources.bridge().note_dropped();
                log::debug!("Dropping task queued by a cleared scene");
            }
        }
        executed
    }

    pub(crate) fn on_texture_loaded(&mut self, texture: &TextureRef, data: &[u8], params: &TextureParams) {
        let left = self.resources.bridge_mut().finish_texture(texture.name());
        if texture.ref_count() > 1 {
            self.resources
                .context_mut()
                .load_texture_2d(texture.name(), Some(data), params);
        } else {
            log::debug!("Texture {} is no longer used, skipping upload", texture.name());
        }
        log::info!("Texture {} loaded ({left} left)", texture.name());
    }

    pub(crate) fn on_texture_failed(&mut self, name: &str) {
        let left = self.resources.bridge_mut().finish_texture(name);
        log::error!("Error loading {name} ({left} left)");
    }

    pub(crate) fn on_probe_face_loaded(&mut self, probe: u32, face: usize, data: &[u8]) {
        let Some(layer) = self
            .registry
            .get::<LightProbe>(slot::LIGHT_PROBE, probe)
            .and_then(|p| p.layer_index)
        else {
            log::warn!("Probe {probe} is gone, dropping face {face}");
            return;
        };

        let storage = &mut self.data.probe_storage;
        let reader = ProbeLevelReader::new(data, storage.res(), storage.min_res());
        for level in reader {
            let result = level.and_then(|l| storage.set_pixel_data(l.level, layer, face, l.data));
            if let Err(e) = result {
                log::error!("Failed to load probe texture (layer {layer}, face {face}): {e}");
                break;
            }
        }
    }
}
