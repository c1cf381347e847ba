//! Post-load hooks
//!
//! A hook runs right after a component has been read from its document node.
//! It resolves whatever the component refers to (meshes, atlas space, probe
//! layers) and grows the object's bounding box by what the component covers.
//!
//! Hooks are registered per component slot. [`typed_hook`] adapts a function
//! over a concrete component type to the type-erased form the registry holds.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;

use serde_json::Value as JsonValue;

use crate::assets::ImageData;
use crate::ecs::components::{Decal, Drawable, LightProbe, LightSource, Lightmap, Occluder};
use crate::ecs::{EntityId, SceneComponent};
use crate::foundation::math::AABB;
use crate::scene::error::SceneError;
use crate::scene::resolver::SceneResources;
use crate::scene::scene_data::SceneData;

/// What a hook can reach while an object is being loaded
pub struct PostLoadContext<'a> {
    pub(crate) resources: &'a mut SceneResources,
    pub(crate) data: &'a mut SceneData,
    pub(crate) decal_textures: &'a mut HashMap<String, [f32; 4]>,
    pub(crate) entity: EntityId,
    pub(crate) component: u32,
}

impl<'a> PostLoadContext<'a> {
    /// Entity being built
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Storage index of the component being loaded
    pub fn component_index(&self) -> u32 {
        self.component
    }

    /// Name of the scene being loaded
    pub fn scene_name(&self) -> &str {
        &self.data.name
    }

    /// Resource caches and loaders
    pub fn resources(&mut self) -> &mut SceneResources {
        self.resources
    }

    /// Place a `size` rectangle in the lightmap atlas
    ///
    /// Returns the top-left texel and the atlas dimensions.
    pub fn allocate_lightmap(&mut self, size: [u32; 2]) -> Result<([u32; 2], [u32; 2]), SceneError> {
        let (_, pos) = self
            .data
            .lm_splitter
            .allocate(size)
            .ok_or(SceneError::LightmapAllocation {
                width: size[0],
                height: size[1],
            })?;
        Ok((pos, self.data.lm_splitter.size()))
    }

    /// Normalized decal atlas rectangle of a texture, packing it on first use
    ///
    /// Textures are shared between decals of the same load. A texture that
    /// cannot be read or decoded is logged and maps to an empty rectangle.
    pub fn decal_region(&mut self, texture: &str) -> Result<[f32; 4], SceneError> {
        if let Some(rect) = self.decal_textures.get(texture) {
            return Ok(*rect);
        }

        let path = self.resources.paths().texture(texture);
        let image = match self
            .resources
            .io()
            .read_file_sync(&path)
            .and_then(|bytes| ImageData::from_bytes(&bytes))
        {
            Ok(image) => image,
            Err(e) => {
                log::error!("Error loading decal texture {path}: {e}");
                self.decal_textures.insert(texture.to_string(), [0.0; 4]);
                return Ok([0.0; 4]);
            }
        };

        let atlas = &mut self.data.decals_atlas;
        let region = atlas
            .allocate(&image.data, image.width, image.height)
            .map_err(|source| SceneError::DecalAllocation {
                texture: texture.to_string(),
                source,
            })?;
        let rect = atlas.normalized(&region);
        self.decal_textures.insert(texture.to_string(), rect);
        Ok(rect)
    }

    /// Next free light probe layer
    pub fn allocate_probe(&mut self) -> Result<u32, SceneError> {
        Ok(self.data.probe_storage.allocate()?)
    }
}

/// Callback run after a component is read
pub trait PostLoadHook: Send + Sync {
    /// Finish loading `component`, growing `bbox` by what it covers
    fn post_load(
        &self,
        ctx: &mut PostLoadContext<'_>,
        node: &JsonValue,
        component: &mut dyn Any,
        bbox: &mut AABB,
    ) -> Result<(), SceneError>;
}

/// Registry form of a hook
pub type BoxedHook = Box<dyn PostLoadHook>;

struct TypedHook<T, F> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> PostLoadHook for TypedHook<T, F>
where
    T: SceneComponent,
    F: Fn(&mut PostLoadContext<'_>, &JsonValue, &mut T, &mut AABB) -> Result<(), SceneError> + Send + Sync,
{
    fn post_load(
        &self,
        ctx: &mut PostLoadContext<'_>,
        node: &JsonValue,
        component: &mut dyn Any,
        bbox: &mut AABB,
    ) -> Result<(), SceneError> {
        let component = component
            .downcast_mut::<T>()
            .ok_or_else(|| SceneError::Malformed(format!("{} hook got a different component", T::NAME)))?;
        (self.f)(ctx, node, component, bbox)
    }
}

/// Box a hook written against a concrete component type
pub fn typed_hook<T, F>(f: F) -> BoxedHook
where
    T: SceneComponent,
    F: Fn(&mut PostLoadContext<'_>, &JsonValue, &mut T, &mut AABB) -> Result<(), SceneError> + Send + Sync + 'static,
{
    Box::new(TypedHook {
        f,
        _marker: PhantomData,
    })
}

/// Resolve the mesh, material overrides and animations of a drawable
pub fn post_load_drawable(
    ctx: &mut PostLoadContext<'_>,
    _node: &JsonValue,
    dr: &mut Drawable,
    bbox: &mut AABB,
) -> Result<(), SceneError> {
    let res = ctx.resources();
    let mesh = res.load_mesh(dr.lookup_name(), &dr.mesh_file);

    for (group, name) in dr.material_override.iter().enumerate() {
        let Some(name) = name else { continue };
        let material = res.load_material(name);
        if !res.context_mut().set_group_material(&mesh, group, material) {
            log::warn!("{}: no triangle group {group} for material override {name}", dr.mesh_file);
        }
    }

    if !dr.anims.is_empty() {
        match res.context().meshes().get(&mesh).map(|m| m.skeleton.is_some()) {
            Some(true) => {
                for name in &dr.anims {
                    let anim = res.load_anim(name);
                    res.context_mut().attach_anim(&mesh, anim);
                }
            }
            Some(false) => {
                return Err(SceneError::Malformed(format!(
                    "{} has animations but is not a skeletal mesh",
                    dr.mesh_file
                )));
            }
            None => log::warn!("Skipping animations of unavailable mesh {}", dr.mesh_file),
        }
    }

    if let Some(m) = res.context().meshes().get(&mesh) {
        bbox.expand_to_aabb(&m.bbox);
    }
    dr.mesh = Some(mesh);
    Ok(())
}

/// Resolve an occluder's mesh
pub fn post_load_occluder(
    ctx: &mut PostLoadContext<'_>,
    _node: &JsonValue,
    occ: &mut Occluder,
    bbox: &mut AABB,
) -> Result<(), SceneError> {
    let res = ctx.resources();
    let mesh = res.load_mesh(&occ.mesh_file, &occ.mesh_file);
    if let Some(m) = res.context().meshes().get(&mesh) {
        bbox.expand_to_aabb(&m.bbox);
    }
    occ.mesh = Some(mesh);
    Ok(())
}

/// Place a lightmap in the atlas
pub fn post_load_lightmap(
    ctx: &mut PostLoadContext<'_>,
    _node: &JsonValue,
    lm: &mut Lightmap,
    _bbox: &mut AABB,
) -> Result<(), SceneError> {
    let (pos, atlas) = ctx.allocate_lightmap(lm.size)?;
    lm.place(pos, atlas);
    Ok(())
}

/// Add a light's influence volume
pub fn post_load_light_source(
    _ctx: &mut PostLoadContext<'_>,
    _node: &JsonValue,
    ls: &mut LightSource,
    bbox: &mut AABB,
) -> Result<(), SceneError> {
    bbox.expand_to_aabb(&ls.object_bounds());
    Ok(())
}

/// Pack decal textures and add the projector box
pub fn post_load_decal(
    ctx: &mut PostLoadContext<'_>,
    _node: &JsonValue,
    de: &mut Decal,
    bbox: &mut AABB,
) -> Result<(), SceneError> {
    for (texture, rect) in de.textures_mut() {
        if let Some(texture) = texture {
            *rect = ctx.decal_region(texture)?;
        }
    }
    if let Some(b) = de.object_bounds() {
        bbox.expand_to_aabb(&b);
    }
    Ok(())
}

/// Give a probe its cubemap layer and add its sphere
pub fn post_load_light_probe(
    ctx: &mut PostLoadContext<'_>,
    _node: &JsonValue,
    pr: &mut LightProbe,
    bbox: &mut AABB,
) -> Result<(), SceneError> {
    pr.layer_index = Some(ctx.allocate_probe()?);
    bbox.expand_to_aabb(&pr.object_bounds());
    Ok(())
}
