//! Resource Context - named caches for every GPU resource kind
//!
//! One [`ResourceStorage`] per kind plus the [`RenderBackend`] that turns
//! source bytes into GPU objects. All `load_*` calls share the same contract:
//!
//! - the name is looked up first; a ready entry is returned as `Found`
//! - a missing entry is created empty (`CreatedDefault`) when no data is given
//! - data given for a not-ready entry initializes it (`CreatedFromData`)
//! - a not-ready entry with no data stays `Pending`
//!
//! Initialization errors are logged and leave the entry not ready, so a later
//! call with good data can still succeed.
//!
//! The context is owned by the main thread. Background loaders never touch it
//! directly; their results arrive through the scene's task queue.

use crate::assets::resource::{LoadStatus, ResourceStorage};
use crate::assets::resource_types::{
    AnimSeqRef, AnimSequence, Buffer, BufferRef, Material, MaterialRef, Mesh, MeshRef, Program, ProgramRef,
    Skeleton, Texture, TextureRef, TriGroup,
};
use crate::assets::AssetError;
use crate::render::{RenderBackend, TextureParams};

/// Owner of all resource caches
pub struct ResourceContext {
    backend: Box<dyn RenderBackend>,
    meshes: ResourceStorage<Mesh>,
    materials: ResourceStorage<Material>,
    programs: ResourceStorage<Program>,
    textures: ResourceStorage<Texture>,
    anims: ResourceStorage<AnimSequence>,
    buffers: ResourceStorage<Buffer>,
}

impl ResourceContext {
    /// Create empty caches over a backend
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self {
            backend,
            meshes: ResourceStorage::new("mesh"),
            materials: ResourceStorage::new("material"),
            programs: ResourceStorage::new("program"),
            textures: ResourceStorage::new("texture"),
            anims: ResourceStorage::new("anim"),
            buffers: ResourceStorage::new("buffer"),
        }
    }

    /// Mesh cache
    pub fn meshes(&self) -> &ResourceStorage<Mesh> {
        &self.meshes
    }

    /// Material cache
    pub fn materials(&self) -> &ResourceStorage<Material> {
        &self.materials
    }

    /// Program cache
    pub fn programs(&self) -> &ResourceStorage<Program> {
        &self.programs
    }

    /// Texture cache
    pub fn textures(&self) -> &ResourceStorage<Texture> {
        &self.textures
    }

    /// Animation cache
    pub fn anims(&self) -> &ResourceStorage<AnimSequence> {
        &self.anims
    }

    /// Buffer cache
    pub fn buffers(&self) -> &ResourceStorage<Buffer> {
        &self.buffers
    }

    /// Load a mesh from encoded bytes
    ///
    /// Triangle groups come back with their material names only; resolving
    /// them is up to the caller.
    pub fn load_mesh(&mut self, name: &str, data: Option<&[u8]>) -> (MeshRef, LoadStatus) {
        let backend = &mut self.backend;
        let source = data.map(|bytes| {
            move || -> Result<Mesh, AssetError> {
                let info = backend.create_mesh(name, bytes)?;
                Ok(Mesh {
                    gpu: info.gpu,
                    bbox: info.bbox,
                    groups: info
                        .group_materials
                        .into_iter()
                        .map(|material_name| TriGroup {
                            material_name,
                            material: None,
                        })
                        .collect(),
                    skeleton: info.bone_count.map(|bone_count| Skeleton {
                        bone_count,
                        anims: Vec::new(),
                    }),
                })
            }
        });
        let (mesh, status) = self.meshes.load_with(name, source);
        if status == LoadStatus::CreatedFromData {
            log::info!("Mesh '{name}' loaded");
        }
        (mesh, status)
    }

    /// Install an already resolved material
    pub fn load_material(&mut self, name: &str, material: Option<Material>) -> (MaterialRef, LoadStatus) {
        let source = material.map(|m| move || -> Result<Material, AssetError> { Ok(m) });
        self.materials.load_with(name, source)
    }

    /// Compile a program from vertex and fragment sources
    ///
    /// `sources` is `(vs_name, vs_source, fs_name, fs_source)`.
    pub fn load_program(&mut self, name: &str, sources: Option<(&str, &str, &str, &str)>) -> (ProgramRef, LoadStatus) {
        let backend = &mut self.backend;
        let source = sources.map(|(vs_name, vs, fs_name, fs)| {
            move || -> Result<Program, AssetError> {
                let gpu = backend.compile_program(name, vs, fs)?;
                Ok(Program {
                    gpu,
                    vs_name: vs_name.to_string(),
                    fs_name: fs_name.to_string(),
                })
            }
        });
        let (program, status) = self.programs.load_with(name, source);
        if status == LoadStatus::CreatedFromData {
            log::info!("Program '{name}' compiled");
        }
        (program, status)
    }

    /// Load a 2D texture from an encoded image
    pub fn load_texture_2d(&mut self, name: &str, data: Option<&[u8]>, params: &TextureParams) -> (TextureRef, LoadStatus) {
        let backend = &mut self.backend;
        let source = data.map(|bytes| {
            move || -> Result<Texture, AssetError> {
                let info = backend.create_texture(name, bytes, params)?;
                Ok(Texture {
                    gpu: info.gpu,
                    params: *params,
                    width: info.width,
                    height: info.height,
                    cube: false,
                })
            }
        });
        self.textures.load_with(name, source)
    }

    /// Load a cube texture from six encoded faces
    pub fn load_texture_cube(&mut self, name: &str, faces: Option<[&[u8]; 6]>, params: &TextureParams) -> (TextureRef, LoadStatus) {
        let backend = &mut self.backend;
        let source = faces.map(|faces| {
            move || -> Result<Texture, AssetError> {
                let info = backend.create_texture_cube(name, faces, params)?;
                Ok(Texture {
                    gpu: info.gpu,
                    params: *params,
                    width: info.width,
                    height: info.height,
                    cube: true,
                })
            }
        });
        self.textures.load_with(name, source)
    }

    /// Load an animation sequence
    pub fn load_anim_sequence(&mut self, name: &str, data: Option<&[u8]>) -> (AnimSeqRef, LoadStatus) {
        let backend = &mut self.backend;
        let source = data.map(|bytes| {
            move || -> Result<AnimSequence, AssetError> {
                let info = backend.create_anim_sequence(name, bytes)?;
                Ok(AnimSequence {
                    frame_count: info.frame_count,
                    fps: info.fps,
                })
            }
        });
        self.anims.load_with(name, source)
    }

    /// Create a GPU buffer of `size` bytes
    pub fn create_buffer(&mut self, name: &str, size: u32) -> (BufferRef, LoadStatus) {
        let backend = &mut self.backend;
        let source = Some(move || -> Result<Buffer, AssetError> {
            let gpu = backend.create_buffer(name, size)?;
            Ok(Buffer { gpu, size })
        });
        self.buffers.load_with(name, source)
    }

    /// Attach an animation to a skinned mesh; false if the mesh is not ready
    /// or has no skeleton
    pub fn attach_anim(&mut self, mesh: &MeshRef, anim: AnimSeqRef) -> bool {
        let Some(skeleton) = self.meshes.get_mut(mesh).and_then(|m| m.skeleton.as_mut()) else {
            return false;
        };
        if !skeleton.anims.contains(&anim) {
            skeleton.anims.push(anim);
        }
        true
    }

    /// Set the material of one triangle group; false if out of range
    pub fn set_group_material(&mut self, mesh: &MeshRef, group: usize, material: MaterialRef) -> bool {
        match self.meshes.get_mut(mesh).and_then(|m| m.groups.get_mut(group)) {
            Some(g) => {
                g.material = Some(material);
                true
            }
            None => false,
        }
    }

    /// Entries across all caches still waiting for data
    pub fn num_not_ready(&self) -> usize {
        self.meshes.num_not_ready()
            + self.materials.num_not_ready()
            + self.programs.num_not_ready()
            + self.textures.num_not_ready()
            + self.anims.num_not_ready()
            + self.buffers.num_not_ready()
    }

    /// Drop entries that nothing references anymore
    ///
    /// Meshes go first so the materials and animations they held are
    /// unreferenced by the time their caches are swept; materials go before
    /// the programs and textures they use.
    pub fn collect_unreferenced(&mut self) -> usize {
        let n = self.meshes.collect_unreferenced()
            + self.anims.collect_unreferenced()
            + self.materials.collect_unreferenced()
            + self.programs.collect_unreferenced()
            + self.textures.collect_unreferenced()
            + self.buffers.collect_unreferenced();
        if n > 0 {
            log::debug!("Collected {n} unreferenced resources");
        }
        n
    }

    /// Release meshes, logging any still held
    pub fn release_meshes(&mut self) {
        self.meshes.release();
    }

    /// Release animations, logging any still held
    pub fn release_anims(&mut self) {
        self.anims.release();
    }

    /// Release materials, logging any still held
    pub fn release_materials(&mut self) {
        self.materials.release();
    }

    /// Release programs, logging any still held
    pub fn release_programs(&mut self) {
        self.programs.release();
    }

    /// Release textures, logging any still held
    pub fn release_textures(&mut self) {
        self.textures.release();
    }

    /// Release buffers, logging any still held
    pub fn release_buffers(&mut self) {
        self.buffers.release();
    }

    /// Release every cache in dependency order
    pub fn release_all(&mut self) {
        self.release_meshes();
        self.release_anims();
        self.release_materials();
        self.release_textures();
        self.release_programs();
        self.release_buffers();
    }
}

impl Drop for ResourceContext {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessBackend, MeshDesc, TextureFlags};
    use crate::render::headless::dds_header;

    fn context() -> ResourceContext {
        ResourceContext::new(Box::new(HeadlessBackend::new()))
    }

    fn mesh_bytes(groups: &[&str], bones: Option<u32>) -> Vec<u8> {
        MeshDesc {
            bbox_min: [-1.0; 3],
            bbox_max: [1.0; 3],
            groups: groups.iter().map(|s| s.to_string()).collect(),
            bones,
        }
        .to_bytes()
    }

    #[test]
    fn test_mesh_find_or_create() {
        let mut ctx = context();
        let bytes = mesh_bytes(&["a.txt"], None);

        let (m1, s1) = ctx.load_mesh("box", Some(&bytes));
        assert_eq!(s1, LoadStatus::CreatedFromData);
        let (m2, s2) = ctx.load_mesh("box", None);
        assert_eq!(s2, LoadStatus::Found);
        assert_eq!(m1, m2);

        let mesh = ctx.meshes().get(&m1).unwrap();
        assert_eq!(mesh.groups[0].material_name, "a.txt");
        assert!(mesh.skeleton.is_none());
    }

    #[test]
    fn test_texture_stays_pending_until_data() {
        let mut ctx = context();
        let params = TextureParams::with_flags(TextureFlags::USAGE_SCENE);

        let (t, s) = ctx.load_texture_2d("wall.dds", None, &params);
        assert_eq!(s, LoadStatus::CreatedDefault);
        assert_eq!(ctx.num_not_ready(), 1);

        let (_, s) = ctx.load_texture_2d("wall.dds", Some(b"garbage"), &params);
        assert_eq!(s, LoadStatus::Pending);
        assert!(!ctx.textures().is_ready(&t));

        let (_, s) = ctx.load_texture_2d("wall.dds", Some(&dds_header(64, 64)), &params);
        assert_eq!(s, LoadStatus::CreatedFromData);
        assert_eq!(ctx.textures().get(&t).map(|t| t.width), Some(64));
        assert_eq!(ctx.num_not_ready(), 0);
    }

    #[test]
    fn test_attach_anim_requires_skeleton() {
        let mut ctx = context();
        let (rigid, _) = ctx.load_mesh("rigid", Some(&mesh_bytes(&[], None)));
        let (skinned, _) = ctx.load_mesh("skinned", Some(&mesh_bytes(&[], Some(12))));
        let (anim, _) = ctx.load_anim_sequence("walk.anim", Some(b"(frame_count: 30, fps: 30.0)"));

        assert!(!ctx.attach_anim(&rigid, anim.clone()));
        assert!(ctx.attach_anim(&skinned, anim.clone()));
        assert!(ctx.attach_anim(&skinned, anim));

        let skeleton = ctx.meshes().get(&skinned).unwrap().skeleton.as_ref().unwrap();
        assert_eq!(skeleton.anims.len(), 1);
        assert_eq!(skeleton.bone_count, 12);
    }

    #[test]
    fn test_collect_follows_dependencies() {
        let mut ctx = context();
        let (mesh, _) = ctx.load_mesh("m", Some(&mesh_bytes(&["g"], None)));
        let (mat, _) = ctx.load_material("g", Some(Material::default()));
        assert!(ctx.set_group_material(&mesh, 0, mat));
        assert!(!ctx.set_group_material(&mesh, 3, ctx.materials().find_by_name("g").unwrap()));

        assert_eq!(ctx.collect_unreferenced(), 0);
        drop(mesh);
        assert_eq!(ctx.collect_unreferenced(), 2);
        assert!(ctx.materials().is_empty());
    }

    #[test]
    fn test_buffer_and_program() {
        let mut ctx = context();
        let (buf, s) = ctx.create_buffer("vertices", 1024);
        assert_eq!(s, LoadStatus::CreatedFromData);
        assert_eq!(ctx.buffers().get(&buf).map(|b| b.size), Some(1024));

        let (prog, s) = ctx.load_program("lit", Some(("lit.vs", "void main(){}", "lit.fs", "void main(){}")));
        assert_eq!(s, LoadStatus::CreatedFromData);
        assert_eq!(ctx.programs().get(&prog).unwrap().fs_name, "lit.fs");
    }
}
